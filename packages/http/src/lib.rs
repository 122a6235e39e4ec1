#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared HTTP plumbing for the external services the fire threat
//! pipeline depends on (reverse geocoding, settlement discovery, place
//! names).
//!
//! Every outbound request goes through [`retry::send_json`], which
//! applies a [`RetryPolicy`] to transient failures and gives up
//! immediately on terminal ones. Callers are expected to fold the final
//! [`HttpError`] into their own "not found" / empty outcome rather than
//! propagating it further.

pub mod retry;

use std::time::Duration;

use thiserror::Error;

/// Errors from a single external service call.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Transport-level failure (connection refused, timeout, reset).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {status}")]
    Status {
        /// Status code returned by the server.
        status: u16,
    },

    /// The body could not be decoded as JSON.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The body decoded but lacked a field the caller requires.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the missing or malformed field.
        message: String,
    },

    /// A credential the service requires is not configured.
    #[error("Missing credential: {name}")]
    MissingCredential {
        /// Name of the environment variable that should hold it.
        name: String,
    },
}

impl HttpError {
    /// Returns `true` if repeating the same request might succeed.
    ///
    /// Shape failures and missing credentials will not improve on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Decode { .. }
        )
    }
}

/// How often and how patiently to retry an external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent retry.
    pub base_delay: Duration,
    /// Per-request timeout, independent of the backoff delays.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Total number of attempts this policy allows, saturating at
    /// `u32::MAX`.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff delay before retry number `retry` (1-based).
    ///
    /// With the default policy this is 1s, then 2s.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(1u32.checked_shl(retry - 1).unwrap_or(u32::MAX))
    }
}

/// Builds the shared [`reqwest::Client`] with the policy's request timeout.
///
/// # Errors
///
/// Returns [`HttpError::Transport`] if the TLS backend cannot be
/// initialized.
pub fn build_client(policy: &RetryPolicy) -> Result<reqwest::Client, HttpError> {
    Ok(reqwest::Client::builder()
        .timeout(policy.timeout)
        .user_agent(concat!("fire_threat/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.timeout, Duration::from_secs(10));
    }

    #[test]
    fn attempts_saturate_at_max_budget() {
        let policy = RetryPolicy {
            max_retries: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), u32::MAX);
    }

    #[test]
    fn backoff_doubles_each_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn classifies_transient_errors() {
        assert!(HttpError::Status { status: 503 }.is_transient());
        assert!(
            HttpError::Decode {
                message: "truncated".to_string()
            }
            .is_transient()
        );
        assert!(
            !HttpError::Parse {
                message: "missing County".to_string()
            }
            .is_transient()
        );
        assert!(
            !HttpError::MissingCredential {
                name: "LOCATIONIQ_KEY".to_string()
            }
            .is_transient()
        );
    }
}
