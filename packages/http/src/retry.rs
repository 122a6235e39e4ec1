//! Retry with exponential backoff for external service calls.
//!
//! Services should use [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets the
//! same treatment:
//!
//! - transport failures, non-2xx statuses and undecodable bodies are
//!   retried up to [`RetryPolicy::max_retries`] times, sleeping
//!   [`RetryPolicy::delay_for`] between attempts;
//! - anything [`HttpError::is_transient`] rejects is returned after the
//!   first attempt.
//!
//! ```ignore
//! let body = retry::send_json(&policy, "overpass", || {
//!     client.post(url).body(query.clone())
//! })
//! .await?;
//! ```

use std::future::Future;

use crate::{HttpError, RetryPolicy};

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 200;

/// Runs `operation` until it succeeds, fails terminally, or the retry
/// budget is exhausted.
///
/// `operation` is invoked at most [`RetryPolicy::attempts`] times. The
/// last error is returned once the budget is spent.
///
/// # Errors
///
/// Returns the error of the final attempt.
#[allow(clippy::future_not_send)]
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, HttpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let mut retry = 0;

    loop {
        if retry > 0 {
            let delay = policy.delay_for(retry);
            log::warn!("{label}: retry {retry}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                log::warn!("{label}: transient error: {e}");
                retry += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    log::error!(
                        "{label}: giving up after {} attempts: {e}",
                        policy.attempts()
                    );
                } else {
                    log::error!("{label}: {e}");
                }
                return Err(e);
            }
        }
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`HttpError`] if every attempt fails or the server answers
/// in a way a retry cannot fix.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    policy: &RetryPolicy,
    label: &str,
    build_request: F,
) -> Result<serde_json::Value, HttpError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let build = &build_request;

    with_retry(policy, label, || async move {
        let response = build().send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        decode_body(&text)
    })
    .await
}

/// Decodes a response body, keeping a short preview on failure.
fn decode_body(text: &str) -> Result<serde_json::Value, HttpError> {
    serde_json::from_str(text).map_err(|e| HttpError::Decode {
        message: format!(
            "{e} (received {} bytes, body preview: {})",
            text.len(),
            text.chars().take(BODY_PREVIEW_LEN).collect::<String>()
        ),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn instant_policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let calls = &AtomicU32::new(0);

        let result = with_retry(&instant_policy(), "test", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(HttpError::Status { status: 502 })
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_retry_budget() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&instant_policy(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(HttpError::Status { status: 503 })
        })
        .await;

        assert!(matches!(result, Err(HttpError::Status { status: 503 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_parse_failures() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&instant_policy(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(HttpError::Parse {
                message: "missing County".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(HttpError::Parse { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 0,
            ..instant_policy()
        };

        let result: Result<(), _> = with_retry(&policy, "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(HttpError::Status { status: 500 })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn decode_failure_is_transient() {
        let err = decode_body("{\"elements\": [").unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn decodes_valid_body() {
        let value = decode_body(r#"{"County": {"name": "Kern County"}}"#).unwrap();
        assert_eq!(value["County"]["name"], "Kern County");
    }

    /// Serves one canned response per connection, in order.
    async fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut request = [0_u8; 1024];
                let _ = stream.read(&mut request).await;

                let response = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{addr}/")
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn send_json_retries_failing_status() {
        let url = serve(vec![
            (503, "{}"),
            (503, "{}"),
            (200, r#"{"County": {"name": "Kern County"}}"#),
        ])
        .await;
        let policy = instant_policy();
        let client = local_client();
        let calls = &AtomicU32::new(0);

        let body = send_json(&policy, "fcc", || {
            calls.fetch_add(1, Ordering::SeqCst);
            client.get(&url)
        })
        .await
        .unwrap();

        assert_eq!(body["County"]["name"], "Kern County");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn send_json_gives_up_on_persistent_status() {
        let url = serve(vec![(503, "{}"), (503, "{}"), (503, "{}")]).await;
        let policy = instant_policy();
        let client = local_client();

        let result = send_json(&policy, "fcc", || client.get(&url)).await;

        assert!(matches!(result, Err(HttpError::Status { status: 503 })));
    }
}
