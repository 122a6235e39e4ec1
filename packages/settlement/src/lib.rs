#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Settlement discovery.
//!
//! Finds towns and cities within a radius of a coordinate using the
//! `OpenStreetMap` Overpass API (see [`overpass`]). Population figures
//! are normalized to integers, with missing or unreadable values
//! counted as 0.
//!
//! Discovery never returns an error. When every attempt fails the
//! outcome is [`Discovery::Failed`], which callers treat the same as an
//! empty area.

pub mod overpass;

use fire_threat_settlement_models::Settlement;

/// Default search radius around the query point, in meters.
pub const DEFAULT_RADIUS_M: u32 = 5_000;

/// Outcome of a discovery call.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// The index answered; the list may be empty.
    Found(Vec<Settlement>),
    /// The query failed after exhausting retries or returned an
    /// unusable payload.
    Failed(String),
}

impl Discovery {
    /// Folds the outcome into a list, empty on failure.
    #[must_use]
    pub fn into_settlements(self) -> Vec<Settlement> {
        match self {
            Self::Found(settlements) => settlements,
            Self::Failed(_) => Vec::new(),
        }
    }

    /// Whether the call failed rather than finding nothing.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
