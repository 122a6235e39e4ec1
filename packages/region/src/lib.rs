#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding for the fire threat pipeline.
//!
//! Two lookups are provided, both keyed on a WGS84 coordinate:
//!
//! 1. [`fcc::resolve_region`] — the county containing the point, via the
//!    FCC Census Block API. The name is normalized to a
//!    [`RegionTable`](fire_threat_region_models::RegionTable) key.
//! 2. [`locationiq::lookup_place_name`] — a human-readable display name
//!    for labeling assessments. Requires an API key.
//!
//! Neither lookup returns an error. Every failure is logged and folded
//! into [`NameLookup::Failed`] so callers can degrade gracefully while
//! tests can still tell a failure apart from a genuine miss.

pub mod fcc;
pub mod locationiq;

/// Outcome of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    /// The service returned a name.
    Found(String),
    /// The service answered, but the point lies outside any named area.
    NotFound,
    /// The lookup failed (retries exhausted, bad payload, missing
    /// credential).
    Failed(String),
}

impl NameLookup {
    /// Folds the outcome into an optional name.
    #[must_use]
    pub fn into_name(self) -> Option<String> {
        match self {
            Self::Found(name) => Some(name),
            Self::NotFound | Self::Failed(_) => None,
        }
    }

    /// Whether the lookup failed rather than finding nothing.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
