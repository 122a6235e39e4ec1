#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Settlement and aggregate types.
//!
//! A [`Settlement`] is a named populated place discovered near a query
//! point. It is created per discovery call, enriched in place with a
//! value estimate, and summed into [`Totals`].

use serde::{Deserialize, Serialize};

/// A populated place near a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settlement {
    /// Place name, if the source provides one.
    pub name: Option<String>,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Resident population; 0 when the source has no figure.
    pub population: u64,
    /// Share of the region's economic output; 0 until valued.
    pub value_estimate: f64,
}

impl Settlement {
    /// Creates an unvalued settlement.
    #[must_use]
    pub const fn new(name: Option<String>, lat: f64, lng: f64, population: u64) -> Self {
        Self {
            name,
            lat,
            lng,
            population,
            value_estimate: 0.0,
        }
    }
}

/// Sums over a list of valued settlements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Totals {
    /// Total population.
    pub population: u64,
    /// Total value estimate.
    pub value_estimate: f64,
}

impl Totals {
    /// Whether neither aggregate carries any signal.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero(&self) -> bool {
        self.population == 0 && self.value_estimate == 0.0
    }
}
