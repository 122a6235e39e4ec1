#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population-proportional valuation of settlements near a coordinate.
//!
//! For a query point the pipeline:
//!
//! 1. resolves the containing region and discovers nearby settlements
//!    (concurrently),
//! 2. apportions the region's economic output to each settlement by its
//!    share of the region's population,
//! 3. sums population and value across settlements.
//!
//! The entry point is [`pipeline::value_nearby_settlements`]. The
//! [`RegionResolver`] and [`SettlementSource`] traits are the seams to
//! the network; [`HttpServices`] implements both against the services in
//! [`config::ServiceConfig`].

pub mod config;
pub mod estimate;
pub mod pipeline;

pub use config::{ConfigError, ServiceConfig};
pub use estimate::{aggregate, apply_value_estimates, estimate_value};
pub use pipeline::{
    HttpServices, RegionResolver, SettlementSource, Valuation, ValuationStatus,
    value_nearby_settlements,
};
