#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Composite fire threat scoring.
//!
//! Combines an externally supplied hazard probability, a feasibility
//! sub-score and the neighbor aggregates from the valuation pipeline into
//! a single scalar (see [`composite`]). The feasibility sub-score itself
//! is derived from the 11 category scores in [`statistics`].

pub mod composite;
pub mod statistics;

pub use composite::{Regime, composite_threat_score, composite_threat_score_for};
pub use statistics::{FireStatistics, StatisticsError, preliminary_feasibility_score};
