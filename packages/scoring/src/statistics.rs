//! Prescribed-fire feasibility statistics.
//!
//! An external classifier rates a burn area on 11 categories, each in
//! `[0, 1]` with higher meaning riskier. The preliminary feasibility
//! score is one minus their mean, so higher means more feasible.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from validating category scores.
#[derive(Debug, Error, PartialEq)]
pub enum StatisticsError {
    /// A category score is outside `[0, 1]` or not finite.
    #[error("Category '{category}' has out-of-range score {value}")]
    OutOfRange {
        /// Category name as serialized.
        category: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// The 11 category scores for one burn area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FireStatistics {
    /// Firefighter and public safety.
    pub safety: f64,
    /// Expected fire behavior.
    pub fire_behavior: f64,
    /// Resistance to containment.
    pub resistance_to_containment: f64,
    /// Ignition procedures and methods.
    pub ignition_procedures_and_methods: f64,
    /// Duration of the prescribed fire.
    pub prescribed_fire_duration: f64,
    /// Smoke management.
    pub smoke_management: f64,
    /// Number and interdependence of activities.
    pub number_and_dependence_of_activities: f64,
    /// Management organizations involved.
    pub management_organizations: f64,
    /// Treatment and resource objectives.
    pub treatment_resource_objectives: f64,
    /// Operational constraints.
    pub constraints: f64,
    /// Project logistics.
    pub project_logistics: f64,
}

impl FireStatistics {
    /// Serialized category names, in declaration order.
    pub const CATEGORIES: [&'static str; 11] = [
        "safety",
        "fire-behavior",
        "resistance-to-containment",
        "ignition-procedures-and-methods",
        "prescribed-fire-duration",
        "smoke-management",
        "number-and-dependence-of-activities",
        "management-organizations",
        "treatment-resource-objectives",
        "constraints",
        "project-logistics",
    ];

    /// Builds statistics from scores in [`Self::CATEGORIES`] order.
    #[must_use]
    pub const fn from_values(values: [f64; 11]) -> Self {
        Self {
            safety: values[0],
            fire_behavior: values[1],
            resistance_to_containment: values[2],
            ignition_procedures_and_methods: values[3],
            prescribed_fire_duration: values[4],
            smoke_management: values[5],
            number_and_dependence_of_activities: values[6],
            management_organizations: values[7],
            treatment_resource_objectives: values[8],
            constraints: values[9],
            project_logistics: values[10],
        }
    }

    /// Scores in [`Self::CATEGORIES`] order.
    #[must_use]
    pub const fn values(&self) -> [f64; 11] {
        [
            self.safety,
            self.fire_behavior,
            self.resistance_to_containment,
            self.ignition_procedures_and_methods,
            self.prescribed_fire_duration,
            self.smoke_management,
            self.number_and_dependence_of_activities,
            self.management_organizations,
            self.treatment_resource_objectives,
            self.constraints,
            self.project_logistics,
        ]
    }

    /// Rounds every score to 3 decimals.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::from_values(self.values().map(round3))
    }

    /// Checks every score is finite and within `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::OutOfRange`] for the first offending
    /// category.
    pub fn validate(&self) -> Result<(), StatisticsError> {
        Self::CATEGORIES
            .iter()
            .zip(self.values())
            .find(|(_, value)| !(0.0..=1.0).contains(value))
            .map_or(Ok(()), |(category, value)| {
                Err(StatisticsError::OutOfRange {
                    category: *category,
                    value,
                })
            })
    }
}

/// One minus the mean category score, each rounded to 3 decimals.
#[must_use]
pub fn preliminary_feasibility_score(statistics: &FireStatistics) -> f64 {
    let values = statistics.rounded().values();
    #[allow(clippy::cast_precision_loss)]
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    1.0 - round3(mean)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
