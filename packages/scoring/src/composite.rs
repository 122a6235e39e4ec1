//! The composite threat score.
//!
//! Two regimes, selected by whether the neighbor aggregates carry any
//! signal:
//!
//! ```text
//! degenerate: threat * 0.9 + (feasibility + 0.3) * 0.1
//! normal:     threat * 0.7 + (feasibility + 0.3) * 0.1
//!             + ((population / 52_000 + value / 16_650_000_000) / 6) * 0.2
//! ```
//!
//! The result is not clamped; very large aggregates push it above 1.

use fire_threat_settlement_models::Totals;

/// Population that contributes a neighbor term of 1.
pub const POPULATION_SCALE: f64 = 52_000.0;

/// Value estimate that contributes a neighbor term of 1.
pub const VALUE_SCALE: f64 = 16_650_000_000.0;

/// Which formula applies to a set of aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// No neighbor population or value signal.
    Degenerate,
    /// At least one aggregate is non-zero.
    Normal,
}

impl Regime {
    /// Selects the regime for the given aggregates.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn for_aggregates(total_population: u64, total_value_estimate: f64) -> Self {
        if total_population == 0 && total_value_estimate == 0.0 {
            Self::Degenerate
        } else {
            Self::Normal
        }
    }
}

/// Computes the composite threat score.
///
/// `threat_rating` is the hazard probability in `[0, 1]`. The
/// `feasibility_score` is used as given, without clamping.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
pub fn composite_threat_score(
    threat_rating: f64,
    feasibility_score: f64,
    total_population: u64,
    total_value_estimate: f64,
) -> f64 {
    let feasibility_term = (feasibility_score + 0.3) * 0.1;

    match Regime::for_aggregates(total_population, total_value_estimate) {
        Regime::Degenerate => threat_rating * 0.9 + feasibility_term,
        Regime::Normal => {
            let neighbor_term = (total_population as f64 / POPULATION_SCALE
                + total_value_estimate / VALUE_SCALE)
                / 6.0;
            threat_rating * 0.7 + feasibility_term + neighbor_term * 0.2
        }
    }
}

/// [`composite_threat_score`] over aggregated [`Totals`].
#[must_use]
pub fn composite_threat_score_for(
    threat_rating: f64,
    feasibility_score: f64,
    totals: &Totals,
) -> f64 {
    composite_threat_score(
        threat_rating,
        feasibility_score,
        totals.population,
        totals.value_estimate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_example() {
        let score = composite_threat_score(0.5, 0.4, 0, 0.0);
        assert!((score - 0.52).abs() < 1e-12);
    }

    #[test]
    fn normal_example_at_reference_scale() {
        let score = composite_threat_score(0.5, 0.4, 52_000, 16_650_000_000.0);
        assert!((score - (0.35 + 0.07 + 0.2 / 3.0)).abs() < 1e-12);
        assert!((score - 0.4867).abs() < 1e-4);
    }

    #[test]
    fn selects_regime_on_both_aggregates() {
        assert_eq!(Regime::for_aggregates(0, 0.0), Regime::Degenerate);
        assert_eq!(Regime::for_aggregates(1, 0.0), Regime::Normal);
        assert_eq!(Regime::for_aggregates(0, 1.0), Regime::Normal);
    }

    #[test]
    fn population_only_uses_normal_regime() {
        let score = composite_threat_score(0.0, 0.0, 52_000, 0.0);
        assert!((score - (0.03 + 0.2 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn not_clamped_for_large_aggregates() {
        let score = composite_threat_score(1.0, 1.0, 10_330_000, 1_200_000_000_000.0);
        assert!(score > 1.0);
    }

    #[test]
    fn feasibility_is_not_clamped() {
        let low = composite_threat_score(0.5, -1.0, 0, 0.0);
        let high = composite_threat_score(0.5, 2.0, 0, 0.0);
        assert!((low - (0.45 - 0.07)).abs() < 1e-12);
        assert!((high - (0.45 + 0.23)).abs() < 1e-12);
    }

    #[test]
    fn monotonic_in_threat_rating() {
        let a = composite_threat_score(0.2, 0.5, 1_000, 1e8);
        let b = composite_threat_score(0.8, 0.5, 1_000, 1e8);
        assert!(b > a);
    }

    #[test]
    fn scores_totals() {
        let totals = Totals {
            population: 52_000,
            value_estimate: 16_650_000_000.0,
        };
        let score = composite_threat_score_for(0.5, 0.4, &totals);
        assert!((score - composite_threat_score(0.5, 0.4, 52_000, 16_650_000_000.0)).abs() < 1e-15);
    }
}
