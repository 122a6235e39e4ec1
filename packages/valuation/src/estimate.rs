//! Proportional value estimation and aggregation.
//!
//! A settlement's value is its population share of the region times the
//! region's economic output. The share is not clamped, so a settlement
//! larger than its region's reference population is valued above the
//! region's total output.

use fire_threat_region_models::Region;
use fire_threat_settlement_models::{Settlement, Totals};

/// Estimates the economic value of a settlement of `population` people
/// in `region`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_value(population: u64, region: &Region) -> f64 {
    let ratio = population as f64 / region.reference_population as f64;
    region.economic_output * ratio
}

/// Sets `value_estimate` on every settlement.
pub fn apply_value_estimates(settlements: &mut [Settlement], region: &Region) {
    for settlement in settlements {
        settlement.value_estimate = estimate_value(settlement.population, region);
    }
}

/// Sums population and value over `settlements`.
///
/// No deduplication: a settlement listed twice is counted twice. The
/// population total saturates at `u64::MAX`.
#[must_use]
pub fn aggregate(settlements: &[Settlement]) -> Totals {
    settlements.iter().fold(Totals::default(), |acc, s| Totals {
        population: acc.population.saturating_add(s.population),
        value_estimate: acc.value_estimate + s.value_estimate,
    })
}
