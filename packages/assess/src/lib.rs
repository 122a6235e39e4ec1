#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Burn-area assessments.
//!
//! An assessment ties together everything known about a candidate burn
//! site: the valued settlements around it, a display name, the
//! classifier's feasibility statistics, and the resulting composite
//! threat score. Sites are independent, so a batch is assessed on a
//! bounded pool of concurrent pipelines.

pub mod progress;
pub mod sites;

use std::sync::Arc;

use async_trait::async_trait;
use fire_threat_region::NameLookup;
use fire_threat_region::locationiq;
use fire_threat_region_models::RegionTable;
use fire_threat_scoring::{
    FireStatistics, StatisticsError, composite_threat_score_for, preliminary_feasibility_score,
};
use fire_threat_settlement_models::Settlement;
use fire_threat_valuation::{
    HttpServices, RegionResolver, SettlementSource, ValuationStatus, value_nearby_settlements,
};
use futures::stream::{self, StreamExt as _};
use serde::Serialize;
use thiserror::Error;

use crate::progress::ProgressCallback;
use crate::sites::Site;

/// Name used when no display name could be found.
pub const UNNAMED: &str = "N/A";

/// Errors from loading assessment inputs.
#[derive(Debug, Error)]
pub enum AssessError {
    /// The input file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input document could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A feasibility score is out of range.
    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    /// The hazard probability is outside `[0, 1]`.
    #[error("Threat rating {value} is outside [0, 1]")]
    InvalidThreatRating {
        /// The offending value.
        value: f64,
    },

    /// The coordinate is not a valid WGS84 position.
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Latitude.
        lat: f64,
        /// Longitude.
        lng: f64,
    },
}

/// Produces a display name for a coordinate.
#[async_trait]
pub trait PlaceNamer: Send + Sync {
    /// Looks up a human-readable name for `(lat, lng)`.
    async fn place_name(&self, lat: f64, lng: f64) -> NameLookup;
}

#[async_trait]
impl PlaceNamer for HttpServices {
    async fn place_name(&self, lat: f64, lng: f64) -> NameLookup {
        let place = &self.config().place_lookup;
        let api_key = locationiq::api_key_from_env(&place.key_env);

        locationiq::lookup_place_name(
            self.client(),
            self.policy(),
            &place.base_url,
            &place.key_env,
            api_key.as_deref(),
            lat,
            lng,
        )
        .await
    }
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Everything computed for one candidate burn site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BurnAreaAssessment {
    /// Site position.
    pub coordinates: Coordinates,
    /// Display name, or [`UNNAMED`].
    pub name: String,
    /// Category scores, rounded to 3 decimals.
    pub statistics: FireStatistics,
    /// One minus the mean category score (mean rounded to 3 decimals).
    pub preliminary_feasibility_score: f64,
    /// Hazard probability as supplied.
    pub threat_rating: f64,
    /// Composite threat score.
    pub calculated_threat_rating: f64,
    /// Why the neighbor aggregates are (or are not) populated.
    pub valuation_status: ValuationStatus,
    /// Valued settlements near the site.
    pub nearby_towns: Vec<Settlement>,
    /// Sum of population over `nearby_towns`.
    pub total_population: u64,
    /// Sum of value estimates over `nearby_towns`.
    pub total_value_estimate: f64,
}

/// Runs assessments against a fixed set of services and a region table.
pub struct Assessor<'a> {
    resolver: &'a dyn RegionResolver,
    source: &'a dyn SettlementSource,
    namer: &'a dyn PlaceNamer,
    table: &'a RegionTable,
    radius_m: u32,
}

impl<'a> Assessor<'a> {
    /// Creates an assessor searching `radius_m` meters around each site.
    #[must_use]
    pub const fn new(
        resolver: &'a dyn RegionResolver,
        source: &'a dyn SettlementSource,
        namer: &'a dyn PlaceNamer,
        table: &'a RegionTable,
        radius_m: u32,
    ) -> Self {
        Self {
            resolver,
            source,
            namer,
            table,
            radius_m,
        }
    }

    /// Assesses a single site.
    ///
    /// Valuation and place lookup run concurrently. Failures in either
    /// degrade the result (zero aggregates, [`UNNAMED`]) rather than
    /// failing it.
    pub async fn assess_site(&self, site: &Site) -> BurnAreaAssessment {
        let (valuation, place) = tokio::join!(
            value_nearby_settlements(
                self.resolver,
                self.source,
                self.table,
                site.lat,
                site.lng,
                self.radius_m,
            ),
            self.namer.place_name(site.lat, site.lng)
        );

        let statistics = site.statistics.rounded();
        let feasibility = preliminary_feasibility_score(&statistics);
        let totals = valuation.totals();
        let score = composite_threat_score_for(site.threat_rating, feasibility, &totals);

        log::info!(
            "Assessed ({}, {}): threat={} feasibility={feasibility:.3} score={score:.4} ({:?})",
            site.lat,
            site.lng,
            site.threat_rating,
            valuation.status
        );

        BurnAreaAssessment {
            coordinates: Coordinates {
                lat: site.lat,
                lng: site.lng,
            },
            name: place.into_name().unwrap_or_else(|| UNNAMED.to_string()),
            statistics,
            preliminary_feasibility_score: feasibility,
            threat_rating: site.threat_rating,
            calculated_threat_rating: score,
            valuation_status: valuation.status,
            nearby_towns: valuation.nearby_towns,
            total_population: totals.population,
            total_value_estimate: totals.value_estimate,
        }
    }

    /// Assesses every site with at most `concurrency` pipelines in
    /// flight. Results are returned in input order.
    pub async fn assess_batch(
        &self,
        sites: &[Site],
        concurrency: usize,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Vec<BurnAreaAssessment> {
        let concurrency = concurrency.max(1);
        progress.set_total(sites.len() as u64);
        progress.set_message(format!("Assessing {} sites", sites.len()));

        log::info!(
            "Assessing {} sites (concurrency={concurrency})...",
            sites.len()
        );

        let mut results: Vec<(usize, BurnAreaAssessment)> =
            stream::iter(sites.iter().enumerate().map(|(index, site)| async move {
                let assessment = self.assess_site(site).await;
                progress.inc(1);
                (index, assessment)
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);

        let degraded = results
            .iter()
            .filter(|(_, a)| a.valuation_status != ValuationStatus::Complete)
            .count();
        progress.finish(format!(
            "Assessed {} sites ({degraded} without neighbor signal)",
            results.len()
        ));

        results.into_iter().map(|(_, assessment)| assessment).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use fire_threat_region_models::Region;
    use fire_threat_settlement::Discovery;

    use super::*;

    struct Fixed {
        region: NameLookup,
        discovery: Discovery,
        place: NameLookup,
    }

    #[async_trait]
    impl RegionResolver for Fixed {
        async fn resolve(&self, _lat: f64, _lng: f64) -> NameLookup {
            self.region.clone()
        }
    }

    #[async_trait]
    impl SettlementSource for Fixed {
        async fn discover(&self, lat: f64, lng: f64, _radius_m: u32) -> Discovery {
            match &self.discovery {
                // Echo the query point so batch ordering is observable.
                Discovery::Found(towns) if !towns.is_empty() => {
                    let town = &towns[0];
                    Discovery::Found(vec![Settlement::new(
                        town.name.clone(),
                        lat,
                        lng,
                        town.population,
                    )])
                }
                other => other.clone(),
            }
        }
    }

    #[async_trait]
    impl PlaceNamer for Fixed {
        async fn place_name(&self, _lat: f64, _lng: f64) -> NameLookup {
            self.place.clone()
        }
    }

    #[derive(Default)]
    struct CountingProgress {
        total: AtomicU64,
        done: AtomicU64,
    }

    impl ProgressCallback for CountingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
        fn inc(&self, delta: u64) {
            self.done.fetch_add(delta, Ordering::SeqCst);
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    fn table() -> RegionTable {
        RegionTable::from_regions([Region {
            name: "Tehama".to_string(),
            economic_output: 16_650_000_000.0,
            reference_population: 52_000,
        }])
        .unwrap()
    }

    fn site(lat: f64) -> Site {
        Site {
            lat,
            lng: -122.7,
            threat_rating: 0.5,
            statistics: FireStatistics::from_values([0.6; 11]),
        }
    }

    fn populated() -> Fixed {
        Fixed {
            region: NameLookup::Found("Tehama".to_string()),
            discovery: Discovery::Found(vec![Settlement::new(
                Some("Red Bluff".to_string()),
                0.0,
                0.0,
                52_000,
            )]),
            place: NameLookup::Found("Paskenta, Tehama County, California, USA".to_string()),
        }
    }

    #[tokio::test]
    async fn assesses_populated_site() {
        let services = populated();
        let table = table();
        let assessor = Assessor::new(&services, &services, &services, &table, 5_000);

        let assessment = assessor.assess_site(&site(40.0)).await;

        assert_eq!(assessment.name, "Paskenta, Tehama County, California, USA");
        assert_eq!(assessment.valuation_status, ValuationStatus::Complete);
        assert_eq!(assessment.total_population, 52_000);
        assert!((assessment.total_value_estimate - 16_650_000_000.0).abs() < 1e-3);
        assert!((assessment.preliminary_feasibility_score - 0.4).abs() < 1e-12);
        assert!((assessment.calculated_threat_rating - (0.35 + 0.07 + 0.2 / 3.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn degenerate_site_without_name() {
        let services = Fixed {
            region: NameLookup::Failed("timeout".to_string()),
            discovery: Discovery::Failed("HTTP status 504".to_string()),
            place: NameLookup::Failed("Missing credential: LOCATIONIQ_KEY".to_string()),
        };
        let table = table();
        let assessor = Assessor::new(&services, &services, &services, &table, 5_000);

        let assessment = assessor.assess_site(&site(40.0)).await;

        assert_eq!(assessment.name, UNNAMED);
        assert_eq!(assessment.valuation_status, ValuationStatus::DiscoveryFailed);
        assert!(assessment.nearby_towns.is_empty());
        assert!((assessment.calculated_threat_rating - 0.52).abs() < 1e-12);
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let services = populated();
        let table = table();
        let assessor = Assessor::new(&services, &services, &services, &table, 5_000);
        let sites: Vec<Site> = (0..8).map(|i| site(30.0 + f64::from(i))).collect();
        let counting = Arc::new(CountingProgress::default());
        let progress: Arc<dyn ProgressCallback> = counting.clone();

        let assessments = assessor.assess_batch(&sites, 3, &progress).await;

        assert_eq!(assessments.len(), sites.len());
        for (assessment, site) in assessments.iter().zip(&sites) {
            assert!((assessment.coordinates.lat - site.lat).abs() < f64::EPSILON);
            assert!((assessment.nearby_towns[0].lat - site.lat).abs() < f64::EPSILON);
        }
        assert_eq!(counting.total.load(Ordering::SeqCst), 8);
        assert_eq!(counting.done.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn batch_of_nothing() {
        let services = populated();
        let table = table();
        let assessor = Assessor::new(&services, &services, &services, &table, 5_000);

        let assessments = assessor
            .assess_batch(&[], 0, &progress::null_progress())
            .await;

        assert!(assessments.is_empty());
    }

    #[test]
    fn serializes_kebab_case() {
        let assessment = BurnAreaAssessment {
            coordinates: Coordinates { lat: 1.0, lng: 2.0 },
            name: UNNAMED.to_string(),
            statistics: FireStatistics::from_values([0.5; 11]),
            preliminary_feasibility_score: 0.5,
            threat_rating: 0.1,
            calculated_threat_rating: 0.17,
            valuation_status: ValuationStatus::NoSettlements,
            nearby_towns: Vec::new(),
            total_population: 0,
            total_value_estimate: 0.0,
        };

        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["coordinates"]["lng"], 2.0);
        assert_eq!(json["calculated-threat-rating"], 0.17);
        assert_eq!(json["statistics"]["fire-behavior"], 0.5);
        assert_eq!(json["valuation-status"]["kind"], "no-settlements");
    }
}
