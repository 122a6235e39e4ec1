//! The "value nearby settlements" pipeline.
//!
//! Region resolution and settlement discovery run concurrently; once both
//! are in, each settlement is valued against the resolved region and the
//! results are summed. Every failure degrades to an empty settlement list
//! with zero totals, labeled by [`ValuationStatus`].

use async_trait::async_trait;
use fire_threat_http::{HttpError, RetryPolicy};
use fire_threat_region::NameLookup;
use fire_threat_region_models::RegionTable;
use fire_threat_settlement::Discovery;
use fire_threat_settlement_models::{Settlement, Totals};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::estimate::{aggregate, apply_value_estimates};

/// Resolves a coordinate to a canonical region name.
#[async_trait]
pub trait RegionResolver: Send + Sync {
    /// Looks up the region containing `(lat, lng)`.
    async fn resolve(&self, lat: f64, lng: f64) -> NameLookup;
}

/// Finds named settlements near a coordinate.
#[async_trait]
pub trait SettlementSource: Send + Sync {
    /// Lists settlements within `radius_m` meters of `(lat, lng)`.
    async fn discover(&self, lat: f64, lng: f64, radius_m: u32) -> Discovery;
}

/// Why a valuation carries (or lacks) settlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValuationStatus {
    /// Settlements were found and valued.
    Complete,
    /// Discovery succeeded but found nothing nearby.
    NoSettlements,
    /// Discovery failed after exhausting retries.
    DiscoveryFailed,
    /// The point is not inside any region.
    RegionNotFound,
    /// Region lookup failed after exhausting retries.
    RegionLookupFailed,
    /// The resolved region is absent from the reference table.
    UnknownRegion {
        /// Normalized name returned by the resolver.
        name: String,
    },
}

/// Result of valuing the settlements around one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Valuation {
    /// Outcome label.
    pub status: ValuationStatus,
    /// Region used for apportionment, when one was resolved.
    pub region: Option<String>,
    /// Valued settlements; empty unless `status` is `Complete`.
    pub nearby_towns: Vec<Settlement>,
    /// Sum of population over `nearby_towns`.
    pub total_population: u64,
    /// Sum of value estimates over `nearby_towns`.
    pub total_value_estimate: f64,
}

impl Valuation {
    fn empty(status: ValuationStatus, region: Option<String>) -> Self {
        Self {
            status,
            region,
            nearby_towns: Vec::new(),
            total_population: 0,
            total_value_estimate: 0.0,
        }
    }

    /// The aggregate totals.
    #[must_use]
    pub const fn totals(&self) -> Totals {
        Totals {
            population: self.total_population,
            value_estimate: self.total_value_estimate,
        }
    }

    /// Whether the valuation came back empty because a dependency failed
    /// or the region table lacks the resolved region.
    ///
    /// Sparse areas and coordinates outside every region are genuine
    /// misses, not degradation.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(
            self.status,
            ValuationStatus::DiscoveryFailed
                | ValuationStatus::RegionLookupFailed
                | ValuationStatus::UnknownRegion { .. }
        )
    }
}

/// Values every settlement within `radius_m` meters of `(lat, lng)`.
///
/// Never fails: dependency failures, unknown regions and empty areas all
/// produce an empty list with zero totals.
pub async fn value_nearby_settlements<R, S>(
    resolver: &R,
    source: &S,
    table: &RegionTable,
    lat: f64,
    lng: f64,
    radius_m: u32,
) -> Valuation
where
    R: RegionResolver + ?Sized,
    S: SettlementSource + ?Sized,
{
    let (region_lookup, discovery) = tokio::join!(
        resolver.resolve(lat, lng),
        source.discover(lat, lng, radius_m)
    );

    let mut settlements = match discovery {
        Discovery::Found(settlements) if settlements.is_empty() => {
            log::info!("No settlements within {radius_m}m of ({lat}, {lng})");
            return Valuation::empty(ValuationStatus::NoSettlements, region_lookup.into_name());
        }
        Discovery::Found(settlements) => settlements,
        Discovery::Failed(reason) => {
            log::error!("Valuing ({lat}, {lng}) with no settlements: discovery failed: {reason}");
            return Valuation::empty(ValuationStatus::DiscoveryFailed, region_lookup.into_name());
        }
    };

    let region_name = match region_lookup {
        NameLookup::Found(name) => name,
        NameLookup::NotFound => {
            log::warn!("({lat}, {lng}) is outside every region; skipping valuation");
            return Valuation::empty(ValuationStatus::RegionNotFound, None);
        }
        NameLookup::Failed(reason) => {
            log::error!("Valuing ({lat}, {lng}) with no settlements: region lookup failed: {reason}");
            return Valuation::empty(ValuationStatus::RegionLookupFailed, None);
        }
    };

    let Some(region) = table.get(&region_name) else {
        log::error!("Region '{region_name}' is not in the reference table");
        return Valuation::empty(
            ValuationStatus::UnknownRegion {
                name: region_name.clone(),
            },
            Some(region_name),
        );
    };

    apply_value_estimates(&mut settlements, region);
    let totals = aggregate(&settlements);

    log::debug!(
        "Valued {} settlements in {region_name}: population={}, value={:.0}",
        settlements.len(),
        totals.population,
        totals.value_estimate
    );

    Valuation {
        status: ValuationStatus::Complete,
        region: Some(region_name),
        nearby_towns: settlements,
        total_population: totals.population,
        total_value_estimate: totals.value_estimate,
    }
}

/// The production [`RegionResolver`] and [`SettlementSource`], backed by
/// the FCC block API and Overpass.
#[derive(Debug, Clone)]
pub struct HttpServices {
    client: reqwest::Client,
    policy: RetryPolicy,
    config: ServiceConfig,
}

impl HttpServices {
    /// Builds the shared HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the client cannot be constructed.
    pub fn new(config: ServiceConfig) -> Result<Self, HttpError> {
        let policy = config.retry_policy();
        let client = fire_threat_http::build_client(&policy)?;
        Ok(Self {
            client,
            policy,
            config,
        })
    }

    /// The shared HTTP client.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The retry policy applied to every call.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The configuration the services were built from.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[async_trait]
impl RegionResolver for HttpServices {
    async fn resolve(&self, lat: f64, lng: f64) -> NameLookup {
        fire_threat_region::fcc::resolve_region(
            &self.client,
            &self.policy,
            &self.config.region_resolver.base_url,
            lat,
            lng,
        )
        .await
    }
}

#[async_trait]
impl SettlementSource for HttpServices {
    async fn discover(&self, lat: f64, lng: f64, radius_m: u32) -> Discovery {
        fire_threat_settlement::overpass::discover_settlements(
            &self.client,
            &self.policy,
            &self.config.settlement_discovery.base_url,
            lat,
            lng,
            radius_m,
        )
        .await
    }
}
