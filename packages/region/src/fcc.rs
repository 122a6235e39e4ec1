//! FCC Census Block API client.
//!
//! Resolves a coordinate to the county that contains it. No API key
//! required.
//!
//! - `GET /api/census/block/find?latitude=..&longitude=..&format=json`
//!
//! See <https://geo.fcc.gov/api/census/>

use fire_threat_http::{HttpError, RetryPolicy, retry};
use fire_threat_region_models::normalize_region_name;

use crate::NameLookup;

/// Public endpoint of the FCC block lookup.
pub const DEFAULT_BASE_URL: &str = "https://geo.fcc.gov/api/census/block/find";

/// Resolves the county containing `(lat, lng)`.
///
/// Transient failures are retried per `policy`. A payload without a
/// `County` object is a terminal parse failure. The returned name has its
/// administrative suffix stripped (`"Kern County"` becomes `"Kern"`).
pub async fn resolve_region(
    client: &reqwest::Client,
    policy: &RetryPolicy,
    base_url: &str,
    lat: f64,
    lng: f64,
) -> NameLookup {
    let lat_param = lat.to_string();
    let lng_param = lng.to_string();

    let result = retry::send_json(policy, "region resolver", || {
        client.get(base_url).query(&[
            ("latitude", lat_param.as_str()),
            ("longitude", lng_param.as_str()),
            ("format", "json"),
        ])
    })
    .await
    .and_then(|body| parse_county_response(&body));

    match result {
        Ok(Some(raw)) => {
            let name = normalize_region_name(&raw);
            log::debug!("Resolved ({lat}, {lng}) to region '{name}'");
            NameLookup::Found(name)
        }
        Ok(None) => {
            log::info!("No county contains ({lat}, {lng})");
            NameLookup::NotFound
        }
        Err(e) => {
            log::warn!("Region lookup failed for ({lat}, {lng}): {e}");
            NameLookup::Failed(e.to_string())
        }
    }
}

/// Extracts the raw county name from a block lookup response.
///
/// Points offshore or outside the US come back with a `null` county
/// name, which is a miss rather than an error.
fn parse_county_response(body: &serde_json::Value) -> Result<Option<String>, HttpError> {
    let county = body
        .get("County")
        .filter(|c| c.is_object())
        .ok_or_else(|| HttpError::Parse {
            message: "Missing County object".to_string(),
        })?;

    match &county["name"] {
        serde_json::Value::String(name) if !name.trim().is_empty() => Ok(Some(name.clone())),
        serde_json::Value::String(_) | serde_json::Value::Null => Ok(None),
        other => Err(HttpError::Parse {
            message: format!("Unexpected County.name: {other}"),
        }),
    }
}
