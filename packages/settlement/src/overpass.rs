//! Overpass API client.
//!
//! Issues a single Overpass QL query for `place=town|city` nodes around
//! the query point:
//!
//! ```text
//! [out:json];
//! node["place"~"town|city"](around:5000,39.997488,-122.705376);
//! out;
//! ```
//!
//! The query is sent as a `text/plain` POST body.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API>

use fire_threat_http::{HttpError, RetryPolicy, retry};
use fire_threat_settlement_models::Settlement;

use crate::Discovery;

/// Public Overpass interpreter endpoint.
pub const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api/interpreter";

/// Finds settlements within `radius_m` meters of `(lat, lng)`.
///
/// Transient failures are retried per `policy`. A payload without an
/// `elements` array is a terminal failure.
pub async fn discover_settlements(
    client: &reqwest::Client,
    policy: &RetryPolicy,
    base_url: &str,
    lat: f64,
    lng: f64,
    radius_m: u32,
) -> Discovery {
    let query = build_query(lat, lng, radius_m);

    let result = retry::send_json(policy, "settlement discovery", || {
        client
            .post(base_url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query.clone())
    })
    .await
    .and_then(|body| parse_response(&body));

    match result {
        Ok(settlements) => {
            log::debug!(
                "Found {} settlements within {radius_m}m of ({lat}, {lng})",
                settlements.len()
            );
            Discovery::Found(settlements)
        }
        Err(e) => {
            log::warn!("Settlement discovery failed for ({lat}, {lng}): {e}");
            Discovery::Failed(e.to_string())
        }
    }
}

/// Builds the Overpass QL query for towns and cities around a point.
#[must_use]
pub fn build_query(lat: f64, lng: f64, radius_m: u32) -> String {
    format!("[out:json];\nnode[\"place\"~\"town|city\"](around:{radius_m},{lat},{lng});\nout;\n")
}

/// Parses the Overpass JSON response into settlements.
///
/// Elements without coordinates are skipped.
fn parse_response(body: &serde_json::Value) -> Result<Vec<Settlement>, HttpError> {
    let elements = body["elements"]
        .as_array()
        .ok_or_else(|| HttpError::Parse {
            message: "Missing elements array in Overpass response".to_string(),
        })?;

    Ok(elements.iter().filter_map(parse_element).collect())
}

fn parse_element(element: &serde_json::Value) -> Option<Settlement> {
    let (Some(lat), Some(lng)) = (element["lat"].as_f64(), element["lon"].as_f64()) else {
        log::debug!("Skipping Overpass element without coordinates: {element}");
        return None;
    };

    let tags = &element["tags"];
    let name = tags["name"].as_str().map(str::to_string);
    let population = parse_population(&tags["population"]);

    Some(Settlement::new(name, lat, lng, population))
}

/// Normalizes a raw `population` tag to a non-negative integer.
///
/// OSM tags are free text, so thousands separators are tolerated and
/// anything unreadable counts as 0.
#[must_use]
pub fn parse_population(raw: &serde_json::Value) -> u64 {
    match raw {
        serde_json::Value::Null => 0,
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_population))
            .unwrap_or(0),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
                .collect();
            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().and_then(float_population))
                .unwrap_or_else(|| {
                    log::debug!("Unreadable population tag '{s}', using 0");
                    0
                })
        }
        other => {
            log::debug!("Unexpected population tag {other}, using 0");
            0
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_population(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}
