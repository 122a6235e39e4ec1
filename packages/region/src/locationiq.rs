//! `LocationIQ` reverse geocoder client.
//!
//! Produces a display name (e.g. "Paskenta, Tehama County, California,
//! USA") used to label burn-area assessments. The service requires an
//! API key, read from the environment variable named in the service
//! configuration ([`DEFAULT_KEY_ENV`] by default).
//!
//! See <https://docs.locationiq.com/reference/reverse-api>

use fire_threat_http::{HttpError, RetryPolicy, retry};

use crate::NameLookup;

/// Public endpoint of the `LocationIQ` reverse API.
pub const DEFAULT_BASE_URL: &str = "https://us1.locationiq.com/v1/reverse.php";

/// Environment variable holding the API key.
pub const DEFAULT_KEY_ENV: &str = "LOCATIONIQ_KEY";

/// Reads the API key from `var`.
///
/// Returns `Some` only when the variable is set and non-empty.
#[must_use]
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|key| !key.trim().is_empty())
}

/// Looks up the display name for `(lat, lng)`.
///
/// A missing `api_key` is logged and reported as
/// [`NameLookup::Failed`] without touching the network.
pub async fn lookup_place_name(
    client: &reqwest::Client,
    policy: &RetryPolicy,
    base_url: &str,
    key_env: &str,
    api_key: Option<&str>,
    lat: f64,
    lng: f64,
) -> NameLookup {
    let Some(key) = api_key else {
        let err = HttpError::MissingCredential {
            name: key_env.to_string(),
        };
        log::error!("Place lookup skipped: {err}");
        return NameLookup::Failed(err.to_string());
    };

    let lat_param = lat.to_string();
    let lng_param = lng.to_string();

    let result = retry::send_json(policy, "place lookup", || {
        client.get(base_url).query(&[
            ("key", key),
            ("lat", lat_param.as_str()),
            ("lon", lng_param.as_str()),
            ("format", "json"),
        ])
    })
    .await
    .and_then(|body| parse_display_name(&body));

    match result {
        Ok(name) => NameLookup::Found(name),
        Err(e) => {
            log::warn!("Place lookup failed for ({lat}, {lng}): {e}");
            NameLookup::Failed(e.to_string())
        }
    }
}

/// Extracts `display_name` from a reverse lookup response.
fn parse_display_name(body: &serde_json::Value) -> Result<String, HttpError> {
    body["display_name"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| HttpError::Parse {
            message: "Missing display_name in LocationIQ response".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_name() {
        let body = serde_json::json!({
            "place_id": "123",
            "lat": "39.997488",
            "lon": "-122.705376",
            "display_name": "Paskenta, Tehama County, California, USA"
        });
        assert_eq!(
            parse_display_name(&body).unwrap(),
            "Paskenta, Tehama County, California, USA"
        );
    }

    #[test]
    fn missing_display_name_is_a_parse_failure() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_display_name(&body),
            Err(HttpError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let policy = RetryPolicy::default();
        let client = fire_threat_http::build_client(&policy).unwrap();

        let lookup = lookup_place_name(
            &client,
            &policy,
            DEFAULT_BASE_URL,
            DEFAULT_KEY_ENV,
            None,
            39.997_488,
            -122.705_376,
        )
        .await;

        assert_eq!(
            lookup,
            NameLookup::Failed("Missing credential: LOCATIONIQ_KEY".to_string())
        );
    }
}
