//! Pelias geocoder client for self-hosted instances.
//!
//! Pelias exposes `/v1/search` for free-form geocoding and
//! `/v1/autocomplete` for prefix suggestions; both return `GeoJSON`
//! `FeatureCollection` responses. Since the instance is self-hosted
//! there are no external rate limits.
//!
//! See <https://github.com/pelias/documentation/blob/master/search.md>

use crate::{GeocodeError, GeocodedAddress};

/// Number of autocomplete suggestions to request.
const AUTOCOMPLETE_SIZE: &str = "8";

/// Geocodes a single free-form address query against a Pelias instance.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    country_code: &str,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let url = format!("{base_url}/v1/search");

    let resp = client
        .get(&url)
        .query(&[
            ("text", query),
            ("boundary.country", country_code),
            ("size", "1"),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    if !resp.status().is_success() {
        return Err(GeocodeError::Parse {
            message: format!("Pelias returned status {}", resp.status()),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_search_response(&body)
}

/// Suggests completions for a typed address prefix.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn autocomplete(
    client: &reqwest::Client,
    base_url: &str,
    country_code: &str,
    prefix: &str,
) -> Result<Vec<String>, GeocodeError> {
    let url = format!("{base_url}/v1/autocomplete");

    let resp = client
        .get(&url)
        .query(&[
            ("text", prefix),
            ("boundary.country", country_code),
            ("size", AUTOCOMPLETE_SIZE),
        ])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.json().await?;
    parse_autocomplete_response(&body)
}

/// Parses a Pelias `GeoJSON` `FeatureCollection` search response.
fn parse_search_response(
    body: &serde_json::Value,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Pelias response missing 'features' array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let coords = first
        .pointer("/geometry/coordinates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Feature missing geometry.coordinates".to_string(),
        })?;

    if coords.len() < 2 {
        return Err(GeocodeError::Parse {
            message: "coordinates array has fewer than 2 elements".to_string(),
        });
    }

    let lng = coords[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = coords[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    let label = first
        .pointer("/properties/label")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    let zipcode = first
        .pointer("/properties/postalcode")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lng,
        formatted_address: label,
        zipcode,
    }))
}

/// Parses a Pelias autocomplete response into suggestion labels.
fn parse_autocomplete_response(body: &serde_json::Value) -> Result<Vec<String>, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Pelias response missing 'features' array".to_string(),
        })?;

    Ok(features
        .iter()
        .filter_map(|feature| {
            feature
                .pointer("/properties/label")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
        .collect())
}
