#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding and autocomplete.
//!
//! Converts free-text street addresses to coordinates using a
//! multi-provider strategy configured via TOML files in `services/`:
//!
//! 1. **Pelias** (priority 1) — self-hosted, no rate limit, also serves
//!    address autocomplete via `/v1/autocomplete`.
//! 2. **Nominatim / OpenStreetMap** (priority 2) — free fallback, 1
//!    req/sec rate limit, search only.
//!
//! Providers are loaded from the [`service_registry`] and tried in
//! priority order; the first provider that returns a match wins. A
//! provider error is logged and the next provider is tried, so a single
//! flaky provider does not fail the request — but if every provider
//! errors, the last error is surfaced typed rather than swallowed.

pub mod nominatim;
pub mod pelias;
pub mod service_registry;

use service_registry::{GeocodingService, ProviderConfig};
use thiserror::Error;

/// A geocoding result with coordinates and address metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the provider.
    pub formatted_address: Option<String>,
    /// Postal code of the match, when the provider supplies one.
    pub zipcode: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The provider did not answer within the request timeout.
    #[error("Geocoding request timed out")]
    Timeout,
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

/// Geocodes a free-text address, trying enabled providers in priority
/// order. `country` is an ISO 3166-1 alpha-2 code used as a boundary
/// filter.
///
/// Returns `Ok(None)` when no provider finds a match — the caller
/// decides whether that is a not-found condition.
///
/// # Errors
///
/// Returns the last provider's [`GeocodeError`] if every provider fails.
pub async fn geocode(
    client: &reqwest::Client,
    services: &[GeocodingService],
    address: &str,
    country: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let mut last_error: Option<GeocodeError> = None;

    for service in services.iter().filter(|s| s.enabled) {
        let result = match &service.provider {
            ProviderConfig::Pelias { base_url } => {
                pelias::geocode_freeform(client, base_url, country, address).await
            }
            ProviderConfig::Nominatim { base_url, .. } => {
                nominatim::geocode_freeform(client, base_url, country, address).await
            }
        };

        match result {
            Ok(Some(matched)) => {
                log::debug!("Provider '{}' matched '{address}'", service.id);
                return Ok(Some(matched));
            }
            Ok(None) => {
                log::debug!("Provider '{}' had no match for '{address}'", service.id);
            }
            Err(e) => {
                log::warn!("Provider '{}' failed for '{address}': {e}", service.id);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Suggests address completions for a typed prefix.
///
/// Uses the first enabled provider that supports autocomplete (Pelias);
/// returns an empty list if none does.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the autocomplete request fails.
pub async fn autocomplete(
    client: &reqwest::Client,
    services: &[GeocodingService],
    prefix: &str,
    country: &str,
) -> Result<Vec<String>, GeocodeError> {
    for service in services.iter().filter(|s| s.enabled) {
        if let ProviderConfig::Pelias { base_url } = &service.provider {
            return pelias::autocomplete(client, base_url, country, prefix).await;
        }
    }
    Ok(Vec::new())
}
