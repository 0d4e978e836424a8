#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic reference unit types.
//!
//! A [`GeoUnit`] is one row of the static tract reference dataset: the
//! unit every address ultimately resolves to. These types are independent
//! of the warehouse row types in `location_insights_insights_models`.

use serde::{Deserialize, Serialize};

/// A census tract reference record from the static centroid dataset.
///
/// Loaded once at startup and treated as immutable for the lifetime of a
/// reference snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoUnit {
    /// Census GEOID (state FIPS + county FIPS + tract code, e.g. "11001000100").
    pub tract_id: String,
    /// Demographic cluster this tract belongs to.
    pub cluster_id: u32,
    /// Human-readable tract name (e.g. "Census Tract 1, District of Columbia").
    pub name: String,
    /// Centroid latitude (WGS84).
    pub centroid_lat: f64,
    /// Centroid longitude (WGS84).
    pub centroid_lon: f64,
    /// ZIP code covering the tract centroid.
    pub zipcode: String,
}

/// The result of resolving a query point to its nearest tract.
///
/// Created per request and discarded after the response; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    /// Query point latitude.
    pub latitude: f64,
    /// Query point longitude.
    pub longitude: f64,
    /// The matched reference unit.
    pub unit: GeoUnit,
    /// Great-circle distance from the query point to the unit centroid,
    /// in meters.
    pub distance_m: f64,
}
