#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Warehouse row types and derived report types.
//!
//! These are the records the attribute pipeline reads from the warehouse
//! (outliers, wide aggregates, affinities, neighbors, forecasts) and the
//! shapes it hands to the presentation layer.

pub mod category;

pub use category::{Category, WinsorizedBucket};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ranked demographic outlier: how atypical a tract's subcategory
/// value is versus the national baseline.
///
/// Invariant: within a (tract, category) pair, `rank == 1` is the most
/// statistically extreme subcategory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierRecord {
    /// Census GEOID of the tract.
    pub tract_id: String,
    /// Demographic category.
    pub category: Category,
    /// Subcategory label (e.g. "GRADUATE", "LANG-Spanish").
    pub subcategory: String,
    /// Outlier rank within the category; 1 = most extreme.
    pub rank: u32,
    /// Continuous outlier score; higher = more extreme.
    pub score: f64,
    /// Human-readable description of the category.
    pub description: String,
    /// Winsorized classification versus the national baseline.
    pub bucket: WinsorizedBucket,
}

/// Wide-format per-tract aggregates: household composition, demographics,
/// and four-season weather climatology. Exactly one row per tract.
///
/// `zipcode` and `cluster_id` are not warehouse columns; they are attached
/// by joining against the static tract reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WideAggregate {
    /// Census GEOID of the tract.
    pub tract_id: String,
    /// ZIP code from the static reference join.
    pub zipcode: Option<String>,
    /// Cluster id from the static reference join.
    pub cluster_id: Option<u32>,
    /// Total population.
    pub population: u32,
    /// Number of households.
    pub households: u32,
    /// Average household size.
    pub avg_household_size: f64,
    /// Fraction of households that are married couples, in `[0, 1]`.
    pub share_married: f64,
    /// Fraction of households with children, in `[0, 1]`.
    pub share_with_children: f64,
    /// Fraction of renter-occupied dwellings, in `[0, 1]`.
    pub share_renters: f64,
    /// Median age of residents.
    pub median_age: f64,
    /// Average winter temperature (Fahrenheit).
    pub avg_temp_winter: f64,
    /// Average spring temperature (Fahrenheit).
    pub avg_temp_spring: f64,
    /// Average summer temperature (Fahrenheit).
    pub avg_temp_summer: f64,
    /// Average fall temperature (Fahrenheit).
    pub avg_temp_fall: f64,
}

/// A ranked association between a tract's population and a named cultural
/// entity. Invariant: `rank` is a dense ranking starting at 1 per tract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityRecord {
    /// Census GEOID of the tract.
    pub tract_id: String,
    /// Named cultural entity (brand, artist, team, ...).
    pub entity: String,
    /// Entity subtype (e.g. "MUSICIAN", "RETAILER").
    pub entity_kind: String,
    /// Local affinity rank; 1 = strongest.
    pub rank: u32,
    /// Affinity strength relative to the national baseline.
    pub boost: f64,
}

/// A precomputed nearest-neighbor candidate for a source tract.
/// Invariant: `rank` is dense within the source tract's cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborRecord {
    /// Census GEOID of the source tract.
    pub tract_id: String,
    /// Census GEOID of the candidate neighbor tract.
    pub neighbor_tract_id: String,
    /// Locality (city/town) name of the neighbor.
    pub locality: String,
    /// Two-letter state abbreviation of the neighbor.
    pub state: String,
    /// Similarity rank; 1 = most similar.
    pub rank: u32,
}

/// One day of short-range weather forecast for a ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRow {
    /// ZIP code the forecast applies to.
    pub zipcode: String,
    /// Forecast date.
    pub date: NaiveDate,
    /// Daily average temperature (Fahrenheit).
    pub avg_temp: f64,
    /// Daily minimum temperature (Fahrenheit).
    pub min_temp: f64,
    /// Daily maximum temperature (Fahrenheit).
    pub max_temp: f64,
    /// Weather description code, joined against the static lookup table.
    pub description_code: String,
}

/// A weather description lookup row from the static reference CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDescription {
    /// Description code as it appears in forecast rows.
    pub code: String,
    /// Display label (e.g. "Partly cloudy").
    pub label: String,
    /// Icon identifier or URL for chart tooltips.
    pub icon: Option<String>,
}

/// A forecast day with its description resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Forecast date.
    pub date: NaiveDate,
    /// Daily average temperature (Fahrenheit).
    pub avg_temp: f64,
    /// Daily minimum temperature (Fahrenheit).
    pub min_temp: f64,
    /// Daily maximum temperature (Fahrenheit).
    pub max_temp: f64,
    /// Display label from the description lookup.
    pub label: String,
    /// Icon identifier, if the lookup provides one.
    pub icon: Option<String>,
}

/// The three related record sets loaded for a resolved tract.
///
/// `outliers` and `affinities` may legitimately be empty; `wide` is a
/// required 1:1 join and its absence fails the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TractAttributes {
    /// Ranked demographic outliers.
    pub outliers: Vec<OutlierRecord>,
    /// Wide-format aggregates with reference columns attached.
    pub wide: WideAggregate,
    /// Cultural affinity rankings.
    pub affinities: Vec<AffinityRecord>,
}

/// One entry of the "most similar locations" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarLocation {
    /// Locality (city/town) name.
    pub locality: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Dense similarity rank starting at 1.
    pub rank: u32,
    /// ZIP code of the neighbor tract, when known.
    pub zipcode: Option<String>,
}

/// Cluster membership partitioned for map highlighting: tracts that
/// appear in the neighbor table versus those that do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPartition {
    /// The cluster being partitioned.
    pub cluster_id: u32,
    /// Cluster members present in the neighbor table.
    pub with_neighbors: Vec<String>,
    /// Cluster members absent from the neighbor table.
    pub without_neighbors: Vec<String>,
}
