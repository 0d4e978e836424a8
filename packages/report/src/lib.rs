#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location report pipeline.
//!
//! Orchestrates one user request end to end: geocode the address,
//! resolve the point to a tract, load the tract's attribute record sets,
//! and derive the summary clauses, similar locations, and upcoming
//! weather the presentation layer renders. The library owns no network
//! listener or CLI; callers invoke [`pipeline::build_report`] per
//! request.
//!
//! Every failure is scoped to one request and mapped onto the
//! [`ReportError`] taxonomy; nothing here is fatal to the process.

pub mod config;
pub mod pipeline;
pub mod snapshot;
pub mod weather;

pub use config::ReportConfig;
pub use pipeline::{ReportContext, RequestToken, RequestTracker, build_report};
pub use snapshot::{ReferenceSnapshot, SnapshotHolder};

use location_insights_geocoder::GeocodeError;
use location_insights_geography::GeographyError;
use location_insights_geography_models::ResolvedLocation;
use location_insights_insights::InsightsError;
use location_insights_insights_models::{
    AffinityRecord, ClusterPartition, ForecastDay, SimilarLocation, TractAttributes,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to the caller of the report pipeline.
///
/// Each variant carries a short diagnostic; [`ReportError::user_message`]
/// produces the user-presentable form.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The address was unresolvable, or no tract lies within the
    /// configured distance threshold.
    #[error("Not found: {message}")]
    NotFound {
        /// What could not be found.
        message: String,
    },

    /// A remote query failed, or a required join produced zero rows.
    #[error("Data unavailable: {message}")]
    DataUnavailable {
        /// Which data was unavailable.
        message: String,
    },

    /// A record failed a parsing rule.
    #[error("Malformed record: {message}")]
    MalformedRecord {
        /// Description of the parsing failure.
        message: String,
    },

    /// A collaborator exceeded its time bound.
    #[error("Timed out during {stage}")]
    Timeout {
        /// The pipeline stage that timed out.
        stage: String,
    },
}

impl ReportError {
    /// A short message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { .. } => {
                "We couldn't find that address. Try adding a city and state.".to_string()
            }
            Self::DataUnavailable { .. } | Self::MalformedRecord { .. } => {
                "Location data is temporarily unavailable. Please try again.".to_string()
            }
            Self::Timeout { .. } => {
                "The request took too long. Please try again.".to_string()
            }
        }
    }
}

impl From<GeocodeError> for ReportError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::Timeout => Self::Timeout {
                stage: "geocode".to_string(),
            },
            other => Self::DataUnavailable {
                message: format!("geocoding failed: {other}"),
            },
        }
    }
}

impl From<location_insights_warehouse::WarehouseError> for ReportError {
    fn from(e: location_insights_warehouse::WarehouseError) -> Self {
        use location_insights_warehouse::WarehouseError;
        match e {
            WarehouseError::Timeout { operation } => Self::Timeout { stage: operation },
            WarehouseError::Conversion { message } => Self::MalformedRecord { message },
            WarehouseError::Database(e) => Self::DataUnavailable {
                message: e.to_string(),
            },
        }
    }
}

impl From<InsightsError> for ReportError {
    fn from(e: InsightsError) -> Self {
        match e {
            InsightsError::Warehouse(inner) => inner.into(),
            InsightsError::DataUnavailable { tract_id } => Self::DataUnavailable {
                message: format!("no attribute data for tract {tract_id}"),
            },
        }
    }
}

impl From<GeographyError> for ReportError {
    fn from(e: GeographyError) -> Self {
        Self::DataUnavailable {
            message: format!("reference data unavailable: {e}"),
        }
    }
}

/// Upcoming weather for the resolved ZIP code, ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingWeather {
    /// ZIP code the forecast applies to.
    pub zipcode: String,
    /// Forecast days in ascending date order, today onward.
    pub days: Vec<ForecastDay>,
}

/// Everything the presentation layer needs to render one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    /// The resolved query point and matched tract.
    pub resolved: ResolvedLocation,
    /// Canonical address string from the geocoder, when the request
    /// started from a free-text address.
    pub formatted_address: Option<String>,
    /// Descriptive clauses about the tract's residents, strongest first.
    pub summary: Vec<String>,
    /// The strongest local cultural affinity, if any.
    pub top_affinity: Option<AffinityRecord>,
    /// The raw attribute record sets for metrics and charts.
    pub attributes: TractAttributes,
    /// Most similar locations within the tract's cluster.
    pub similar_locations: Vec<SimilarLocation>,
    /// Cluster membership partitioned for map highlighting.
    pub cluster: ClusterPartition,
    /// Upcoming weather for the tract's ZIP code.
    pub weather: UpcomingWeather,
}
