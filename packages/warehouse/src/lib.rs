#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular warehouse access for tract attribute data.
//!
//! The [`Warehouse`] trait is the seam between the insight pipeline and
//! the remote tabular store: equality-filtered reads keyed by tract id
//! plus a date-filtered forecast read. The DuckDB implementation in
//! [`store`] is the concrete client; [`retry`] adds bounded retry with
//! exponential backoff for transient failures.

pub mod retry;
pub mod store;

pub use store::DuckDbWarehouse;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use location_insights_insights_models::{
    AffinityRecord, ForecastRow, NeighborRecord, OutlierRecord, WideAggregate,
};
use thiserror::Error;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Underlying store query failed.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// A row could not be converted into its record type.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// A query exceeded its time bound.
    #[error("Timed out during {operation}")]
    Timeout {
        /// The operation that exceeded its bound.
        operation: String,
    },
}

impl WarehouseError {
    /// Whether the error is likely transient and worth retrying.
    ///
    /// Query and timeout failures may clear on a retry; conversion
    /// failures are permanent for the same backing data.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout { .. })
    }
}

/// Read interface over the tabular store.
///
/// All methods are pure reads: re-running any of them with unchanged
/// backing data returns identical records in identical order.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Ranked demographic outlier rows for a tract. May be empty.
    async fn outlier_records(&self, tract_id: &str) -> Result<Vec<OutlierRecord>, WarehouseError>;

    /// The wide-format aggregate row for a tract, if present.
    ///
    /// The store holds at most one row per tract; reference columns
    /// (`zipcode`, `cluster_id`) are left unset for the caller to join.
    async fn wide_aggregate(&self, tract_id: &str) -> Result<Option<WideAggregate>, WarehouseError>;

    /// Cultural affinity rows for a tract. May be empty.
    async fn affinity_records(&self, tract_id: &str)
    -> Result<Vec<AffinityRecord>, WarehouseError>;

    /// Precomputed nearest-neighbor rows for a tract. May be empty.
    async fn neighbor_records(&self, tract_id: &str)
    -> Result<Vec<NeighborRecord>, WarehouseError>;

    /// Forecast rows for all ZIP codes with `date >= start`.
    async fn forecast_from(&self, start: NaiveDate) -> Result<Vec<ForecastRow>, WarehouseError>;
}

/// Bounds a warehouse operation with a timeout.
///
/// # Errors
///
/// Returns [`WarehouseError::Timeout`] if `future` does not complete
/// within `limit`, otherwise propagates the operation's own result.
pub async fn bounded<T, F>(
    operation: &str,
    limit: Duration,
    future: F,
) -> Result<T, WarehouseError>
where
    F: Future<Output = Result<T, WarehouseError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Warehouse operation '{operation}' timed out after {limit:?}");
            Err(WarehouseError::Timeout {
                operation: operation.to_string(),
            })
        }
    }
}
