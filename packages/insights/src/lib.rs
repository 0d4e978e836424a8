#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tract attribute loading and derived insight computation.
//!
//! Three pure stages over a resolved tract: [`loader`] fetches the
//! attribute record sets from the warehouse and joins them to the static
//! reference unit, [`summary`] turns ranked outliers into descriptive
//! clauses, and [`similar`] ranks the most similar locations within the
//! tract's cluster. None of the stages hold cross-call state.

pub mod loader;
pub mod similar;
pub mod summary;

use location_insights_warehouse::WarehouseError;
use thiserror::Error;

/// Errors that can occur while computing insights.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// A warehouse query failed after retries.
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    /// The required wide-aggregate join produced zero rows.
    #[error("No attribute data available for tract {tract_id}")]
    DataUnavailable {
        /// The tract that had no wide-aggregate row.
        tract_id: String,
    },
}
