#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static tract reference data and nearest-tract resolution.
//!
//! Loads the tract centroid dataset from CSV at startup, builds an R-tree
//! index over the centroids, and resolves arbitrary points to the nearest
//! tract within a distance threshold. The index is built once per
//! reference snapshot and shared read-only across requests.

pub mod dataset;
pub mod index;

pub use index::TractIndex;

use thiserror::Error;

/// Errors that can occur while loading geographic reference data.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// I/O error reading a reference dataset file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset contained no usable rows.
    #[error("Empty dataset: {message}")]
    EmptyDataset {
        /// Description of what was expected.
        message: String,
    },
}
