//! Attribute loading for a resolved tract.
//!
//! Issues the three keyed warehouse queries concurrently and joins the
//! wide aggregate back to the static reference unit. The wide row is a
//! required 1:1 join; outliers and affinities may legitimately be empty.

use location_insights_geography_models::GeoUnit;
use location_insights_insights_models::TractAttributes;
use location_insights_warehouse::{Warehouse, retry};

use crate::InsightsError;

/// Loads the attribute record sets for a resolved tract.
///
/// The three queries are independent and issued concurrently; each gets
/// bounded retry for transient store failures. `zipcode` and
/// `cluster_id` on the wide aggregate are attached from `unit`.
///
/// # Errors
///
/// Returns [`InsightsError::Warehouse`] if any query fails after
/// retries, or [`InsightsError::DataUnavailable`] if the tract has no
/// wide-aggregate row.
pub async fn load(
    warehouse: &dyn Warehouse,
    unit: &GeoUnit,
    max_retries: u32,
) -> Result<TractAttributes, InsightsError> {
    let tract_id = unit.tract_id.as_str();

    let (outliers, wide, affinities) = futures::try_join!(
        retry::with_retry("tract_outliers", max_retries, || {
            warehouse.outlier_records(tract_id)
        }),
        retry::with_retry("tract_wide", max_retries, || {
            warehouse.wide_aggregate(tract_id)
        }),
        retry::with_retry("tract_affinities", max_retries, || {
            warehouse.affinity_records(tract_id)
        }),
    )?;

    let Some(mut wide) = wide else {
        log::warn!("Tract {tract_id} has no wide-aggregate row");
        return Err(InsightsError::DataUnavailable {
            tract_id: tract_id.to_string(),
        });
    };

    wide.zipcode = Some(unit.zipcode.clone());
    wide.cluster_id = Some(unit.cluster_id);

    log::debug!(
        "Loaded {} outliers and {} affinities for tract {tract_id}",
        outliers.len(),
        affinities.len()
    );

    Ok(TractAttributes {
        outliers,
        wide,
        affinities,
    })
}
