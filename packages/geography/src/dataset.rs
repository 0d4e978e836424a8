//! CSV loading for the static tract centroid dataset.
//!
//! The dataset is a plain CSV file with one row per tract:
//! `tract_id,cluster_id,name,centroid_lat,centroid_lon,zipcode`.
//! Malformed rows are skipped with a warning rather than failing the
//! whole load, matching how boundary ingestion treats bad geometry.

use std::io::Read;
use std::path::Path;

use location_insights_geography_models::GeoUnit;
use serde::Deserialize;

use crate::GeographyError;

/// One raw CSV row of the tract centroid dataset.
#[derive(Debug, Deserialize)]
struct GeoUnitRow {
    tract_id: String,
    cluster_id: u32,
    name: String,
    centroid_lat: f64,
    centroid_lon: f64,
    zipcode: String,
}

/// Loads the tract centroid dataset from a CSV file.
///
/// # Errors
///
/// Returns [`GeographyError`] if the file cannot be read or contains no
/// usable rows.
pub fn load_geo_units(path: &Path) -> Result<Vec<GeoUnit>, GeographyError> {
    let file = std::fs::File::open(path)?;
    let units = load_geo_units_from_reader(file)?;
    log::info!(
        "Loaded {} tract reference units from {}",
        units.len(),
        path.display()
    );
    Ok(units)
}

/// Loads the tract centroid dataset from any reader.
///
/// Rows that fail to deserialize or carry out-of-range coordinates are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`GeographyError`] if reading fails or no usable rows remain.
pub fn load_geo_units_from_reader<R: Read>(reader: R) -> Result<Vec<GeoUnit>, GeographyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut units = Vec::new();

    for result in csv_reader.deserialize::<GeoUnitRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping malformed tract row: {e}");
                continue;
            }
        };

        if row.tract_id.is_empty() {
            log::warn!("Skipping tract row with empty tract_id");
            continue;
        }
        if !(-90.0..=90.0).contains(&row.centroid_lat)
            || !(-180.0..=180.0).contains(&row.centroid_lon)
        {
            log::warn!(
                "Skipping tract {} with out-of-range centroid ({}, {})",
                row.tract_id,
                row.centroid_lat,
                row.centroid_lon
            );
            continue;
        }

        units.push(GeoUnit {
            tract_id: row.tract_id,
            cluster_id: row.cluster_id,
            name: row.name,
            centroid_lat: row.centroid_lat,
            centroid_lon: row.centroid_lon,
            zipcode: row.zipcode,
        });
    }

    if units.is_empty() {
        return Err(GeographyError::EmptyDataset {
            message: "tract centroid dataset contained no usable rows".to_string(),
        });
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
tract_id,cluster_id,name,centroid_lat,centroid_lon,zipcode
11001000100,3,\"Census Tract 1, DC\",38.9097,-77.0654,20007
11001000201,3,\"Census Tract 2.01, DC\",38.9104,-77.0714,20007
17031839100,7,\"Census Tract 8391, IL\",41.8832,-87.6324,60602
";

    #[test]
    fn loads_valid_rows() {
        let units = load_geo_units_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].tract_id, "11001000100");
        assert_eq!(units[0].cluster_id, 3);
        assert_eq!(units[2].zipcode, "60602");
    }

    #[test]
    fn skips_out_of_range_coordinates() {
        let data = "\
tract_id,cluster_id,name,centroid_lat,centroid_lon,zipcode
11001000100,3,Tract 1,38.9097,-77.0654,20007
11001000201,3,Tract 2,138.9104,-77.0714,20007
";
        let units = load_geo_units_from_reader(data.as_bytes()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].tract_id, "11001000100");
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let data = "tract_id,cluster_id,name,centroid_lat,centroid_lon,zipcode\n";
        let result = load_geo_units_from_reader(data.as_bytes());
        assert!(matches!(result, Err(GeographyError::EmptyDataset { .. })));
    }
}
