//! DuckDB-backed warehouse client.
//!
//! Holds tract attribute tables (outliers, wide aggregates, affinities,
//! neighbors) and the short-range forecast table. Dates are stored as ISO
//! `YYYY-MM-DD` TEXT so range filters compare lexicographically. Rows
//! that fail to convert are skipped with a warning; they never abort a
//! whole query.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::Connection;
use location_insights_insights_models::{
    AffinityRecord, Category, ForecastRow, NeighborRecord, OutlierRecord, WideAggregate,
    WinsorizedBucket,
};

use crate::{Warehouse, WarehouseError};

/// DuckDB implementation of the [`Warehouse`] trait.
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
}

impl DuckDbWarehouse {
    /// Opens (or creates) the warehouse database and ensures schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the connection or schema creation
    /// fails.
    pub fn open(path: &Path) -> Result<Self, WarehouseError> {
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory warehouse, used by tests and local tooling.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the connection or schema creation
    /// fails.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Executes a raw SQL batch against the store.
    ///
    /// Exists for ingestion tooling; the insight pipeline itself only
    /// reads.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the batch fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), WarehouseError> {
        self.connection().execute_batch(sql)?;
        Ok(())
    }

    /// Locks the connection, recovering from a poisoned mutex.
    fn connection(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn create_schema(conn: &Connection) -> Result<(), WarehouseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tract_outliers (
            tract_id TEXT NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT NOT NULL,
            rank INTEGER NOT NULL,
            score DOUBLE NOT NULL,
            description TEXT,
            bucket TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tract_wide (
            tract_id TEXT PRIMARY KEY,
            population INTEGER,
            households INTEGER,
            avg_household_size DOUBLE,
            share_married DOUBLE,
            share_with_children DOUBLE,
            share_renters DOUBLE,
            median_age DOUBLE,
            avg_temp_winter DOUBLE,
            avg_temp_spring DOUBLE,
            avg_temp_summer DOUBLE,
            avg_temp_fall DOUBLE
        );

        CREATE TABLE IF NOT EXISTS tract_affinities (
            tract_id TEXT NOT NULL,
            entity TEXT NOT NULL,
            entity_kind TEXT,
            rank INTEGER NOT NULL,
            boost DOUBLE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tract_neighbors (
            tract_id TEXT NOT NULL,
            neighbor_tract_id TEXT NOT NULL,
            locality TEXT NOT NULL,
            state TEXT NOT NULL,
            rank INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS short_range_forecast (
            zipcode TEXT NOT NULL,
            date TEXT NOT NULL,
            avg_temp DOUBLE NOT NULL,
            min_temp DOUBLE NOT NULL,
            max_temp DOUBLE NOT NULL,
            wx_description TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn to_u32(value: i64, column: &str) -> Result<u32, WarehouseError> {
    u32::try_from(value).map_err(|_| WarehouseError::Conversion {
        message: format!("{column} value {value} out of range"),
    })
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn outlier_records(&self, tract_id: &str) -> Result<Vec<OutlierRecord>, WarehouseError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT tract_id, category, subcategory, rank, score, description, bucket
             FROM tract_outliers
             WHERE tract_id = ?
             ORDER BY category, rank, subcategory",
        )?;
        let mut rows = stmt.query(duckdb::params![tract_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let tract_id: String = row.get(0)?;
            let category: String = row.get(1)?;
            let subcategory: String = row.get(2)?;
            let rank: i64 = row.get(3)?;
            let score: f64 = row.get(4)?;
            let description: Option<String> = row.get(5)?;
            let bucket_label: String = row.get(6)?;

            let Ok(bucket) = bucket_label.parse::<WinsorizedBucket>() else {
                log::warn!(
                    "Skipping outlier row for tract {tract_id}: unknown bucket '{bucket_label}'"
                );
                continue;
            };

            records.push(OutlierRecord {
                tract_id,
                category: Category::from(category),
                subcategory,
                rank: to_u32(rank, "rank")?,
                score,
                description: description.unwrap_or_default(),
                bucket,
            });
        }

        Ok(records)
    }

    async fn wide_aggregate(
        &self,
        tract_id: &str,
    ) -> Result<Option<WideAggregate>, WarehouseError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT tract_id, population, households, avg_household_size, share_married,
                    share_with_children, share_renters, median_age,
                    avg_temp_winter, avg_temp_spring, avg_temp_summer, avg_temp_fall
             FROM tract_wide
             WHERE tract_id = ?",
        )?;
        let mut rows = stmt.query(duckdb::params![tract_id])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let population: i64 = row.get(1)?;
        let households: i64 = row.get(2)?;

        Ok(Some(WideAggregate {
            tract_id: row.get(0)?,
            zipcode: None,
            cluster_id: None,
            population: to_u32(population, "population")?,
            households: to_u32(households, "households")?,
            avg_household_size: row.get(3)?,
            share_married: row.get(4)?,
            share_with_children: row.get(5)?,
            share_renters: row.get(6)?,
            median_age: row.get(7)?,
            avg_temp_winter: row.get(8)?,
            avg_temp_spring: row.get(9)?,
            avg_temp_summer: row.get(10)?,
            avg_temp_fall: row.get(11)?,
        }))
    }

    async fn affinity_records(
        &self,
        tract_id: &str,
    ) -> Result<Vec<AffinityRecord>, WarehouseError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT tract_id, entity, entity_kind, rank, boost
             FROM tract_affinities
             WHERE tract_id = ?
             ORDER BY rank, entity",
        )?;
        let mut rows = stmt.query(duckdb::params![tract_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let rank: i64 = row.get(3)?;
            records.push(AffinityRecord {
                tract_id: row.get(0)?,
                entity: row.get(1)?,
                entity_kind: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                rank: to_u32(rank, "rank")?,
                boost: row.get(4)?,
            });
        }

        Ok(records)
    }

    async fn neighbor_records(
        &self,
        tract_id: &str,
    ) -> Result<Vec<NeighborRecord>, WarehouseError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT tract_id, neighbor_tract_id, locality, state, rank
             FROM tract_neighbors
             WHERE tract_id = ?
             ORDER BY rank, neighbor_tract_id",
        )?;
        let mut rows = stmt.query(duckdb::params![tract_id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let rank: i64 = row.get(4)?;
            records.push(NeighborRecord {
                tract_id: row.get(0)?,
                neighbor_tract_id: row.get(1)?,
                locality: row.get(2)?,
                state: row.get(3)?,
                rank: to_u32(rank, "rank")?,
            });
        }

        Ok(records)
    }

    async fn forecast_from(&self, start: NaiveDate) -> Result<Vec<ForecastRow>, WarehouseError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT zipcode, date, avg_temp, min_temp, max_temp, wx_description
             FROM short_range_forecast
             WHERE date >= ?
             ORDER BY zipcode, date",
        )?;
        let mut rows = stmt.query(duckdb::params![start.to_string()])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let zipcode: String = row.get(0)?;
            let date_raw: String = row.get(1)?;

            let Ok(date) = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d") else {
                log::warn!("Skipping forecast row for {zipcode}: bad date '{date_raw}'");
                continue;
            };

            records.push(ForecastRow {
                zipcode,
                date,
                avg_temp: row.get(2)?,
                min_temp: row.get(3)?,
                max_temp: row.get(4)?,
                description_code: row.get(5)?,
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DuckDbWarehouse {
        let warehouse = DuckDbWarehouse::open_in_memory().unwrap();
        warehouse
            .execute_batch(
                "INSERT INTO tract_outliers VALUES
                    ('T7', 'EDUCATION', 'GRADUATE', 1, 9.1, 'Educational attainment', 'Extremely High'),
                    ('T7', 'INCOME', 'HIGH', 1, 8.5, 'Household income', 'Very High'),
                    ('T7', 'INCOME', 'MEDIUM', 2, 3.1, 'Household income', 'Average'),
                    ('T9', 'RELIGION', 'CATHOLIC', 1, 5.0, 'Religious identification', 'High');

                 INSERT INTO tract_wide VALUES
                    ('T7', 4100, 1700, 2.4, 0.52, 0.31, 0.44, 36.5, 38.0, 57.0, 79.0, 60.0);

                 INSERT INTO tract_affinities VALUES
                    ('T7', 'Jazz Collective', 'MUSICIAN', 2, 1.8),
                    ('T7', 'Harbor Coffee', 'RETAILER', 1, 2.6);

                 INSERT INTO tract_neighbors VALUES
                    ('T7', 'T8', 'Arlington', 'VA', 1),
                    ('T7', 'T9', 'Bethesda', 'MD', 2);

                 INSERT INTO short_range_forecast VALUES
                    ('20007', '2026-08-05', 81.0, 72.0, 90.0, 'SUNNY'),
                    ('20007', '2026-08-07', 84.0, 75.0, 93.0, 'CLOUDY'),
                    ('60602', '2026-08-07', 76.0, 68.0, 84.0, 'RAIN');",
            )
            .unwrap();
        warehouse
    }

    #[tokio::test]
    async fn outliers_are_keyed_and_ordered() {
        let warehouse = seeded();
        let outliers = warehouse.outlier_records("T7").await.unwrap();
        assert_eq!(outliers.len(), 3);
        assert!(outliers.iter().all(|o| o.tract_id == "T7"));
        assert_eq!(outliers[0].category, Category::Education);
        assert_eq!(outliers[0].bucket, WinsorizedBucket::ExtremelyHigh);
        assert_eq!(outliers[1].subcategory, "HIGH");
        assert_eq!(outliers[1].rank, 1);
    }

    #[tokio::test]
    async fn unknown_bucket_rows_are_skipped() {
        let warehouse = seeded();
        warehouse
            .execute_batch(
                "INSERT INTO tract_outliers VALUES
                    ('T7', 'LANGUAGE', 'LANG-Spanish', 1, 7.0, 'Language', 'Kind Of High');",
            )
            .unwrap();
        let outliers = warehouse.outlier_records("T7").await.unwrap();
        assert!(outliers.iter().all(|o| o.category != Category::Language));
    }

    #[tokio::test]
    async fn wide_aggregate_is_one_row_or_none() {
        let warehouse = seeded();
        let wide = warehouse.wide_aggregate("T7").await.unwrap().unwrap();
        assert_eq!(wide.population, 4100);
        assert!(wide.zipcode.is_none());
        assert!(wide.cluster_id.is_none());
        assert!(warehouse.wide_aggregate("T404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn affinities_order_by_rank() {
        let warehouse = seeded();
        let affinities = warehouse.affinity_records("T7").await.unwrap();
        assert_eq!(affinities.len(), 2);
        assert_eq!(affinities[0].entity, "Harbor Coffee");
        assert_eq!(affinities[0].rank, 1);
    }

    #[tokio::test]
    async fn forecast_filters_by_start_date() {
        let warehouse = seeded();
        let start = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let rows = warehouse.forecast_from(start).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.date >= start));
    }

    #[tokio::test]
    async fn reads_are_idempotent() {
        let warehouse = seeded();
        let first = warehouse.outlier_records("T7").await.unwrap();
        let second = warehouse.outlier_records("T7").await.unwrap();
        assert_eq!(first, second);
        let neighbors_a = warehouse.neighbor_records("T7").await.unwrap();
        let neighbors_b = warehouse.neighbor_records("T7").await.unwrap();
        assert_eq!(neighbors_a, neighbors_b);
    }
}
