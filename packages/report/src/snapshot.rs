//! Process-wide reference data snapshot.
//!
//! The static reference tables (tract centroids, weather descriptions)
//! load once at startup and refresh on a multi-hour cycle. Refresh is an
//! atomic `Arc` swap: a new snapshot is built off-lock and swapped in
//! whole, so concurrent readers never observe a partially updated table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use location_insights_geography::{TractIndex, dataset};
use location_insights_geography_models::GeoUnit;
use location_insights_insights_models::WeatherDescription;

use crate::{ReportError, weather};

/// One immutable generation of the static reference tables.
pub struct ReferenceSnapshot {
    /// Spatial index over the tract reference set.
    pub index: TractIndex,
    /// Weather description lookup, keyed by description code.
    pub weather_descriptions: BTreeMap<String, WeatherDescription>,
    loaded_at: Instant,
}

impl ReferenceSnapshot {
    /// Loads a snapshot from the reference dataset files.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::DataUnavailable`] if either file cannot be
    /// loaded.
    pub fn load(units_path: &Path, weather_path: &Path) -> Result<Self, ReportError> {
        let units = dataset::load_geo_units(units_path)?;
        let weather_descriptions = weather::load_descriptions(weather_path)?;
        Ok(Self::from_parts(units, weather_descriptions))
    }

    /// Builds a snapshot from already-loaded reference data.
    #[must_use]
    pub fn from_parts(
        units: Vec<GeoUnit>,
        weather_descriptions: BTreeMap<String, WeatherDescription>,
    ) -> Self {
        Self {
            index: TractIndex::build(units),
            weather_descriptions,
            loaded_at: Instant::now(),
        }
    }

    /// Age of this snapshot.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}

/// Holds the current [`ReferenceSnapshot`] behind an atomic swap.
pub struct SnapshotHolder {
    current: RwLock<Arc<ReferenceSnapshot>>,
    ttl: Duration,
}

impl SnapshotHolder {
    /// Wraps an initial snapshot with the given time-to-live.
    #[must_use]
    pub fn new(initial: ReferenceSnapshot, ttl: Duration) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            ttl,
        }
    }

    /// Returns the current snapshot.
    ///
    /// Cheap: clones the `Arc`, never the tables. The returned snapshot
    /// stays valid for the caller even if a refresh swaps in a newer one
    /// mid-request.
    #[must_use]
    pub fn current(&self) -> Arc<ReferenceSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Whether the current snapshot has outlived its time-to-live.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.current().age() >= self.ttl
    }

    /// Rebuilds and swaps the snapshot if it is stale.
    ///
    /// `rebuild` runs without holding the lock; the swap itself is the
    /// only write-locked operation. Returns whether a swap happened.
    /// Two concurrent refreshes may both rebuild; the later swap wins
    /// and readers see a complete snapshot either way.
    ///
    /// # Errors
    ///
    /// Propagates the rebuild error, leaving the previous snapshot in
    /// place.
    pub fn refresh_if_stale<F>(&self, rebuild: F) -> Result<bool, ReportError>
    where
        F: FnOnce() -> Result<ReferenceSnapshot, ReportError>,
    {
        if !self.is_stale() {
            return Ok(false);
        }

        let fresh = Arc::new(rebuild()?);
        log::info!(
            "Swapping in refreshed reference snapshot ({} tracts)",
            fresh.index.len()
        );

        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = fresh;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(tract_id: &str) -> GeoUnit {
        GeoUnit {
            tract_id: tract_id.to_string(),
            cluster_id: 1,
            name: format!("Tract {tract_id}"),
            centroid_lat: 38.9,
            centroid_lon: -77.0,
            zipcode: "20007".to_string(),
        }
    }

    fn snapshot_with(tract_id: &str) -> ReferenceSnapshot {
        ReferenceSnapshot::from_parts(vec![unit(tract_id)], BTreeMap::new())
    }

    #[test]
    fn current_returns_the_held_snapshot() {
        let holder = SnapshotHolder::new(snapshot_with("T1"), Duration::from_secs(3600));
        assert!(holder.current().index.get("T1").is_some());
        assert!(!holder.is_stale());
    }

    #[test]
    fn fresh_snapshot_is_not_rebuilt() {
        let holder = SnapshotHolder::new(snapshot_with("T1"), Duration::from_secs(3600));
        let swapped = holder
            .refresh_if_stale(|| panic!("rebuild must not run for a fresh snapshot"))
            .unwrap();
        assert!(!swapped);
    }

    #[test]
    fn stale_snapshot_swaps_atomically() {
        let holder = SnapshotHolder::new(snapshot_with("T1"), Duration::ZERO);
        let before = holder.current();
        let swapped = holder.refresh_if_stale(|| Ok(snapshot_with("T2"))).unwrap();
        assert!(swapped);
        // The old Arc stays valid for in-flight readers.
        assert!(before.index.get("T1").is_some());
        assert!(holder.current().index.get("T2").is_some());
    }

    #[test]
    fn failed_rebuild_keeps_previous_snapshot() {
        let holder = SnapshotHolder::new(snapshot_with("T1"), Duration::ZERO);
        let result = holder.refresh_if_stale(|| {
            Err(ReportError::DataUnavailable {
                message: "source offline".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(holder.current().index.get("T1").is_some());
    }
}
