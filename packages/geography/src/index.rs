//! In-memory spatial index for nearest-tract resolution.
//!
//! Builds an R-tree over tract centroids and resolves arbitrary points to
//! the nearest tract within a distance threshold. Candidate selection uses
//! a conservative bounding envelope in degree space; the final decision is
//! made on exact haversine distance in meters.

use std::collections::BTreeMap;

use geo::{Distance, Haversine, Point};
use location_insights_geography_models::{GeoUnit, ResolvedLocation};
use rstar::{AABB, RTree, RTreeObject};

/// Two candidates whose distances differ by no more than this are treated
/// as equidistant; the lexicographically smallest tract id wins.
const DISTANCE_TIE_EPSILON_M: f64 = 1e-6;

/// Lower bound on meters per degree of latitude/longitude anywhere on the
/// WGS84 ellipsoid. Used to size the candidate envelope so that no unit
/// within the search radius can fall outside it.
const MIN_METERS_PER_DEGREE: f64 = 110_000.0;

/// A tract centroid stored in the R-tree.
struct CentroidEntry {
    tract_id: String,
    /// Point envelope in `[lon, lat]` order.
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CentroidEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built index over the static tract reference set.
///
/// Constructed once per reference snapshot and shared read-only across
/// requests. Resolution is a pure lookup with no side effects.
pub struct TractIndex {
    tree: RTree<CentroidEntry>,
    units: BTreeMap<String, GeoUnit>,
    clusters: BTreeMap<u32, Vec<String>>,
}

impl TractIndex {
    /// Builds the index from the loaded reference units.
    ///
    /// Duplicate tract ids keep the first occurrence.
    #[must_use]
    pub fn build(units: Vec<GeoUnit>) -> Self {
        let mut by_id: BTreeMap<String, GeoUnit> = BTreeMap::new();
        for unit in units {
            if by_id.contains_key(&unit.tract_id) {
                log::warn!("Duplicate tract id {} in reference dataset", unit.tract_id);
                continue;
            }
            by_id.insert(unit.tract_id.clone(), unit);
        }

        let mut clusters: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        let mut entries = Vec::with_capacity(by_id.len());
        for unit in by_id.values() {
            clusters
                .entry(unit.cluster_id)
                .or_default()
                .push(unit.tract_id.clone());
            entries.push(CentroidEntry {
                tract_id: unit.tract_id.clone(),
                envelope: AABB::from_point([unit.centroid_lon, unit.centroid_lat]),
            });
        }

        Self {
            tree: RTree::bulk_load(entries),
            units: by_id,
            clusters,
        }
    }

    /// Number of units in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the index holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Looks up a unit by tract id.
    #[must_use]
    pub fn get(&self, tract_id: &str) -> Option<&GeoUnit> {
        self.units.get(tract_id)
    }

    /// Returns the tract ids belonging to a cluster, in ascending id order.
    #[must_use]
    pub fn cluster_members(&self, cluster_id: u32) -> &[String] {
        self.clusters
            .get(&cluster_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Resolves a point to the nearest tract within `max_distance_m` meters.
    ///
    /// Returns `None` if no unit lies within the threshold. Equidistant
    /// candidates (within [`DISTANCE_TIE_EPSILON_M`]) resolve to the
    /// lexicographically smallest tract id, so identical inputs always
    /// yield the identical unit.
    #[must_use]
    pub fn resolve(&self, lat: f64, lon: f64, max_distance_m: f64) -> Option<ResolvedLocation> {
        if max_distance_m <= 0.0 {
            return None;
        }

        let lat_margin = max_distance_m / MIN_METERS_PER_DEGREE;
        let lon_margin =
            max_distance_m / (MIN_METERS_PER_DEGREE * lat.to_radians().cos().abs().max(0.01));
        let query_env = AABB::from_corners(
            [lon - lon_margin, lat - lat_margin],
            [lon + lon_margin, lat + lat_margin],
        );

        let query_point = Point::new(lon, lat);
        let mut best: Option<(f64, &GeoUnit)> = None;

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            let Some(unit) = self.units.get(&entry.tract_id) else {
                continue;
            };
            let distance = Haversine.distance(
                query_point,
                Point::new(unit.centroid_lon, unit.centroid_lat),
            );
            if distance > max_distance_m {
                continue;
            }

            let closer = match best {
                None => true,
                Some((best_distance, best_unit)) => {
                    distance < best_distance - DISTANCE_TIE_EPSILON_M
                        || ((distance - best_distance).abs() <= DISTANCE_TIE_EPSILON_M
                            && unit.tract_id < best_unit.tract_id)
                }
            };
            if closer {
                best = Some((distance, unit));
            }
        }

        best.map(|(distance_m, unit)| ResolvedLocation {
            latitude: lat,
            longitude: lon,
            unit: unit.clone(),
            distance_m,
        })
    }
}
