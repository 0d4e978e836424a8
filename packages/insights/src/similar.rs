//! Similar-location ranking within a tract's cluster.
//!
//! The warehouse holds a precomputed nearest-neighbor table per tract;
//! this module scopes it to the tract's cluster, deduplicates localities,
//! and produces a dense re-ranking for display. It also partitions the
//! full cluster membership for map highlighting.

use std::collections::BTreeSet;

use location_insights_geography::TractIndex;
use location_insights_geography_models::GeoUnit;
use location_insights_insights_models::{ClusterPartition, NeighborRecord, SimilarLocation};

/// Default length of the similar-locations list.
pub const DEFAULT_LIMIT: usize = 10;

/// Ranks the most similar locations to `unit` within its cluster.
///
/// Neighbor rows outside the unit's cluster (or pointing at tracts
/// missing from the reference set) are excluded; remaining rows are
/// deduplicated by (locality, state) keeping the best original rank,
/// then densely re-ranked from 1 with original row order breaking ties.
#[must_use]
pub fn similar_locations(
    unit: &GeoUnit,
    neighbors: &[NeighborRecord],
    index: &TractIndex,
    limit: usize,
) -> Vec<SimilarLocation> {
    let mut candidates: Vec<(&NeighborRecord, &GeoUnit)> = Vec::new();
    for neighbor in neighbors {
        if neighbor.neighbor_tract_id == unit.tract_id {
            continue;
        }
        let Some(neighbor_unit) = index.get(&neighbor.neighbor_tract_id) else {
            log::debug!(
                "Neighbor tract {} not in reference set; skipping",
                neighbor.neighbor_tract_id
            );
            continue;
        };
        if neighbor_unit.cluster_id != unit.cluster_id {
            continue;
        }
        candidates.push((neighbor, neighbor_unit));
    }

    // Stable sort: original row order breaks rank ties.
    candidates.sort_by_key(|(neighbor, _)| neighbor.rank);

    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut ranked = Vec::new();
    for (neighbor, neighbor_unit) in candidates {
        if !seen.insert((neighbor.locality.as_str(), neighbor.state.as_str())) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let rank = (ranked.len() + 1) as u32;
        ranked.push(SimilarLocation {
            locality: neighbor.locality.clone(),
            state: neighbor.state.clone(),
            rank,
            zipcode: Some(neighbor_unit.zipcode.clone()),
        });
        if ranked.len() == limit {
            break;
        }
    }

    ranked
}

/// Splits the unit's cluster into tracts present in the neighbor table
/// and tracts absent from it. The split feeds map highlighting
/// downstream; this component only computes the membership.
#[must_use]
pub fn cluster_partition(
    unit: &GeoUnit,
    neighbors: &[NeighborRecord],
    index: &TractIndex,
) -> ClusterPartition {
    let in_table: BTreeSet<&str> = neighbors
        .iter()
        .map(|n| n.neighbor_tract_id.as_str())
        .collect();

    let mut with_neighbors = Vec::new();
    let mut without_neighbors = Vec::new();
    for tract_id in index.cluster_members(unit.cluster_id) {
        if in_table.contains(tract_id.as_str()) {
            with_neighbors.push(tract_id.clone());
        } else {
            without_neighbors.push(tract_id.clone());
        }
    }

    ClusterPartition {
        cluster_id: unit.cluster_id,
        with_neighbors,
        without_neighbors,
    }
}
