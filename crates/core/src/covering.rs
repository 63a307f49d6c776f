//! Covering-set construction (spec §4.2).
//!
//! Given a region, decide how many same-level cells the search circle
//! actually reaches: just the region's own cell, or that cell plus
//! whichever neighbors the circle also overlaps. This is the seed set the
//! hierarchical walk (`search::walk`) starts from, not a full S2
//! `RegionCoverer` covering: the walk itself refines each seed downward.
//! The center cell's parent is consulted only to decide *whether* to check
//! neighbors at all; it is never itself part of the returned set.

use crate::s2geo;
use nearby_types::region::CellBounds;
use nearby_types::{Cell, SearchRegion};
use std::collections::HashSet;

/// Distance in meters from `(lat, lon)` to the nearest of `bounds`'s 4
/// edges, assuming the point lies inside `bounds` (true for a region
/// center against its own covering cell's parent).
fn distance_to_nearest_edge(lat: f64, lon: f64, bounds: &CellBounds) -> f64 {
    let to_south = s2geo::haversine(lat, lon, bounds.lat_min, lon);
    let to_north = s2geo::haversine(lat, lon, bounds.lat_max, lon);
    let to_west = s2geo::haversine(lat, lon, lat, bounds.lon_min);
    let to_east = s2geo::haversine(lat, lon, lat, bounds.lon_max);
    to_south.min(to_north).min(to_west).min(to_east)
}

/// Build the covering set for `region` (spec §4.2): `{center_cell}` alone
/// if the region center sits farther from its parent's bounding edges than
/// `region.radius_m`, otherwise `{center_cell} ∪ {n ∈ neighbors | n
/// intersects region}`.
pub fn covering_set(region: &SearchRegion) -> Vec<Cell> {
    let center_cell = s2geo::cell_from_region(region);

    if center_cell.level > nearby_types::region::MIN_LEVEL {
        let parent_bounds = s2geo::bounds(&s2geo::parent(&center_cell));
        let edge_distance = distance_to_nearest_edge(region.lat, region.lon, &parent_bounds);
        if edge_distance > region.radius_m {
            return vec![center_cell];
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    seen.insert(center_cell.id);
    out.push(center_cell.clone());

    for neighbor in s2geo::neighbors(&center_cell) {
        if !seen.insert(neighbor.id) {
            continue;
        }
        if s2geo::intersects(region, &neighbor) {
            out.push(neighbor);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_set_always_includes_the_center_cell() {
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 300.0);
        let set = covering_set(&region);
        let center = s2geo::cell_from_region(&region);
        assert!(set.iter().any(|c| c.id == center.id));
    }

    #[test]
    fn covering_set_has_no_duplicate_ids() {
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 300.0);
        let set = covering_set(&region);
        let mut ids: Vec<u64> = set.iter().map(|c| c.id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn covering_set_bounded_in_size() {
        // center + up to 8 same-level neighbors = at most 9.
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 300.0);
        let set = covering_set(&region);
        assert!(set.len() <= 9);
    }

    #[test]
    fn tiny_region_deep_inside_its_cell_covers_alone() {
        // A near-zero radius is extremely unlikely to reach its own
        // parent's bounding edges, so the covering set should collapse to
        // just the center cell.
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 0.1);
        let set = covering_set(&region);
        assert_eq!(set.len(), 1);
    }
}
