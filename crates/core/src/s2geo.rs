//! S2 geometry adapter (spec §4.1).
//!
//! Pure functions translating `(lat, lon, level)` into S2 cell identifiers,
//! tokens, parents, children, and neighbors, plus the haversine distance and
//! the level-to-diameter table. Everything here treats the `s2` crate as a
//! pure-function oracle (spec §1): no S2 math is reimplemented, only
//! translated into and out of this crate's own `Cell`/`CellBounds` value
//! types so the rest of the engine never touches `s2` directly.

use nearby_types::region::{CellBounds, MAX_LEVEL, MIN_LEVEL};
use nearby_types::{Cell, SearchRegion};
use s2::cell::Cell as S2Cell;
use s2::cellid::CellID;
use s2::latlng::LatLng;
use std::collections::HashSet;

/// Earth radius used by `haversine`, matching spec §4.1 exactly.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate cell diameter in meters for each supported S2 level,
/// `(level, diameter_m)`, levels 10..24 (spec §4.1).
pub const LEVEL_TO_DIAMETER: [(i32, f64); 15] = [
    (10, 9766.0),
    (11, 4883.0),
    (12, 2441.0),
    (13, 1220.0),
    (14, 610.0),
    (15, 305.0),
    (16, 153.0),
    (17, 76.0),
    (18, 38.0),
    (19, 19.0),
    (20, 9.5),
    (21, 4.8),
    (22, 2.4),
    (23, 1.2),
    (24, 0.6),
];

fn diameter_for_level(level: i32) -> f64 {
    LEVEL_TO_DIAMETER
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, d)| *d)
        .expect("level out of supported range [10, 24]")
}

/// Choose the finest level `L` whose diameter still covers `2 * radius`
/// (spec §4.1). Saturates at the table ends: `radius <= 0` returns 24, a
/// radius too large for any table entry returns 10.
pub fn level_for_radius(radius_m: f64) -> i32 {
    if radius_m <= 0.0 {
        return MAX_LEVEL;
    }

    let target = 2.0 * radius_m;

    // Binary search over the (ascending-level, descending-diameter) table
    // for the largest level whose diameter is still >= target.
    let mut lo = 0usize;
    let mut hi = LEVEL_TO_DIAMETER.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if LEVEL_TO_DIAMETER[mid].1 >= target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    if lo == 0 {
        MIN_LEVEL
    } else {
        LEVEL_TO_DIAMETER[lo - 1].0
    }
}

fn cell_id_to_cell(id: CellID) -> Cell {
    let center: LatLng = S2Cell::from(id).center().into();
    Cell::new(
        id.0,
        id.to_token(),
        id.level() as i32,
        center.lat.deg(),
        center.lng.deg(),
    )
}

/// The S2 cell at the level matching `region`'s radius, containing the
/// region's center (spec §4.1).
pub fn cell_from_region(region: &SearchRegion) -> Cell {
    let level = level_for_radius(region.radius_m);
    let leaf = CellID::from(LatLng::from_degrees(region.lat, region.lon));
    let id = leaf.parent(level as u64);
    cell_id_to_cell(id)
}

/// The parent cell one level up. Panics if `cell.level <= MIN_LEVEL`, which
/// never happens in this engine's call sites (the covering step only calls
/// this on cells chosen by `level_for_radius`, which never returns `MIN_LEVEL - 1`).
pub fn parent(cell: &Cell) -> Cell {
    let id = CellID(cell.id).parent((cell.level - 1) as u64);
    cell_id_to_cell(id)
}

/// The 4 children of `cell` at `cell.level + 1` (spec §4.1, §4.3).
pub fn children(cell: &Cell) -> [Cell; 4] {
    let ids = CellID(cell.id).children();
    [
        cell_id_to_cell(ids[0]),
        cell_id_to_cell(ids[1]),
        cell_id_to_cell(ids[2]),
        cell_id_to_cell(ids[3]),
    ]
}

/// Up to 8 same-level edge-and-corner neighbors of `cell` (spec §4.1).
/// `all_neighbors` is S2's own name for this set (4 edge neighbors plus the
/// diagonal cells across each corner); `vertex_neighbors` is a different,
/// narrower query (the cells around this cell's single closest vertex) and
/// would silently drop neighbors on the far side of the cell. Deduplicated
/// and order-stable (ascending id) for callers that need stable ordering.
pub fn neighbors(cell: &Cell) -> Vec<Cell> {
    let ids = CellID(cell.id).all_neighbors(cell.level as u64);
    let mut seen = HashSet::with_capacity(ids.len());
    let mut out: Vec<CellID> = ids.into_iter().filter(|id| seen.insert(id.0)).collect();
    out.sort_by_key(|id| id.0);
    out.into_iter().map(cell_id_to_cell).collect()
}

/// Axis-aligned bounding box approximating `cell`'s extent, derived from
/// the level-diameter table (spec §4.1). `111320` m/deg is the standard
/// spherical-earth latitude scale; longitude is scaled by `cos(lat)`.
pub fn bounds(cell: &Cell) -> CellBounds {
    const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

    let half_diameter = diameter_for_level(cell.level) / 2.0;
    let lat_rad = cell.center_lat.to_radians();
    let meters_per_degree_lon = (METERS_PER_DEGREE_LAT * lat_rad.cos()).max(1.0);

    let lat_span = half_diameter / METERS_PER_DEGREE_LAT;
    let lon_span = half_diameter / meters_per_degree_lon;

    CellBounds {
        lat_min: (cell.center_lat - lat_span).max(-90.0),
        lat_max: (cell.center_lat + lat_span).min(90.0),
        lon_min: (cell.center_lon - lon_span).max(-180.0),
        lon_max: (cell.center_lon + lon_span).min(180.0),
    }
}

/// Great-circle distance between two lat/lon points, in meters (spec
/// §4.1). Implemented directly rather than via the `geo` crate's
/// `Haversine` metric so the Earth-radius constant here is exactly
/// `6_371_000.0`.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Whether a search circle reaches into `cell`'s bounding box (spec §4.1):
/// clamp the region center into the box, then check the clamped point is
/// within `region.radius_m` of the original center.
pub fn intersects(region: &SearchRegion, cell: &Cell) -> bool {
    let bounds = bounds(cell);
    let (clamped_lat, clamped_lon) = bounds.clamp_point(region.lat, region.lon);
    haversine(region.lat, region.lon, clamped_lat, clamped_lon) <= region.radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_for_radius_matches_table_saturation() {
        assert_eq!(level_for_radius(0.0), 24);
        assert_eq!(level_for_radius(-5.0), 24);
        assert_eq!(level_for_radius(10_000_000.0), 10);
    }

    #[test]
    fn level_for_radius_scenario_a() {
        // Region radius 300m -> target diameter 600m.
        // D(15)=305 >= 600? No: 305 < 600. Let's verify against the table directly.
        let level = level_for_radius(300.0);
        let diameter = diameter_for_level(level);
        assert!(diameter >= 600.0);
        if level < 24 {
            assert!(diameter_for_level(level + 1) < 600.0);
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_at_same_point() {
        let d1 = haversine(38.9072, -77.0369, 40.7128, -74.0060);
        let d2 = haversine(40.7128, -74.0060, 38.9072, -77.0369);
        assert!((d1 - d2).abs() < 1e-6);
        assert_eq!(haversine(38.9, -77.3, 38.9, -77.3), 0.0);
    }

    #[test]
    fn haversine_sanity_dc_to_nyc() {
        let d = haversine(38.9072, -77.0369, 40.7128, -74.0060);
        assert!(d > 320_000.0 && d < 340_000.0, "got {d}");
    }

    #[test]
    fn haversine_antipode() {
        let d = haversine(0.0, 0.0, 0.0, 180.0);
        let expected = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - expected).abs() < 1000.0, "got {d}, expected {expected}");
    }

    #[test]
    fn children_tile_the_parent() {
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 300.0);
        let cell = cell_from_region(&region);
        for child in children(&cell) {
            let recovered_parent = parent(&child);
            assert_eq!(recovered_parent.id, cell.id);
        }
    }

    #[test]
    fn neighbors_are_at_most_eight_and_same_level() {
        let region = SearchRegion::new(38.826589169752516, -77.30255757609915, 300.0);
        let cell = cell_from_region(&region);
        let ns = neighbors(&cell);
        assert!(ns.len() <= 8);
        for n in &ns {
            assert_eq!(n.level, cell.level);
        }
    }
}
