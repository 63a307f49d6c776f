//! Region and S2-cell value types.
//!
//! `SearchRegion` is the public query shape: a center point plus a radius in
//! meters, always clamped to the ranges the rest of the system assumes. A
//! `Cell` is the S2 cell derived from a region (see `nearby::s2geo` for the
//! derivation); it is a plain value type here so that `nearby-types` has no
//! dependency on the `s2` crate itself.

use serde::{Deserialize, Serialize};

/// Minimum and maximum S2 level this system operates at (spec §3).
pub const MIN_LEVEL: i32 = 10;
pub const MAX_LEVEL: i32 = 24;

/// Narrow radius cap used by the upstream query shape (spec §3, §9 flags
/// this as possibly a leftover bound rather than a deliberate product
/// decision; preserved as specified).
pub const MAX_RADIUS_M: f64 = 1000.0;

/// A circular search region: a center point and a radius in meters.
///
/// Construction always clamps `lat` to `[-90, 90]`, `lon` to `[-180, 180]`,
/// and `radius_m` to `[0, 1000]` (spec §3). There is no fallible constructor
/// because every input has a well-defined clamped value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRegion {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

impl SearchRegion {
    /// Build a region, clamping each field into its valid range.
    pub fn new(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            lat: clamp(lat, -90.0, 90.0),
            lon: clamp(lon, -180.0, 180.0),
            radius_m: clamp(radius_m, 0.0, MAX_RADIUS_M),
        }
    }
}

impl Default for SearchRegion {
    /// Default region used when a client omits fields on `location_update`
    /// (spec §6).
    fn default() -> Self {
        Self {
            lat: 38.832352857203624,
            lon: -77.31284409452543,
            radius_m: 1000.0,
        }
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// An S2 cell identified at one of the supported levels, with its center
/// coordinates cached alongside the id for cheap reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: u64,
    pub token: String,
    pub level: i32,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl Cell {
    pub fn new(id: u64, token: String, level: i32, center_lat: f64, center_lon: f64) -> Self {
        debug_assert!((MIN_LEVEL..=MAX_LEVEL).contains(&level));
        Self {
            id,
            token,
            level,
            center_lat,
            center_lon,
        }
    }
}

/// Axis-aligned bounding box approximating an S2 cell, used only for
/// coverage decisions (spec §4.1). Not a precise S2 boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl CellBounds {
    /// Clamp a point into this box, returning the closest point inside (or
    /// on the boundary of) the box.
    pub fn clamp_point(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            clamp(lat, self.lat_min, self.lat_max),
            clamp(lon, self.lon_min, self.lon_max),
        )
    }
}
