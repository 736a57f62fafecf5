// src/geo.rs
//! Geographic coordinates, Web Mercator helpers and distance functions

use serde::{Deserialize, Serialize};

/// Web Mercator tile edge in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build from a GeoJSON position (`[lng, lat, ...]`).
    ///
    /// Returns `None` unless the first two members are finite numbers.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }
}

/// Distance policy used to rank candidate features against a target point.
pub type DistanceFn = fn(LngLat, LngLat) -> f64;

/// Euclidean distance on raw longitude/latitude degrees.
///
/// No geodesic correction; good enough to rank buildings a few metres apart.
pub fn planar_distance(a: LngLat, b: LngLat) -> f64 {
    ((a.lng - b.lng).powi(2) + (a.lat - b.lat).powi(2)).sqrt()
}

/// Great-circle distance in metres.
pub fn haversine_distance(a: LngLat, b: LngLat) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Size of the Mercator world in pixels at a (fractional) zoom level
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2_f64.powf(zoom)
}

/// Project to Web Mercator world pixels at `zoom`.
pub fn to_world_px(at: LngLat, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat_rad = at.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (at.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`to_world_px`].
pub fn from_world_px(x: f64, y: f64, zoom: f64) -> LngLat {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let lat = ((1.0 - 2.0 * y / size) * std::f64::consts::PI).sinh().atan().to_degrees();
    LngLat::new(lng, lat)
}

/// Ray-casting point-in-polygon test on a single ring.
pub fn ring_contains(ring: &[LngLat], p: LngLat) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let cross_lng = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if p.lng < cross_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
