use rocket::serde::{Deserialize, Serialize};

/// Earth mean radius in meters, used by the haversine formula.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the pair lies within valid latitude (±90) and longitude (±180) ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }
}

/// Great-circle distance between two points in whole meters (haversine).
///
/// Symmetric, and exactly zero for identical inputs.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> u32 {
    if a == b {
        return 0;
    }

    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let central_angle = 2.0 * h.sqrt().asin();

    (EARTH_RADIUS_METERS * central_angle).round() as u32
}

/// Points earned for a guess at the given distance (0-5 scale, inclusive bounds).
pub fn score_for(distance_meters: u32) -> u32 {
    match distance_meters {
        0..=50 => 5,
        51..=100 => 4,
        101..=200 => 3,
        201..=500 => 2,
        501..=1000 => 1,
        _ => 0,
    }
}
