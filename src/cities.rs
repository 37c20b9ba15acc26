use rocket::serde::Serialize;

use crate::geo::Coordinates;
use crate::imagery::BoundingBox;

/// A supported city and the bounding box imagery is sampled from.
pub struct City {
    pub code: &'static str,
    pub name: &'static str,
    pub center: Coordinates,
    pub bbox: BoundingBox,
}

pub const CITIES: &[City] = &[
    City {
        code: "HN",
        name: "Ha Noi",
        center: Coordinates { lat: 21.0285, lng: 105.8542 },
        bbox: BoundingBox { west: 105.77, south: 20.96, east: 105.88, north: 21.05 },
    },
    City {
        code: "DN",
        name: "Da Nang",
        center: Coordinates { lat: 16.0544, lng: 108.2022 },
        bbox: BoundingBox { west: 108.17, south: 16.0, east: 108.25, north: 16.1 },
    },
    City {
        code: "TPHCM",
        name: "Ho Chi Minh",
        center: Coordinates { lat: 10.8231, lng: 106.6297 },
        bbox: BoundingBox { west: 106.62, south: 10.71, east: 106.75, north: 10.83 },
    },
    City {
        code: "DL",
        name: "Da Lat",
        center: Coordinates { lat: 11.9404, lng: 108.4583 },
        bbox: BoundingBox { west: 108.38, south: 11.89, east: 108.50, north: 12.00 },
    },
    City {
        code: "DH",
        name: "Duc Hoa (Long An)",
        center: Coordinates { lat: 10.8888, lng: 106.3825 },
        bbox: BoundingBox { west: 106.35, south: 10.85, east: 106.45, north: 10.95 },
    },
];

pub fn find(code: &str) -> Option<&'static City> {
    CITIES.iter().find(|city| city.code == code)
}

/// Listing entry for the city picker.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct CityInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub center: Coordinates,
}

pub fn list() -> Vec<CityInfo> {
    CITIES
        .iter()
        .map(|city| CityInfo {
            code: city.code,
            name: city.name,
            center: city.center,
        })
        .collect()
}
