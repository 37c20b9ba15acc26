use rocket::serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

mod mapillary;

pub use mapillary::MapillaryClient;

/// Geographic search box, west/south/east/north order as the imagery API expects.
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// One street-level image the adapter found inside a bounding box.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct ImageCandidate {
    pub id: String,
    pub url: Option<String>,
    pub location: Coordinates,
    pub is_pano: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ImageryError {
    #[error("image source authentication failed")]
    Auth,
    #[error("image source request failed: {0}")]
    Upstream(String),
}

/// External street-level imagery provider.
///
/// An empty candidate list means "no coverage in this area" and is a normal
/// outcome, not an error. The engine owns candidate selection.
#[rocket::async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_candidates(&self, bbox: BoundingBox) -> Result<Vec<ImageCandidate>, ImageryError>;
}
