use rocket::serde::Deserialize;

use super::{BoundingBox, ImageCandidate, ImageSource, ImageryError};
use crate::geo::Coordinates;

const IMAGES_ENDPOINT: &str = "https://graph.mapillary.com/images";

/// How many candidates to request per fetch; selection happens engine-side.
const CANDIDATE_LIMIT: u32 = 3;

/// Street-level imagery adapter for the Mapillary graph API.
pub struct MapillaryClient {
    http: reqwest::Client,
    access_token: String,
}

impl MapillaryClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ApiImage>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct ApiImage {
    id: String,
    thumb_original_url: Option<String>,
    geometry: ApiGeometry,
    #[serde(default)]
    is_pano: bool,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct ApiGeometry {
    /// GeoJSON point, longitude first.
    coordinates: [f64; 2],
}

#[rocket::async_trait]
impl ImageSource for MapillaryClient {
    async fn fetch_candidates(&self, bbox: BoundingBox) -> Result<Vec<ImageCandidate>, ImageryError> {
        let bbox_param = format!("{},{},{},{}", bbox.west, bbox.south, bbox.east, bbox.north);
        let limit_param = CANDIDATE_LIMIT.to_string();

        let response = self
            .http
            .get(IMAGES_ENDPOINT)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "id,thumb_original_url,geometry,is_pano"),
                ("limit", limit_param.as_str()),
                ("bbox", bbox_param.as_str()),
                ("is_pano", "true"),
            ])
            .send()
            .await
            .map_err(|err| ImageryError::Upstream(err.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ImageryError::Auth);
        }
        if !response.status().is_success() {
            return Err(ImageryError::Upstream(format!(
                "image source returned status {}",
                response.status()
            )));
        }

        let body: ImagesResponse = response
            .json()
            .await
            .map_err(|err| ImageryError::Upstream(err.to_string()))?;

        Ok(body
            .data
            .into_iter()
            .map(|image| ImageCandidate {
                id: image.id,
                url: image.thumb_original_url,
                location: Coordinates::new(
                    image.geometry.coordinates[1],
                    image.geometry.coordinates[0],
                ),
                is_pano: image.is_pano,
            })
            .collect())
    }
}
