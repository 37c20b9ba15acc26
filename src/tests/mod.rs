use std::sync::Arc;

use rocket::http::Status;
use rocket::local::asynchronous::{Client, LocalResponse};
use rocket::serde::json::{json, serde_json, Value};

use crate::engine::RoundEngine;
use crate::geo::Coordinates;
use crate::imagery::{BoundingBox, ImageCandidate, ImageSource, ImageryError};
use crate::store::memory::{MemoryLeaderboardStore, MemorySessionStore};


/// Image source scripted per test.
enum StubImagery {
    Candidates(Vec<ImageCandidate>),
    NoCoverage,
    Unavailable,
}

#[rocket::async_trait]
impl ImageSource for StubImagery {
    async fn fetch_candidates(
        &self,
        _bbox: BoundingBox,
    ) -> Result<Vec<ImageCandidate>, ImageryError> {
        match self {
            Self::Candidates(candidates) => Ok(candidates.clone()),
            Self::NoCoverage => Ok(Vec::new()),
            Self::Unavailable => Err(ImageryError::Upstream("connection reset".to_owned())),
        }
    }
}

fn pano_candidate(id: &str, lat: f64, lng: f64) -> ImageCandidate {
    ImageCandidate {
        id: id.to_owned(),
        url: Some(format!("https://images.example/{}.jpg", id)),
        location: Coordinates::new(lat, lng),
        is_pano: true,
    }
}

fn flat_candidate(id: &str, lat: f64, lng: f64) -> ImageCandidate {
    ImageCandidate {
        is_pano: false,
        ..pano_candidate(id, lat, lng)
    }
}

/// A rocket instance over in-memory stores, with direct handles to them so
/// tests can inspect state behind the HTTP surface.
struct TestApp {
    client: Client,
    sessions: Arc<MemorySessionStore>,
    boards: Arc<MemoryLeaderboardStore>,
}

async fn spawn_app(imagery: StubImagery) -> TestApp {
    let sessions = Arc::new(MemorySessionStore::new());
    let boards = Arc::new(MemoryLeaderboardStore::new());
    let engine = RoundEngine::new(sessions.clone(), boards.clone(), Arc::new(imagery));
    let client = Client::tracked(crate::build_rocket(engine))
        .await
        .expect("valid rocket instance");
    TestApp {
        client,
        sessions,
        boards,
    }
}

async fn deserialize_response(response: LocalResponse<'_>) -> Value {
    let string = response.into_string().await.unwrap();
    serde_json::from_str(&string).unwrap()
}

/// Starts a round and returns the response body, or the raw response on a
/// non-200 status.
async fn start_round<'a>(
    client: &'a Client,
    city: &str,
    session_id: Option<&str>,
) -> Result<Value, LocalResponse<'a>> {
    let mut body = json!({ "city": city });
    if let Some(id) = session_id {
        body["session_id"] = json!(id);
    }

    let response = client.post("/rounds").json(&body).dispatch().await;
    if response.status() != Status::Ok {
        return Err(response);
    }
    Ok(deserialize_response(response).await)
}

/// Submits a guess for a session.
async fn guess<'a>(
    client: &'a Client,
    session_id: &str,
    player: &str,
    lat: f64,
    lng: f64,
) -> Result<Value, LocalResponse<'a>> {
    let response = client
        .post(format!("/rounds/{}/guess", session_id))
        .json(&json!({ "player": player, "lat": lat, "lng": lng }))
        .dispatch()
        .await;
    if response.status() != Status::Ok {
        return Err(response);
    }
    Ok(deserialize_response(response).await)
}

/// Abandons a session, returning the response status.
async fn skip(client: &Client, session_id: &str) -> Status {
    client
        .post(format!("/rounds/{}/skip", session_id))
        .dispatch()
        .await
        .status()
}

/// Fetches a leaderboard; `query` is the raw query string.
async fn leaderboard<'a>(client: &'a Client, query: &str) -> Result<Value, LocalResponse<'a>> {
    let response = client
        .get(format!("/leaderboard{}", query))
        .dispatch()
        .await;
    if response.status() != Status::Ok {
        return Err(response);
    }
    Ok(deserialize_response(response).await)
}
