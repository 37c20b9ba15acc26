use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::*;

use engine::{RoundEngine, ScopeOutcome, SessionStatus};
use error::{GameError, GameResult};
use geo::Coordinates;
use imagery::MapillaryClient;
use leaderboard::{BoardEntry, BoardKind, Scope};
use store::redis::{RedisLeaderboardStore, RedisSessionStore};

mod cities;
mod engine;
mod error;
mod geo;
mod imagery;
mod leaderboard;
mod session;
mod store;
#[cfg(test)]
mod tests;

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Connect to the store
    let redis_url = dotenv::var("REDIS_URL").expect("REDIS_URL environment variable is not set");
    let redis_client = redis::Client::open(redis_url.as_str()).expect("invalid REDIS_URL");
    let connection = redis_client
        .get_connection_manager()
        .await
        .expect("failed to connect to redis");

    let access_token = dotenv::var("MAPILLARY_ACCESS_TOKEN")
        .expect("MAPILLARY_ACCESS_TOKEN environment variable is not set");

    let engine = RoundEngine::new(
        Arc::new(RedisSessionStore::new(connection.clone())),
        Arc::new(RedisLeaderboardStore::new(connection)),
        Arc::new(MapillaryClient::new(access_token)),
    );

    build_rocket(engine)
}

/// Shared by the launch path and the test suite, which injects in-memory
/// stores instead of Redis.
fn build_rocket(engine: RoundEngine) -> Rocket<Build> {
    rocket::build()
        .mount(
            "/",
            routes![
                index,
                list_cities,
                start_round,
                session_status,
                resolve_round,
                skip_round,
                get_leaderboard
            ],
        )
        .manage(engine)
}

#[get("/")]
fn index() -> &'static str {
    "This is a street-view location guessing game server!"
}

#[get("/cities")]
fn list_cities() -> Json<Vec<cities::CityInfo>> {
    Json(cities::list())
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct StartRoundRequest {
    city: String,
    session_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct ImageInfo {
    id: String,
    url: Option<String>,
    is_pano: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct StartRoundResponse {
    session_id: String,
    image: ImageInfo,
}

/// Starts a round: picks a street-level image in the requested city and
/// stores a session holding the secret target. The response never carries
/// the target location.
#[post("/rounds", format = "json", data = "<request>")]
async fn start_round(
    request: Json<StartRoundRequest>,
    engine: &State<RoundEngine>,
) -> GameResult<Json<StartRoundResponse>> {
    let request = request.into_inner();
    let started = engine.start_round(&request.city, request.session_id).await?;
    Ok(Json(StartRoundResponse {
        session_id: started.session_id,
        image: ImageInfo {
            id: started.image_id,
            url: started.image_url,
            is_pano: started.is_pano,
        },
    }))
}

/// Session metadata without the target location.
#[get("/rounds/<session_id>")]
async fn session_status(
    session_id: &str,
    engine: &State<RoundEngine>,
) -> GameResult<Json<SessionStatus>> {
    Ok(Json(engine.session_status(session_id).await?))
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct GuessRequest {
    player: String,
    lat: f64,
    lng: f64,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct LeaderboardReport {
    global: ScopeOutcome,
    city: ScopeOutcome,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct GuessResponse {
    distance_meters: u32,
    score: u32,
    global_rank: Option<usize>,
    city_rank: Option<usize>,
    target: Coordinates,
    leaderboard: LeaderboardReport,
}

/// Resolves a round: scores the guess server-side, updates both leaderboard
/// scopes, and reveals the target. One-shot per session id.
#[post("/rounds/<session_id>/guess", format = "json", data = "<request>")]
async fn resolve_round(
    session_id: &str,
    request: Json<GuessRequest>,
    engine: &State<RoundEngine>,
) -> GameResult<Json<GuessResponse>> {
    let request = request.into_inner();
    let outcome = engine
        .resolve_round(
            session_id,
            &request.player,
            Coordinates::new(request.lat, request.lng),
        )
        .await?;

    let global_rank = outcome.global.rank;
    let city_rank = outcome.city.rank;
    Ok(Json(GuessResponse {
        distance_meters: outcome.distance_meters,
        score: outcome.score,
        global_rank,
        city_rank,
        target: outcome.target,
        leaderboard: LeaderboardReport {
            global: outcome.global,
            city: outcome.city,
        },
    }))
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct SkipResponse {
    skipped: bool,
}

/// Abandons a round without scoring. Always acknowledges, even for unknown
/// or already-gone sessions.
#[post("/rounds/<session_id>/skip")]
async fn skip_round(
    session_id: &str,
    engine: &State<RoundEngine>,
) -> GameResult<Json<SkipResponse>> {
    engine.abandon_round(session_id).await?;
    Ok(Json(SkipResponse { skipped: true }))
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct LeaderboardResponse {
    scope: String,
    kind: &'static str,
    entries: Vec<BoardEntry>,
}

/// Ranked entries for a scope and board kind, best first.
#[get("/leaderboard?<scope>&<kind>&<limit>")]
async fn get_leaderboard(
    scope: Option<&str>,
    kind: Option<&str>,
    limit: Option<usize>,
    engine: &State<RoundEngine>,
) -> GameResult<Json<LeaderboardResponse>> {
    let scope = parse_scope(scope)?;
    let kind = match kind.unwrap_or("score") {
        "score" => BoardKind::Score,
        "distance" => BoardKind::Distance,
        other => {
            return Err(GameError::Validation(format!(
                "unknown leaderboard kind: {}",
                other
            )))
        }
    };

    let entries = engine
        .leaderboard(scope.clone(), kind, limit.unwrap_or(100))
        .await?;
    Ok(Json(LeaderboardResponse {
        scope: scope.label(),
        kind: match kind {
            BoardKind::Score => "score",
            BoardKind::Distance => "distance",
        },
        entries,
    }))
}

fn parse_scope(scope: Option<&str>) -> GameResult<Scope> {
    match scope {
        None | Some("global") | Some("vietnam") => Ok(Scope::Global),
        Some(code) => cities::find(code)
            .map(|city| Scope::City(city.code.to_owned()))
            .ok_or_else(|| GameError::Validation(format!("unknown leaderboard scope: {}", code))),
    }
}
