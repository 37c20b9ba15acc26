use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::Request;

use crate::imagery::ImageryError;
use crate::store::StoreError;

/// Everything a round or leaderboard request can fail with.
///
/// Unknown, expired and already-resolved sessions are deliberately collapsed
/// into one `SessionNotFound` so callers cannot probe session lifecycle
/// timing. Store connectivity failures are never downgraded to not-found.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),
    #[error("session not found or expired")]
    SessionNotFound,
    #[error("no street view imagery found in {city}")]
    NoImagery { city: String },
    #[error(transparent)]
    Imagery(#[from] ImageryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type GameResult<T> = std::result::Result<T, GameError>;

impl GameError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::SessionNotFound => "session_not_found",
            Self::NoImagery { .. } => "no_imagery",
            Self::Imagery(_) => "imagery_unavailable",
            Self::Store(_) => "store_unavailable",
        }
    }

    fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::SessionNotFound => Status::NotFound,
            Self::NoImagery { .. } => Status::ServiceUnavailable,
            Self::Imagery(_) => Status::BadGateway,
            Self::Store(_) => Status::InternalServerError,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl<'r> Responder<'r, 'static> for GameError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        let mut response = Json(body).respond_to(request)?;
        response.set_status(status);
        Ok(response)
    }
}
