use std::sync::Arc;

use rand::seq::SliceRandom;
use rocket::serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cities;
use crate::error::{GameError, GameResult};
use crate::geo::{self, Coordinates};
use crate::imagery::ImageSource;
use crate::leaderboard::{BoardEntry, BoardKind, LeaderboardStore, Scope, MAX_LEADERBOARD_SIZE};
use crate::session::{GameSession, SessionStore};

/// Orchestrates rounds end to end: picks a target from the imagery adapter,
/// holds it in a session, and scores guesses against it server-side.
pub struct RoundEngine {
    sessions: Arc<dyn SessionStore>,
    leaderboards: Arc<dyn LeaderboardStore>,
    images: Arc<dyn ImageSource>,
}

/// What a round start reveals to the player. The target location is not here.
pub struct StartedRound {
    pub session_id: String,
    pub image_id: String,
    pub image_url: Option<String>,
    pub is_pano: bool,
}

/// Per-scope leaderboard outcome of one resolution. The two submissions are
/// independent; either can fail while the round still counts as resolved.
#[derive(Serialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct ScopeOutcome {
    pub scope: String,
    pub total: Option<i64>,
    pub rank: Option<usize>,
    pub score_error: Option<String>,
    pub distance_rank: Option<usize>,
    pub distance_error: Option<String>,
}

pub struct RoundOutcome {
    pub distance_meters: u32,
    pub score: u32,
    pub target: Coordinates,
    pub global: ScopeOutcome,
    pub city: ScopeOutcome,
}

#[derive(Serialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct SessionStatus {
    pub session_id: String,
    pub city: String,
    pub created_at_ms: i64,
}

impl RoundEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        leaderboards: Arc<dyn LeaderboardStore>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            sessions,
            leaderboards,
            images,
        }
    }

    /// Starts a round in the given city: fetches imagery candidates, prefers
    /// a random panoramic one, and stores the session holding the target.
    /// Passing an existing session id rejoins that id with a fresh round.
    pub async fn start_round(
        &self,
        city_code: &str,
        existing_session_id: Option<String>,
    ) -> GameResult<StartedRound> {
        let city = cities::find(city_code).ok_or_else(|| {
            GameError::Validation(format!("unsupported city code: {}", city_code))
        })?;

        let candidates = self.images.fetch_candidates(city.bbox).await?;
        if candidates.is_empty() {
            return Err(GameError::NoImagery {
                city: city.name.to_owned(),
            });
        }

        let panoramic: Vec<_> = candidates.iter().filter(|c| c.is_pano).collect();
        let selected = panoramic
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(&candidates[0]);

        let session_id = existing_session_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let session = GameSession::new(
            session_id.clone(),
            city.code.to_owned(),
            selected.location,
            selected.id.clone(),
        );
        self.sessions.create(&session).await?;

        info!(
            session_id = %session_id,
            city = city.code,
            image = %selected.id,
            "round started"
        );

        Ok(StartedRound {
            session_id,
            image_id: selected.id.clone(),
            image_url: selected.url.clone(),
            is_pano: selected.is_pano,
        })
    }

    /// Scores a guess against the session's target and submits the result to
    /// the global and city leaderboards. Consumes the session, so a second
    /// resolution of the same id fails with not-found and scores nothing.
    pub async fn resolve_round(
        &self,
        session_id: &str,
        player: &str,
        guess: Coordinates,
    ) -> GameResult<RoundOutcome> {
        let player = player.trim();
        if player.is_empty() {
            return Err(GameError::Validation("player name must not be empty".to_owned()));
        }
        if !guess.is_valid() {
            return Err(GameError::Validation(
                "guess coordinates out of valid latitude/longitude range".to_owned(),
            ));
        }

        let session = self
            .sessions
            .take(session_id)
            .await?
            .ok_or(GameError::SessionNotFound)?;

        if !session.target.is_valid() {
            return Err(GameError::Validation(
                "target coordinates out of valid latitude/longitude range".to_owned(),
            ));
        }

        let distance_meters = geo::distance_meters(guess, session.target);
        let score = geo::score_for(distance_meters);
        let timestamp_ms = chrono::Utc::now().timestamp_millis();

        // Submission log for anti-cheat monitoring.
        info!(
            session_id = %session_id,
            player,
            distance_meters,
            score,
            "round resolved"
        );

        let city_scope = Scope::City(session.city_code.clone());
        let global = self
            .submit_to_scope(&Scope::Global, player, score, distance_meters, timestamp_ms)
            .await;
        let city = self
            .submit_to_scope(&city_scope, player, score, distance_meters, timestamp_ms)
            .await;

        Ok(RoundOutcome {
            distance_meters,
            score,
            target: session.target,
            global,
            city,
        })
    }

    /// Both writes to one scope, failures captured instead of propagated:
    /// the session is already consumed, so the round cannot be re-run.
    async fn submit_to_scope(
        &self,
        scope: &Scope,
        player: &str,
        score: u32,
        distance_meters: u32,
        timestamp_ms: i64,
    ) -> ScopeOutcome {
        let mut outcome = ScopeOutcome {
            scope: scope.label(),
            total: None,
            rank: None,
            score_error: None,
            distance_rank: None,
            distance_error: None,
        };

        match self.leaderboards.submit_score(scope, player, score).await {
            Ok(submission) => {
                outcome.total = Some(submission.total);
                outcome.rank = submission.rank;
            }
            Err(err) => {
                warn!(scope = %outcome.scope, player, %err, "score submission failed");
                outcome.score_error = Some(err.to_string());
            }
        }

        match self
            .leaderboards
            .submit_distance(scope, player, distance_meters, timestamp_ms)
            .await
        {
            Ok(rank) => outcome.distance_rank = rank,
            Err(err) => {
                warn!(scope = %outcome.scope, player, %err, "distance submission failed");
                outcome.distance_error = Some(err.to_string());
            }
        }

        outcome
    }

    /// Drops the session without scoring. Idempotent: skipping an unknown or
    /// expired session is still an acknowledged no-op.
    pub async fn abandon_round(&self, session_id: &str) -> GameResult<()> {
        self.sessions.delete(session_id).await?;
        Ok(())
    }

    /// Session metadata lookup. Deliberately returns everything except the
    /// target location: the session id is a bearer credential and no query
    /// path may reveal the answer before resolution.
    pub async fn session_status(&self, session_id: &str) -> GameResult<SessionStatus> {
        let session = self
            .sessions
            .read(session_id)
            .await?
            .ok_or(GameError::SessionNotFound)?;
        Ok(SessionStatus {
            session_id: session.session_id,
            city: session.city_code,
            created_at_ms: session.created_at_ms,
        })
    }

    pub async fn leaderboard(
        &self,
        scope: Scope,
        kind: BoardKind,
        limit: usize,
    ) -> GameResult<Vec<BoardEntry>> {
        let limit = limit.min(MAX_LEADERBOARD_SIZE);
        Ok(self.leaderboards.list(&scope, kind, limit).await?)
    }
}
