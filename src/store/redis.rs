use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use rocket::serde::json::serde_json;

use super::StoreError;
use crate::leaderboard::{
    distance_member, distance_member_player, BoardEntry, BoardKind, LeaderboardStore, Scope,
    ScoreSubmission, MAX_LEADERBOARD_SIZE,
};
use crate::session::{GameSession, SessionStore, SESSION_TTL_SECONDS};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

/// Session records as JSON strings under `session:<id>` with a native TTL.
pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn decode_session(key: &str, raw: Option<String>) -> Result<Option<GameSession>, StoreError> {
    raw.map(|raw| {
        serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
            key: key.to_owned(),
            detail: err.to_string(),
        })
    })
    .transpose()
}

#[rocket::async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &GameSession) -> Result<(), StoreError> {
        let key = session_key(&session.session_id);
        let value = serde_json::to_string(session).map_err(|err| StoreError::Corrupt {
            key: key.clone(),
            detail: err.to_string(),
        })?;

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&key, value, SESSION_TTL_SECONDS).await?;
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<GameSession>, StoreError> {
        let key = session_key(session_id);
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.get(&key).await?;
        decode_session(&key, raw)
    }

    async fn take(&self, session_id: &str) -> Result<Option<GameSession>, StoreError> {
        let key = session_key(session_id);
        let mut conn = self.connection.clone();

        // GETDEL: of two concurrent resolvers only one receives the record.
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;
        decode_session(&key, raw)
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        let key = session_key(session_id);
        let mut conn = self.connection.clone();
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}

/// Leaderboards as sorted sets, one per scope and kind.
pub struct RedisLeaderboardStore {
    connection: ConnectionManager,
}

impl RedisLeaderboardStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[rocket::async_trait]
impl LeaderboardStore for RedisLeaderboardStore {
    async fn submit_score(
        &self,
        scope: &Scope,
        player: &str,
        delta: u32,
    ) -> Result<ScoreSubmission, StoreError> {
        let key = scope.score_key();
        let mut conn = self.connection.clone();

        // ZINCRBY is atomic per member, so concurrent submissions by the
        // same player cannot lose a delta.
        let total: f64 = conn.zincr(&key, player, delta as f64).await?;

        // Evict the lowest totals beyond the cap.
        let _: () = conn
            .zremrangebyrank(&key, 0, -(MAX_LEADERBOARD_SIZE as isize + 1))
            .await?;

        let rank: Option<usize> = conn.zrevrank(&key, player).await?;
        Ok(ScoreSubmission {
            total: total as i64,
            rank: rank.map(|rank| rank + 1),
        })
    }

    async fn submit_distance(
        &self,
        scope: &Scope,
        player: &str,
        distance_meters: u32,
        timestamp_ms: i64,
    ) -> Result<Option<usize>, StoreError> {
        let key = scope.distance_key();
        let member = distance_member(player, distance_meters, timestamp_ms);
        let mut conn = self.connection.clone();

        let _: () = conn.zadd(&key, &member, distance_meters as f64).await?;

        // Ascending order, so everything past the cap is the largest distances.
        let _: () = conn
            .zremrangebyrank(&key, MAX_LEADERBOARD_SIZE as isize, -1)
            .await?;

        let rank: Option<usize> = conn.zrank(&key, &member).await?;
        Ok(rank.map(|rank| rank + 1))
    }

    async fn list(
        &self,
        scope: &Scope,
        kind: BoardKind,
        limit: usize,
    ) -> Result<Vec<BoardEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = limit as isize - 1;
        let mut conn = self.connection.clone();

        let raw: Vec<(String, f64)> = match kind {
            BoardKind::Score => {
                conn.zrevrange_withscores(scope.score_key(), 0, stop).await?
            }
            BoardKind::Distance => {
                conn.zrange_withscores(scope.distance_key(), 0, stop).await?
            }
        };

        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(index, (member, value))| {
                let player = match kind {
                    BoardKind::Score => member,
                    BoardKind::Distance => distance_member_player(&member).to_owned(),
                };
                BoardEntry {
                    player,
                    value: value as i64,
                    rank: index + 1,
                }
            })
            .collect())
    }
}
