//! In-memory stand-ins for the Redis stores, used by the test suite.
//!
//! Ordering matches Redis sorted-set semantics: ascending by score, ties
//! broken by member lexicography.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::StoreError;
use crate::leaderboard::{
    distance_member, distance_member_player, BoardEntry, BoardKind, LeaderboardStore, Scope,
    ScoreSubmission, MAX_LEADERBOARD_SIZE,
};
use crate::session::{GameSession, SessionStore, SESSION_TTL_SECONDS};

#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, (GameSession, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewinds a session's deadline so tests can observe TTL expiry.
    pub fn force_expire(&self, session_id: &str) {
        let mut records = self.records.lock().unwrap();
        if let Some((_, deadline)) = records.get_mut(session_id) {
            *deadline = Instant::now() - Duration::from_secs(1);
        }
    }
}

#[rocket::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &GameSession) -> Result<(), StoreError> {
        let deadline = Instant::now() + Duration::from_secs(SESSION_TTL_SECONDS);
        self.records
            .lock()
            .unwrap()
            .insert(session.session_id.clone(), (session.clone(), deadline));
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<GameSession>, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.get(session_id) {
            Some((session, deadline)) if *deadline > Instant::now() => Ok(Some(session.clone())),
            Some(_) => {
                records.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn take(&self, session_id: &str) -> Result<Option<GameSession>, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.remove(session_id) {
            Some((session, deadline)) if deadline > Instant::now() => Ok(Some(session)),
            _ => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.records.lock().unwrap().remove(session_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLeaderboardStore {
    boards: Mutex<HashMap<String, Vec<(String, f64)>>>,
}

impl MemoryLeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board_len(&self, key: &str) -> usize {
        self.boards
            .lock()
            .unwrap()
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Redis sorted-set order: score ascending, then member lexicographic.
fn sort_board(board: &mut [(String, f64)]) {
    board.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[rocket::async_trait]
impl LeaderboardStore for MemoryLeaderboardStore {
    async fn submit_score(
        &self,
        scope: &Scope,
        player: &str,
        delta: u32,
    ) -> Result<ScoreSubmission, StoreError> {
        let mut boards = self.boards.lock().unwrap();
        let board = boards.entry(scope.score_key()).or_default();

        let total = match board.iter_mut().find(|(member, _)| member == player) {
            Some((_, score)) => {
                *score += delta as f64;
                *score
            }
            None => {
                board.push((player.to_owned(), delta as f64));
                delta as f64
            }
        };

        sort_board(board);
        while board.len() > MAX_LEADERBOARD_SIZE {
            board.remove(0);
        }

        let rank = board
            .iter()
            .rev()
            .position(|(member, _)| member == player)
            .map(|rank| rank + 1);
        Ok(ScoreSubmission {
            total: total as i64,
            rank,
        })
    }

    async fn submit_distance(
        &self,
        scope: &Scope,
        player: &str,
        distance_meters: u32,
        timestamp_ms: i64,
    ) -> Result<Option<usize>, StoreError> {
        let member = distance_member(player, distance_meters, timestamp_ms);
        let mut boards = self.boards.lock().unwrap();
        let board = boards.entry(scope.distance_key()).or_default();

        board.push((member.clone(), distance_meters as f64));
        sort_board(board);
        board.truncate(MAX_LEADERBOARD_SIZE);

        Ok(board
            .iter()
            .position(|(entry, _)| *entry == member)
            .map(|rank| rank + 1))
    }

    async fn list(
        &self,
        scope: &Scope,
        kind: BoardKind,
        limit: usize,
    ) -> Result<Vec<BoardEntry>, StoreError> {
        let key = match kind {
            BoardKind::Score => scope.score_key(),
            BoardKind::Distance => scope.distance_key(),
        };
        let boards = self.boards.lock().unwrap();
        let mut board = boards.get(&key).cloned().unwrap_or_default();
        sort_board(&mut board);

        let ordered: Vec<(String, f64)> = match kind {
            BoardKind::Score => board.into_iter().rev().take(limit).collect(),
            BoardKind::Distance => board.into_iter().take(limit).collect(),
        };

        Ok(ordered
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
