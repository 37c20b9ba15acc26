use rocket::serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Entries retained per scope; worst-ranked entries beyond this are evicted
/// after every write.
pub const MAX_LEADERBOARD_SIZE: usize = 200;

/// Ranking partition: the country-wide board or a single city's board.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Scope {
    Global,
    City(String),
}

impl Scope {
    /// Store key of the cumulative-score board for this scope.
    pub fn score_key(&self) -> String {
        match self {
            Scope::Global => "leaderboard:vietnam".to_owned(),
            Scope::City(code) => format!("leaderboard:city:{}", code.to_lowercase()),
        }
    }

    /// Store key of the best-distance board for this scope.
    pub fn distance_key(&self) -> String {
        match self {
            Scope::Global => "distance:vietnam".to_owned(),
            Scope::City(code) => format!("distance:city:{}", code.to_lowercase()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Scope::Global => "global".to_owned(),
            Scope::City(code) => code.clone(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoardKind {
    Score,
    Distance,
}

/// One row of a leaderboard query. For score boards `value` is the player's
/// cumulative total; for distance boards it is a single round's distance in
/// meters. `rank` is the 1-based position in the scope's natural order.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct BoardEntry {
    pub player: String,
    pub value: i64,
    pub rank: usize,
}

/// Outcome of a cumulative-score submission. `rank` is `None` when the new
/// total did not make the retained top entries.
#[derive(Clone, PartialEq, Debug)]
pub struct ScoreSubmission {
    pub total: i64,
    pub rank: Option<usize>,
}

/// Distance records are keyed by player, distance and timestamp so every
/// round resolution stays a separate entry.
pub fn distance_member(player: &str, distance_meters: u32, timestamp_ms: i64) -> String {
    format!("{}:{}:{}", player, distance_meters, timestamp_ms)
}

/// Recovers the player name from a distance-record member. Player names may
/// themselves contain `:`, so only the two trailing segments are stripped.
pub fn distance_member_player(member: &str) -> &str {
    let mut end = member.len();
    for _ in 0..2 {
        match member[..end].rfind(':') {
            Some(idx) => end = idx,
            None => return member,
        }
    }
    &member[..end]
}

/// Ranked storage for both board kinds over both scopes.
///
/// Trimming to [`MAX_LEADERBOARD_SIZE`] happens after every write, never on
/// reads; the cap bounds storage, not the ordering of retained entries.
#[rocket::async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Atomically adds `delta` to the player's cumulative total in `scope`
    /// (missing player counts as zero), trims, and returns the new total
    /// with the player's 1-based descending rank.
    async fn submit_score(
        &self,
        scope: &Scope,
        player: &str,
        delta: u32,
    ) -> Result<ScoreSubmission, StoreError>;

    /// Inserts a new uniquely-identified distance record (never merged with
    /// the player's earlier records), trims from the largest-distance end,
    /// and returns the record's 1-based ascending rank.
    async fn submit_distance(
        &self,
        scope: &Scope,
        player: &str,
        distance_meters: u32,
        timestamp_ms: i64,
    ) -> Result<Option<usize>, StoreError>;

    /// Up to `limit` entries in the scope's natural order (score descending,
    /// distance ascending), each annotated with its position as rank.
    async fn list(
        &self,
        scope: &Scope,
        kind: BoardKind,
        limit: usize,
    ) -> Result<Vec<BoardEntry>, StoreError>;
}
