use rocket::serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::store::StoreError;

/// How long a session stays resolvable. After this the store expires the
/// record and the round is permanently lost.
pub const SESSION_TTL_SECONDS: u64 = 30 * 60;

/// One in-progress round. The `session_id` is the sole credential for
/// resolving it; `target` stays server-side until resolution reveals it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct GameSession {
    pub session_id: String,
    pub city_code: String,
    pub target: Coordinates,
    pub image_id: String,
    pub created_at_ms: i64,
}

impl GameSession {
    pub fn new(session_id: String, city_code: String, target: Coordinates, image_id: String) -> Self {
        Self {
            session_id,
            city_code,
            target,
            image_id,
            created_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Time-limited session storage. A missing record is a normal outcome and is
/// kept distinct from store connectivity failures.
#[rocket::async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes the session with a fresh TTL, overwriting any record under the
    /// same id (rejoin semantics).
    async fn create(&self, session: &GameSession) -> Result<(), StoreError>;

    async fn read(&self, session_id: &str) -> Result<Option<GameSession>, StoreError>;

    /// Atomically reads and deletes the session. Of two concurrent callers
    /// exactly one gets the record; this is what makes resolution one-shot.
    async fn take(&self, session_id: &str) -> Result<Option<GameSession>, StoreError>;

    /// Removes the session; deleting an absent id is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;
}
