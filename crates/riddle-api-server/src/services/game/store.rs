use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::chat::{ChatRoom, RoomId};

use super::session::GameSession;

/// Thread-safe in-memory session store, one `GameSession` per live room.
///
/// The map itself uses DashMap's sharded locking; it does NOT serialize
/// turns within a room. That is the orchestrator's per-room lock, which is
/// held across the completion call. Sessions move in and out of the store
/// by value, so a turn that fails mid-flight never leaves a partial write.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<RoomId, GameSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        info!("Initializing in-memory session store");
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Return a working copy of the room's session, or a freshly
    /// initialized one for an unseen room. The fresh value is not inserted
    /// here; a room becomes visible in the store on its first `save`, so a
    /// turn that fails before saving leaves the map untouched.
    pub fn get_or_create(&self, room_id: RoomId) -> GameSession {
        match self.sessions.get(&room_id) {
            Some(entry) => entry.clone(),
            None => {
                debug!("Creating session for room {}", room_id);
                GameSession::new(room_id)
            }
        }
    }

    /// Replace the stored session wholesale. The orchestrator computes the
    /// full next session value; there is no partial-field update here.
    pub fn save(&self, room_id: RoomId, session: GameSession) {
        self.sessions.insert(room_id, session);
        debug!("Saved session for room {}", room_id);
    }

    /// Remove a room's session. Evicting an absent room is a no-op.
    pub fn evict(&self, room_id: RoomId) {
        if self.sessions.remove(&room_id).is_some() {
            info!("Evicted session for room {}", room_id);
        }
    }

    /// Unordered snapshot of all live rooms and their histories.
    pub fn list(&self) -> Vec<ChatRoom> {
        self.sessions
            .iter()
            .map(|entry| ChatRoom {
                room_id: *entry.key(),
                messages: entry.value().history.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
