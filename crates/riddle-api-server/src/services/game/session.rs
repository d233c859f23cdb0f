use std::collections::HashSet;

use crate::models::chat::{ChatMessage, ChatRole, RoomId};

/// Per-room conversation state.
///
/// `history` keeps conversational order with at most one leading system
/// message; `asked_riddles` only grows for the lifetime of the session and
/// is discarded wholesale on eviction.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub room_id: RoomId,
    pub history: Vec<ChatMessage>,
    pub asked_riddles: HashSet<String>,
    /// Whether the host has already produced a riddle for this room.
    pub started: bool,
}

impl GameSession {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            history: Vec::new(),
            asked_riddles: HashSet::new(),
            started: false,
        }
    }

    /// The system prompt is regenerated every turn so it always carries
    /// the current asked-riddle set; any stale copy is dropped first.
    pub fn set_system_message(&mut self, message: ChatMessage) {
        self.history.retain(|m| m.role != ChatRole::System);
        self.history.insert(0, message);
    }

    /// Record a freshly generated riddle, trimmed verbatim.
    pub fn record_riddle(&mut self, riddle: &str) {
        self.asked_riddles.insert(riddle.trim().to_string());
        self.started = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_system_message_replaces_stale_copy() {
        let mut session = GameSession::new(1);
        session.set_system_message(ChatMessage::system("v1"));
        session.history.push(ChatMessage::user("开始"));
        session.history.push(ChatMessage::assistant("谜题"));

        session.set_system_message(ChatMessage::system("v2"));

        let system_count = session
            .history
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(session.history[0].content, "v2");
        assert_eq!(session.history.len(), 3);
    }

    #[test]
    fn record_riddle_trims_and_marks_started() {
        let mut session = GameSession::new(7);
        session.record_riddle("  一个雨夜的谜题  \n");

        assert!(session.started);
        assert!(session.asked_riddles.contains("一个雨夜的谜题"));
        assert_eq!(session.asked_riddles.len(), 1);
    }

    #[test]
    fn recording_same_riddle_twice_keeps_one_entry() {
        let mut session = GameSession::new(7);
        session.record_riddle("谜题A");
        session.record_riddle("谜题A ");
        assert_eq!(session.asked_riddles.len(), 1);
    }
}
