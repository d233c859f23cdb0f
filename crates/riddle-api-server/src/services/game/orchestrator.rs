use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::models::chat::{ChatMessage, ChatRoom, RoomId};
use crate::utils::error::CompletionError;

use super::prompt::{render_host_prompt, HostPromptParams, GAME_OVER_MARKER, START_TOKEN};
use super::session::GameSession;
use super::store::SessionStore;

/// Seam to the external chat completion API.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionError>;
}

/// Drives one game turn end to end: prompt assembly, completion call,
/// session update, termination detection.
///
/// Turns within a room are serialized by a keyed async mutex that stays
/// held across the completion await, so the response is always applied to
/// the state that was current at request time. Distinct rooms never block
/// each other. All session mutation happens after a successful completion;
/// any failure leaves the store exactly as it was.
pub struct TurnOrchestrator {
    store: SessionStore,
    completions: Arc<dyn CompletionProvider>,
    game: GameConfig,
    // Lock entries are retained after eviction so a turn already waiting on
    // the room stays serialized with the next game in that room.
    room_locks: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl TurnOrchestrator {
    pub fn new(store: SessionStore, completions: Arc<dyn CompletionProvider>, game: GameConfig) -> Self {
        Self {
            store,
            completions,
            game,
            room_locks: DashMap::new(),
        }
    }

    pub async fn handle_turn(
        &self,
        room_id: RoomId,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let lock = self.room_lock(room_id);
        let _turn = lock.lock().await;

        let mut session = self.store.get_or_create(room_id);

        // The system prompt is rebuilt every turn so it carries the
        // current asked-riddle list; the stale copy is dropped first.
        let system_prompt = render_host_prompt(&HostPromptParams {
            asked_riddles: &session.asked_riddles,
            max_questions: self.game.max_questions,
        });
        session.set_system_message(ChatMessage::system(system_prompt));
        session.history.push(ChatMessage::user(user_prompt));

        let answer = self.completions.complete(session.history.clone()).await?;

        // Only the first "开始" of a session produces a riddle; a repeated
        // start token mid-game gets an ordinary answer that must not enter
        // the dedup set.
        if user_prompt == START_TOKEN && !session.started {
            info!("Room {} recorded a new riddle", room_id);
            session.record_riddle(&answer);
        }
        session.history.push(ChatMessage::assistant(&answer));

        if answer.contains(GAME_OVER_MARKER) {
            debug!("Room {} game over, evicting session", room_id);
            self.store.evict(room_id);
        } else {
            self.store.save(room_id, session);
        }

        Ok(answer)
    }

    /// Unordered snapshot of all live rooms, for `GET /rooms`.
    pub fn list_rooms(&self) -> Vec<ChatRoom> {
        self.store.list()
    }

    fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(room_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatRole;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    fn orchestrator(
        completions: Arc<dyn CompletionProvider>,
    ) -> (TurnOrchestrator, SessionStore) {
        let store = SessionStore::new();
        let orchestrator = TurnOrchestrator::new(
            store.clone(),
            completions,
            GameConfig { max_questions: 10 },
        );
        (orchestrator, store)
    }

    /// Scripted completion double that replays canned replies in order and
    /// captures every outgoing message list.
    struct ScriptedCompletions {
        replies: StdMutex<VecDeque<Result<String, CompletionError>>>,
        requests: StdMutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedCompletions {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies.into()),
                requests: StdMutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionProvider for ScriptedCompletions {
        async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionError> {
            self.requests.lock().unwrap().push(messages);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted completion exhausted")
        }
    }

    #[tokio::test]
    async fn first_start_turn_records_riddle() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .withf(|messages| {
                messages.len() == 2
                    && messages[0].role == ChatRole::System
                    && messages[1] == ChatMessage::user("开始")
            })
            .times(1)
            .returning(|_| Ok("R1".to_string()));
        let (orchestrator, store) = orchestrator(Arc::new(mock));

        let reply = orchestrator.handle_turn(1, "开始").await.unwrap();

        assert_eq!(reply, "R1");
        let session = store.get_or_create(1);
        assert!(session.started);
        assert!(session.asked_riddles.contains("R1"));
        assert_eq!(session.history.len(), 3); // system, user, assistant
    }

    #[tokio::test]
    async fn question_turn_grows_history_without_touching_dedup_set() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Ok("否".to_string()),
        ]);
        let (orchestrator, store) = orchestrator(completions.clone());

        orchestrator.handle_turn(1, "开始").await.unwrap();
        let reply = orchestrator.handle_turn(1, "这个人是老师吗").await.unwrap();

        assert_eq!(reply, "否");
        let session = store.get_or_create(1);
        assert_eq!(session.history.len(), 5);
        assert_eq!(session.asked_riddles.len(), 1);
    }

    #[tokio::test]
    async fn outgoing_list_always_leads_with_one_fresh_system_message() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Ok("是".to_string()),
        ]);
        let (orchestrator, _store) = orchestrator(completions.clone());

        orchestrator.handle_turn(1, "开始").await.unwrap();
        orchestrator.handle_turn(1, "他在室内吗").await.unwrap();

        for request in completions.requests() {
            let system_count = request
                .iter()
                .filter(|m| m.role == ChatRole::System)
                .count();
            assert_eq!(system_count, 1);
            assert_eq!(request[0].role, ChatRole::System);
        }
        // The regenerated system prompt on turn 2 embeds the turn-1 riddle.
        assert!(completions.requests()[1][0].content.contains("R1"));
    }

    #[tokio::test]
    async fn repeated_start_token_does_not_record_again() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Ok("是".to_string()),
        ]);
        let (orchestrator, store) = orchestrator(completions);

        orchestrator.handle_turn(1, "开始").await.unwrap();
        orchestrator.handle_turn(1, "开始").await.unwrap();

        let session = store.get_or_create(1);
        assert_eq!(session.asked_riddles.len(), 1);
        assert!(session.asked_riddles.contains("R1"));
    }

    #[tokio::test]
    async fn game_over_marker_evicts_room() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Ok("游戏结束。汤底：他其实是一名演员。".to_string()),
        ]);
        let (orchestrator, store) = orchestrator(completions);

        orchestrator.handle_turn(1, "开始").await.unwrap();
        orchestrator.handle_turn(1, "退出").await.unwrap();

        assert!(store.is_empty());
        let fresh = store.get_or_create(1);
        assert!(!fresh.started);
        assert!(fresh.history.is_empty());
    }

    #[tokio::test]
    async fn failed_completion_leaves_state_untouched() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Err(CompletionError::Transport("connection reset".to_string())),
        ]);
        let (orchestrator, store) = orchestrator(completions);

        orchestrator.handle_turn(1, "开始").await.unwrap();
        let before = store.get_or_create(1);

        let result = orchestrator.handle_turn(1, "他是老师吗").await;
        assert!(matches!(result, Err(CompletionError::Transport(_))));

        let after = store.get_or_create(1);
        assert_eq!(after.history, before.history);
        assert_eq!(after.asked_riddles, before.asked_riddles);
        assert_eq!(after.started, before.started);
    }

    #[tokio::test]
    async fn failed_first_turn_creates_no_room() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(|_| Err(CompletionError::AuthenticationFailure("401".to_string())));
        let (orchestrator, store) = orchestrator(Arc::new(mock));

        let result = orchestrator.handle_turn(9, "开始").await;

        assert!(matches!(
            result,
            Err(CompletionError::AuthenticationFailure(_))
        ));
        assert!(store.is_empty());
        assert!(orchestrator.list_rooms().is_empty());
    }

    #[tokio::test]
    async fn riddle_dedup_is_scoped_per_room() {
        let completions = ScriptedCompletions::new(vec![
            Ok("R1".to_string()),
            Ok("R2".to_string()),
        ]);
        let (orchestrator, store) = orchestrator(completions.clone());

        orchestrator.handle_turn(1, "开始").await.unwrap();
        orchestrator.handle_turn(2, "开始").await.unwrap();

        let room1 = store.get_or_create(1);
        let room2 = store.get_or_create(2);
        assert!(room1.asked_riddles.contains("R1"));
        assert!(!room1.asked_riddles.contains("R2"));
        assert!(room2.asked_riddles.contains("R2"));
        assert!(!room2.asked_riddles.contains("R1"));
        // Room 2's prompt is not steered away from room 1's riddle.
        assert!(!completions.requests()[1][0].content.contains("R1"));
    }

    #[tokio::test]
    async fn recorded_riddle_is_trimmed() {
        let completions = ScriptedCompletions::new(vec![Ok("  R1  \n".to_string())]);
        let (orchestrator, store) = orchestrator(completions);

        orchestrator.handle_turn(1, "开始").await.unwrap();

        let session = store.get_or_create(1);
        assert!(session.asked_riddles.contains("R1"));
        // History keeps the assistant text as returned.
        assert_eq!(session.history[2], ChatMessage::assistant("  R1  \n"));
    }

    #[tokio::test]
    async fn list_rooms_reflects_live_sessions() {
        let completions = ScriptedCompletions::new(vec![Ok("R1".to_string())]);
        let (orchestrator, _store) = orchestrator(completions);

        orchestrator.handle_turn(5, "开始").await.unwrap();

        let rooms = orchestrator.list_rooms();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, 5);
        assert_eq!(rooms[0].messages.len(), 3);
    }
}
