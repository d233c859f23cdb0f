use serde::{Deserialize, Serialize};

/// Room identifier; stable for the lifetime of one game session.
pub type RoomId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Role-tagged line of dialogue, wire-compatible with the
/// OpenAI-style chat completion message format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(rename = "userPrompt")]
    pub user_prompt: String,
}

// ===== RESPONSE MODELS =====

/// Snapshot of one live room, returned by `GET /rooms`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRoom {
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    #[serde(rename = "chatMessageList")]
    pub messages: Vec<ChatMessage>,
}
