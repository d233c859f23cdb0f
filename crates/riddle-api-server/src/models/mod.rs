pub mod chat;

pub use chat::{ChatMessage, ChatRole, ChatRoom, RoomId};
