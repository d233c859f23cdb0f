pub mod game;
pub mod llm_service;

pub use game::{SessionStore, TurnOrchestrator};
pub use llm_service::LlmService;
