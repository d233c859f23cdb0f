//! Per-room game session management
//!
//! Owns the conversation state machine for the deduction game:
//! - thread-safe in-memory session store (DashMap)
//! - host system-prompt templating with riddle dedup
//! - turn orchestration with per-room serialization and
//!   eviction on the end-of-game marker

mod orchestrator;
mod prompt;
mod session;
mod store;

pub use orchestrator::{CompletionProvider, TurnOrchestrator};
pub use prompt::{render_host_prompt, HostPromptParams, GAME_OVER_MARKER, START_TOKEN};
pub use session::GameSession;
pub use store::SessionStore;
