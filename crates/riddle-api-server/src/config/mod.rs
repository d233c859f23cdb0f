pub mod settings;

pub use settings::{GameConfig, LlmConfig, ServerConfig, Settings};
