use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::chat::{ChatParams, ChatRoom, RoomId};
use crate::services::TurnOrchestrator;
use crate::utils::error::ApiError;

/// `POST /{room_id}/chat?userPrompt=...` — one game turn, plain-text reply.
pub async fn chat_handler(
    Extension(orchestrator): Extension<Arc<TurnOrchestrator>>,
    Path(room_id): Path<RoomId>,
    Query(params): Query<ChatParams>,
) -> Result<String, ApiError> {
    if params.user_prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("userPrompt must not be empty".to_string()));
    }

    info!(
        "Chat turn: room={}, prompt_len={}",
        room_id,
        params.user_prompt.len()
    );

    let reply = orchestrator
        .handle_turn(room_id, &params.user_prompt)
        .await?;
    Ok(reply)
}

/// `GET /rooms` — snapshot of all live rooms and their histories.
pub async fn list_rooms_handler(
    Extension(orchestrator): Extension<Arc<TurnOrchestrator>>,
) -> Json<Vec<ChatRoom>> {
    Json(orchestrator.list_rooms())
}
