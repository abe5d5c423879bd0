//! Chat room route handlers.
//!
//! Message traffic itself flows over the websocket; these routes cover the
//! HTTP side: fetching a project's room (with its message log) and tearing
//! a room down.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use stride_store::models::ChatRoom;

use crate::routes::reject;
use crate::state::AppState;

/// Fetch a project's chat room, creating it on first access.
pub async fn room_for_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ChatRoom>, (StatusCode, String)> {
    let room = state
        .chat
        .room_for_project(&project_id)
        .await
        .map_err(reject)?;
    Ok(Json(room))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.chat.delete_room(&room_id).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}
