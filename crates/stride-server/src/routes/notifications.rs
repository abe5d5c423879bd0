//! Notification route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use stride_realtime::NotifyTarget;
use stride_store::models::{Notification, NotificationKind};

use crate::routes::reject;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub target: NotifyTarget,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

pub async fn create_notification(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), (StatusCode, String)> {
    let notification = state
        .notifications
        .notify(req.kind, &req.title, &req.message, req.target)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let items = state
        .notifications
        .user_notifications(&user_id)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn list_for_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let items = state
        .notifications
        .project_notifications(&project_id)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn list_for_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let items = state
        .notifications
        .task_notifications(&task_id)
        .await
        .map_err(reject)?;
    Ok(Json(items))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, (StatusCode, String)> {
    let notification = state.notifications.mark_read(&id).await.map_err(reject)?;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MarkAllReadResponse>, (StatusCode, String)> {
    let updated = state
        .notifications
        .mark_all_read(&user_id)
        .await
        .map_err(reject)?;
    Ok(Json(MarkAllReadResponse { updated }))
}
