//! Board route handlers: sprint columns, tasks and the reconcile sweep.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use stride_board::ReconcileReport;
use stride_realtime::NotifyTarget;
use stride_store::models::{BoardColumn, ColumnTitle, NotificationKind, Task};
use stride_store::StrideError;
use tracing::warn;

use crate::routes::reject;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnRequest {
    pub sprint_id: String,
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameColumnRequest {
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub sprint_id: String,
    pub title: String,
    pub description: Option<String>,
    pub story_points: Option<i64>,
    #[serde(default)]
    pub assignee_ids: Vec<String>,
    pub board_column_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub story_points: Option<i64>,
    pub assignee_ids: Option<Vec<String>>,
    pub board_column_id: Option<String>,
}

fn parse_title(raw: &str) -> Result<ColumnTitle, (StatusCode, String)> {
    ColumnTitle::parse(raw)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown column title: {raw}")))
}

// ─── Columns ─────────────────────────────────────────────────────────────

pub async fn list_columns(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Vec<BoardColumn>>, (StatusCode, String)> {
    let columns = stride_board::columns::list_columns(state.store.as_ref(), &sprint_id)
        .await
        .map_err(reject)?;
    Ok(Json(columns))
}

pub async fn create_column(
    State(state): State<AppState>,
    Json(req): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<BoardColumn>), (StatusCode, String)> {
    let title = parse_title(&req.title)?;
    let column = stride_board::columns::create_column(state.store.as_ref(), &req.sprint_id, title)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn rename_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameColumnRequest>,
) -> Result<Json<BoardColumn>, (StatusCode, String)> {
    let title = parse_title(&req.title)?;
    let column = stride_board::columns::rename_column(state.store.as_ref(), &id, title)
        .await
        .map_err(reject)?;
    Ok(Json(column))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    stride_board::columns::delete_column(state.store.as_ref(), &id)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Tasks ───────────────────────────────────────────────────────────────

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    let tasks = stride_board::tasks::list_sprint_tasks(state.store.as_ref(), &sprint_id)
        .await
        .map_err(reject)?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, (StatusCode, String)> {
    let task = stride_board::tasks::get_task(state.store.as_ref(), &id)
        .await
        .map_err(reject)?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    let task = stride_board::tasks::create_task(
        state.store.as_ref(),
        &req.sprint_id,
        &req.title,
        req.description.as_deref(),
        req.story_points.unwrap_or(0),
        &req.assignee_ids,
        req.board_column_id.as_deref(),
    )
    .await
    .map_err(reject)?;

    notify_assignees(&state, &task, &task.assignee_ids).await;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, (StatusCode, String)> {
    // The field patch is validated before the move is committed, so a
    // request that would be rejected leaves the board untouched.
    if matches!(req.title.as_deref(), Some(t) if t.trim().is_empty()) {
        return Err(reject(StrideError::validation("task title must not be empty")));
    }

    let before = stride_board::tasks::get_task(state.store.as_ref(), &id)
        .await
        .map_err(reject)?;

    let moved = match &req.board_column_id {
        Some(column_id) if *column_id != before.board_column_id => {
            stride_board::tasks::move_task(state.store.as_ref(), &id, column_id)
                .await
                .map_err(reject)?;
            true
        }
        _ => false,
    };

    let task = stride_board::tasks::update_task(
        state.store.as_ref(),
        &id,
        req.title.as_deref(),
        req.description.as_deref(),
        req.story_points,
        req.assignee_ids.as_deref(),
    )
    .await
    .map_err(reject)?;

    let added: Vec<String> = task
        .assignee_ids
        .iter()
        .filter(|a| !before.assignee_ids.contains(a))
        .cloned()
        .collect();
    notify_assignees(&state, &task, &added).await;

    let (kind, title) = if moved {
        (NotificationKind::TaskMoved, "Task moved")
    } else {
        (NotificationKind::TaskUpdated, "Task updated")
    };
    notify_task_room(&state, &task, kind, title, &task.title).await;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let task = stride_board::tasks::get_task(state.store.as_ref(), &id)
        .await
        .map_err(reject)?;
    stride_board::tasks::delete_task(state.store.as_ref(), &id)
        .await
        .map_err(reject)?;

    notify_task_room(&state, &task, NotificationKind::TaskDeleted, "Task deleted", &task.title)
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reconcile_sprint(
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
) -> Result<Json<ReconcileReport>, (StatusCode, String)> {
    let report = stride_board::reconcile_sprint(state.store.as_ref(), &sprint_id)
        .await
        .map_err(reject)?;
    Ok(Json(report))
}

// ─── Notification fan-out ────────────────────────────────────────────────
//
// A failed notification never fails the request that triggered it; the
// board write has already happened.

async fn notify_assignees(state: &AppState, task: &Task, assignees: &[String]) {
    for user_id in assignees {
        let outcome = state
            .notifications
            .notify(
                NotificationKind::TaskAssigned,
                "Task assigned",
                &format!("You have been assigned to \"{}\"", task.title),
                NotifyTarget::User(user_id.clone()),
            )
            .await;
        if let Err(e) = outcome {
            warn!(task_id = %task.id, user_id, error = %e, "assignment notification failed");
        }
    }
}

async fn notify_task_room(
    state: &AppState,
    task: &Task,
    kind: NotificationKind,
    title: &str,
    message: &str,
) {
    let outcome = state
        .notifications
        .notify(kind, title, message, NotifyTarget::Task(task.id.clone()))
        .await;
    if let Err(e) = outcome {
        warn!(task_id = %task.id, error = %e, "task notification failed");
    }
}
