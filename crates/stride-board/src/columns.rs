//! Board column lifecycle.
//!
//! Columns are per-sprint lanes identified by a [`ColumnTitle`]. Every sprint
//! carries exactly one backlog column, which can be neither renamed nor
//! deleted; the remaining titles must stay unique within the sprint.

use stride_store::collections::{columns, tasks};
use stride_store::models::{BoardColumn, ColumnTitle};
use stride_store::{DocumentStore, StrideError, StrideResult};
use tracing::info;

pub async fn get_column(store: &dyn DocumentStore, column_id: &str) -> StrideResult<BoardColumn> {
    columns::get_column(store, column_id).await
}

/// Lists a sprint's columns in creation order.
pub async fn list_columns(
    store: &dyn DocumentStore,
    sprint_id: &str,
) -> StrideResult<Vec<BoardColumn>> {
    columns::list_for_sprint(store, sprint_id).await
}

/// Adds a column to a sprint. Titles are unique per sprint.
pub async fn create_column(
    store: &dyn DocumentStore,
    sprint_id: &str,
    title: ColumnTitle,
) -> StrideResult<BoardColumn> {
    let existing = columns::list_for_sprint(store, sprint_id).await?;
    if existing.iter().any(|c| c.title == title) {
        return Err(StrideError::validation(format!(
            "a \"{title}\" column already exists in this sprint"
        )));
    }

    let column = columns::create_column(store, sprint_id, title).await?;
    info!(sprint_id, column_id = %column.id, title = %column.title, "board column created");
    Ok(column)
}

/// Changes a column's title. The backlog column is immutable, and the new
/// title must not collide with another column in the same sprint.
pub async fn rename_column(
    store: &dyn DocumentStore,
    column_id: &str,
    new_title: ColumnTitle,
) -> StrideResult<BoardColumn> {
    let column = columns::get_column(store, column_id).await?;
    if column.title == ColumnTitle::Backlog {
        return Err(StrideError::validation("Backlog column cannot be renamed"));
    }
    if column.title == new_title {
        return Ok(column);
    }

    let siblings = columns::list_for_sprint(store, &column.sprint_id).await?;
    if siblings.iter().any(|c| c.id != column.id && c.title == new_title) {
        return Err(StrideError::validation(format!(
            "a \"{new_title}\" column already exists in this sprint"
        )));
    }

    columns::rename_column(store, column_id, new_title).await?;
    info!(column_id, title = %new_title, "board column renamed");
    columns::get_column(store, column_id).await
}

/// Removes a column and every task that lives in it. The backlog column is
/// protected. Tasks are deleted before the column so a partial failure leaves
/// stale order entries (which the reconcile sweep clears) rather than tasks
/// pointing at a column that no longer exists.
pub async fn delete_column(store: &dyn DocumentStore, column_id: &str) -> StrideResult<()> {
    let column = columns::get_column(store, column_id).await?;
    if column.title == ColumnTitle::Backlog {
        return Err(StrideError::validation("Backlog column cannot be deleted"));
    }

    let resident = tasks::list_for_column(store, column_id).await?;
    for task in &resident {
        tasks::delete_task(store, &task.id).await?;
    }
    columns::delete_column(store, column_id).await?;

    info!(
        column_id,
        sprint_id = %column.sprint_id,
        tasks_removed = resident.len(),
        "board column deleted"
    );
    Ok(())
}
