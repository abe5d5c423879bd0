//! Task lifecycle with column-order maintenance.
//!
//! Every task lives in exactly one column, and that column's `taskOrderIds`
//! must contain the task's id exactly once. All writes that affect placement
//! go through here so the order lists and the task documents stay in step.

use serde_json::{json, Map, Value};
use stride_store::collections::{columns, tasks};
use stride_store::models::{now_millis, ColumnTitle, Task};
use stride_store::{DocumentStore, StrideError, StrideResult};
use tracing::info;

pub async fn get_task(store: &dyn DocumentStore, task_id: &str) -> StrideResult<Task> {
    tasks::get_task(store, task_id).await
}

pub async fn list_sprint_tasks(
    store: &dyn DocumentStore,
    sprint_id: &str,
) -> StrideResult<Vec<Task>> {
    tasks::list_for_sprint(store, sprint_id).await
}

/// Creates a task and appends it to the end of its column's order list.
/// Without an explicit column the task lands in the sprint's backlog; a
/// sprint with no backlog column cannot accept unplaced tasks.
pub async fn create_task(
    store: &dyn DocumentStore,
    sprint_id: &str,
    title: &str,
    description: Option<&str>,
    story_points: i64,
    assignee_ids: &[String],
    board_column_id: Option<&str>,
) -> StrideResult<Task> {
    if title.trim().is_empty() {
        return Err(StrideError::validation("task title must not be empty"));
    }

    let target_column_id = match board_column_id {
        Some(column_id) => {
            let column = columns::get_column(store, column_id).await?;
            if column.sprint_id != sprint_id {
                return Err(StrideError::validation(
                    "column belongs to a different sprint",
                ));
            }
            column.id
        }
        None => {
            let sprint_columns = columns::list_for_sprint(store, sprint_id).await?;
            sprint_columns
                .into_iter()
                .find(|c| c.title == ColumnTitle::Backlog)
                .map(|c| c.id)
                .ok_or_else(|| StrideError::not_found("Backlog column", sprint_id))?
        }
    };

    let now = now_millis();
    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        sprint_id: sprint_id.to_string(),
        board_column_id: target_column_id.clone(),
        title: title.to_string(),
        description: description.map(str::to_string),
        story_points,
        assignee_ids: assignee_ids.to_vec(),
        comments: Vec::new(),
        attachments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    tasks::create_task(store, &task).await?;
    columns::append_task_id(store, &target_column_id, &task.id).await?;

    info!(task_id = %task.id, sprint_id, column_id = %target_column_id, "task created");
    Ok(task)
}

/// Moves a task to another column in the same sprint.
///
/// The id is removed from the source list before it is appended to the
/// destination, so an interrupted move leaves the task in no list (which the
/// reconcile sweep repairs) rather than in two. A source column that has
/// already been deleted is skipped; the task document is updated last.
pub async fn move_task(
    store: &dyn DocumentStore,
    task_id: &str,
    new_column_id: &str,
) -> StrideResult<Task> {
    let task = tasks::get_task(store, task_id).await?;
    if task.board_column_id == new_column_id {
        return Ok(task);
    }

    let new_column = columns::get_column(store, new_column_id).await?;
    if new_column.sprint_id != task.sprint_id {
        return Err(StrideError::validation(
            "column belongs to a different sprint",
        ));
    }

    match columns::remove_task_id(store, &task.board_column_id, task_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }
    columns::append_task_id(store, &new_column.id, task_id).await?;
    tasks::set_board_column(store, task_id, &new_column.id).await?;

    info!(
        task_id,
        from = %task.board_column_id,
        to = %new_column.id,
        "task moved"
    );
    tasks::get_task(store, task_id).await
}

/// Updates task fields that have no bearing on board placement.
pub async fn update_task(
    store: &dyn DocumentStore,
    task_id: &str,
    title: Option<&str>,
    description: Option<&str>,
    story_points: Option<i64>,
    assignee_ids: Option<&[String]>,
) -> StrideResult<Task> {
    let mut patch = Map::new();
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(StrideError::validation("task title must not be empty"));
        }
        patch.insert("title".to_string(), json!(title));
    }
    if let Some(description) = description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(points) = story_points {
        patch.insert("storyPoints".to_string(), json!(points));
    }
    if let Some(ids) = assignee_ids {
        patch.insert("assigneeIds".to_string(), json!(ids));
    }

    if !patch.is_empty() {
        tasks::update_task(store, task_id, Value::Object(patch)).await?;
    }
    tasks::get_task(store, task_id).await
}

/// Deletes a task, clearing it from its column's order list first. A column
/// that no longer exists is skipped.
pub async fn delete_task(store: &dyn DocumentStore, task_id: &str) -> StrideResult<()> {
    let task = tasks::get_task(store, task_id).await?;

    match columns::remove_task_id(store, &task.board_column_id, task_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }
    tasks::delete_task(store, task_id).await?;

    info!(task_id, column_id = %task.board_column_id, "task deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_store::models::BoardColumn;
    use stride_store::MemoryStore;

    async fn sprint_with_backlog_and_todo(store: &MemoryStore) -> (BoardColumn, BoardColumn) {
        let backlog = crate::columns::create_column(store, "s1", ColumnTitle::Backlog)
            .await
            .unwrap();
        let todo = crate::columns::create_column(store, "s1", ColumnTitle::Todo)
            .await
            .unwrap();
        (backlog, todo)
    }

    async fn order_of(store: &MemoryStore, column_id: &str) -> Vec<String> {
        columns::get_column(store, column_id)
            .await
            .unwrap()
            .task_order_ids
    }

    #[tokio::test]
    async fn creation_defaults_to_backlog_and_preserves_order() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;

        let t1 = create_task(&store, "s1", "first", None, 1, &[], None)
            .await
            .unwrap();
        let t2 = create_task(&store, "s1", "second", None, 2, &[], None)
            .await
            .unwrap();
        let t3 = create_task(&store, "s1", "third", None, 3, &[], None)
            .await
            .unwrap();

        assert_eq!(t1.board_column_id, backlog.id);
        assert_eq!(order_of(&store, &backlog.id).await, [t1.id, t2.id, t3.id]);
    }

    #[tokio::test]
    async fn creation_without_backlog_needs_an_explicit_column() {
        let store = MemoryStore::new();
        let todo = crate::columns::create_column(&store, "s1", ColumnTitle::Todo)
            .await
            .unwrap();

        let err = create_task(&store, "s1", "floating", None, 1, &[], None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let task = create_task(&store, "s1", "placed", None, 1, &[], Some(&todo.id))
            .await
            .unwrap();
        assert_eq!(order_of(&store, &todo.id).await, [task.id]);
    }

    #[tokio::test]
    async fn creation_rejects_a_column_from_another_sprint() {
        let store = MemoryStore::new();
        sprint_with_backlog_and_todo(&store).await;
        let foreign = crate::columns::create_column(&store, "s2", ColumnTitle::Todo)
            .await
            .unwrap();

        let err = create_task(&store, "s1", "lost", None, 1, &[], Some(&foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StrideError::Validation(_)));
        assert!(order_of(&store, &foreign.id).await.is_empty());
    }

    #[tokio::test]
    async fn moving_rewrites_both_order_lists() {
        let store = MemoryStore::new();
        let (backlog, todo) = sprint_with_backlog_and_todo(&store).await;

        let t1 = create_task(&store, "s1", "a", None, 1, &[], None)
            .await
            .unwrap();
        let t2 = create_task(&store, "s1", "b", None, 1, &[], None)
            .await
            .unwrap();
        let t3 = create_task(&store, "s1", "c", None, 1, &[], None)
            .await
            .unwrap();

        let moved = move_task(&store, &t2.id, &todo.id).await.unwrap();
        assert_eq!(moved.board_column_id, todo.id);
        assert_eq!(
            order_of(&store, &backlog.id).await,
            [t1.id.clone(), t3.id.clone()]
        );
        assert_eq!(order_of(&store, &todo.id).await, [t2.id]);

        delete_task(&store, &t1.id).await.unwrap();
        assert_eq!(order_of(&store, &backlog.id).await, [t3.id]);
    }

    #[tokio::test]
    async fn moving_to_the_current_column_changes_nothing() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;
        let task = create_task(&store, "s1", "still", None, 1, &[], None)
            .await
            .unwrap();

        let unchanged = move_task(&store, &task.id, &backlog.id).await.unwrap();
        assert_eq!(unchanged.board_column_id, backlog.id);
        assert_eq!(order_of(&store, &backlog.id).await, [task.id]);
    }

    #[tokio::test]
    async fn moving_to_an_unknown_column_fails_closed() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;
        let task = create_task(&store, "s1", "pinned", None, 1, &[], None)
            .await
            .unwrap();

        let err = move_task(&store, &task.id, "ghost").await.unwrap_err();
        assert!(err.is_not_found());

        // Nothing was touched: the id is still in its original list.
        assert_eq!(order_of(&store, &backlog.id).await, [task.id.clone()]);
        assert_eq!(
            get_task(&store, &task.id).await.unwrap().board_column_id,
            backlog.id
        );
    }

    #[tokio::test]
    async fn moving_tolerates_a_vanished_source_column() {
        let store = MemoryStore::new();
        let (backlog, todo) = sprint_with_backlog_and_todo(&store).await;
        let task = create_task(&store, "s1", "survivor", None, 1, &[], Some(&todo.id))
            .await
            .unwrap();

        // Drop the column document out from under the task.
        columns::delete_column(&store, &todo.id).await.unwrap();

        let moved = move_task(&store, &task.id, &backlog.id).await.unwrap();
        assert_eq!(moved.board_column_id, backlog.id);
        assert_eq!(order_of(&store, &backlog.id).await, [task.id]);
    }

    #[tokio::test]
    async fn cross_sprint_moves_are_rejected() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;
        let foreign = crate::columns::create_column(&store, "s2", ColumnTitle::Done)
            .await
            .unwrap();
        let task = create_task(&store, "s1", "homebound", None, 1, &[], None)
            .await
            .unwrap();

        let err = move_task(&store, &task.id, &foreign.id).await.unwrap_err();
        assert!(matches!(err, StrideError::Validation(_)));
        assert_eq!(order_of(&store, &backlog.id).await, [task.id]);
        assert!(order_of(&store, &foreign.id).await.is_empty());
    }

    #[tokio::test]
    async fn field_updates_leave_placement_alone() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;
        let task = create_task(&store, "s1", "draft", None, 1, &[], None)
            .await
            .unwrap();

        let updated = update_task(
            &store,
            &task.id,
            Some("final"),
            Some("ready for review"),
            Some(8),
            None,
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "final");
        assert_eq!(updated.story_points, 8);
        assert_eq!(updated.board_column_id, backlog.id);
        assert_eq!(order_of(&store, &backlog.id).await, [task.id]);
    }

    #[tokio::test]
    async fn deletion_clears_the_order_list_before_the_document() {
        let store = MemoryStore::new();
        let (backlog, _) = sprint_with_backlog_and_todo(&store).await;
        let keep = create_task(&store, "s1", "keep", None, 1, &[], None)
            .await
            .unwrap();
        let gone = create_task(&store, "s1", "gone", None, 1, &[], None)
            .await
            .unwrap();

        delete_task(&store, &gone.id).await.unwrap();

        assert_eq!(order_of(&store, &backlog.id).await, [keep.id]);
        assert!(get_task(&store, &gone.id).await.unwrap_err().is_not_found());
        assert!(delete_task(&store, &gone.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn every_task_sits_in_exactly_one_list_after_mixed_traffic() {
        let store = MemoryStore::new();
        let (backlog, todo) = sprint_with_backlog_and_todo(&store).await;
        let review = crate::columns::create_column(&store, "s1", ColumnTitle::Review)
            .await
            .unwrap();

        let mut ids = Vec::new();
        for n in 0..5 {
            let task = create_task(&store, "s1", &format!("task-{n}"), None, 1, &[], None)
                .await
                .unwrap();
            ids.push(task.id);
        }
        move_task(&store, &ids[1], &todo.id).await.unwrap();
        move_task(&store, &ids[3], &review.id).await.unwrap();
        move_task(&store, &ids[1], &review.id).await.unwrap();
        delete_task(&store, &ids[0]).await.unwrap();
        move_task(&store, &ids[4], &todo.id).await.unwrap();

        let live = list_sprint_tasks(&store, "s1").await.unwrap();
        for column_id in [&backlog.id, &todo.id, &review.id] {
            let order = order_of(&store, column_id).await;
            let resident: Vec<_> = live
                .iter()
                .filter(|t| &t.board_column_id == column_id)
                .map(|t| t.id.clone())
                .collect();
            for id in &order {
                assert_eq!(order.iter().filter(|o| o == &id).count(), 1);
                assert!(resident.contains(id));
            }
            assert_eq!(order.len(), resident.len());
        }
    }
}
