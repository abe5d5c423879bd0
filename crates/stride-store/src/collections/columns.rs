//! Board column collection operations.

use serde_json::json;

use crate::document::{DocumentStore, Filter, Sort};
use crate::error::{StrideError, StrideResult};
use crate::models::{now_millis, BoardColumn, ColumnTitle};

const COLLECTION: &str = "board_columns";

/// Create a column with an empty order list.
pub async fn create_column(
    store: &dyn DocumentStore,
    sprint_id: &str,
    title: ColumnTitle,
) -> StrideResult<BoardColumn> {
    let now = now_millis();
    let column = BoardColumn {
        id: uuid::Uuid::new_v4().to_string(),
        sprint_id: sprint_id.to_string(),
        title,
        task_order_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store
        .insert(COLLECTION, serde_json::to_value(&column)?)
        .await?;
    Ok(column)
}

pub async fn get_column(store: &dyn DocumentStore, column_id: &str) -> StrideResult<BoardColumn> {
    let doc = store
        .find_by_id(COLLECTION, column_id)
        .await?
        .ok_or_else(|| StrideError::not_found("Column", column_id))?;
    Ok(serde_json::from_value(doc)?)
}

/// All columns of a sprint in creation order.
pub async fn list_for_sprint(
    store: &dyn DocumentStore,
    sprint_id: &str,
) -> StrideResult<Vec<BoardColumn>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("sprintId", sprint_id),
            Some(Sort::asc("createdAt")),
        )
        .await?;
    docs.into_iter()
        .map(|doc| Ok(serde_json::from_value(doc)?))
        .collect()
}

/// Append a task id to the end of a column's order list.
pub async fn append_task_id(
    store: &dyn DocumentStore,
    column_id: &str,
    task_id: &str,
) -> StrideResult<()> {
    let mut column = get_column(store, column_id).await?;
    column.task_order_ids.push(task_id.to_string());
    set_task_order(store, column_id, &column.task_order_ids).await
}

/// Remove a task id from a column's order list, filtering by value so
/// a stale list cannot leave the id behind.
pub async fn remove_task_id(
    store: &dyn DocumentStore,
    column_id: &str,
    task_id: &str,
) -> StrideResult<()> {
    let mut column = get_column(store, column_id).await?;
    column.task_order_ids.retain(|id| id != task_id);
    set_task_order(store, column_id, &column.task_order_ids).await
}

/// Overwrite a column's order list.
pub async fn set_task_order(
    store: &dyn DocumentStore,
    column_id: &str,
    task_ids: &[String],
) -> StrideResult<()> {
    let patch = json!({
        "taskOrderIds": task_ids,
        "updatedAt": now_millis(),
    });
    let updated = store.update_by_id(COLLECTION, column_id, patch).await?;
    if !updated {
        return Err(StrideError::not_found("Column", column_id));
    }
    Ok(())
}

pub async fn rename_column(
    store: &dyn DocumentStore,
    column_id: &str,
    title: ColumnTitle,
) -> StrideResult<()> {
    let patch = json!({
        "title": title,
        "updatedAt": now_millis(),
    });
    let updated = store.update_by_id(COLLECTION, column_id, patch).await?;
    if !updated {
        return Err(StrideError::not_found("Column", column_id));
    }
    Ok(())
}

pub async fn delete_column(store: &dyn DocumentStore, column_id: &str) -> StrideResult<()> {
    let deleted = store.delete_by_id(COLLECTION, column_id).await?;
    if !deleted {
        return Err(StrideError::not_found("Column", column_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    #[tokio::test]
    async fn append_and_remove_maintain_order() {
        let store = MemoryStore::new();
        let col = create_column(&store, "s1", ColumnTitle::Todo).await.unwrap();

        for id in ["t1", "t2", "t3"] {
            append_task_id(&store, &col.id, id).await.unwrap();
        }
        let col = get_column(&store, &col.id).await.unwrap();
        assert_eq!(col.task_order_ids, ["t1", "t2", "t3"]);

        remove_task_id(&store, &col.id, "t2").await.unwrap();
        let col = get_column(&store, &col.id).await.unwrap();
        assert_eq!(col.task_order_ids, ["t1", "t3"]);
    }

    #[tokio::test]
    async fn remove_filters_by_value_even_when_duplicated() {
        let store = MemoryStore::new();
        let col = create_column(&store, "s1", ColumnTitle::Todo).await.unwrap();
        set_task_order(
            &store,
            &col.id,
            &["t1".to_string(), "t2".to_string(), "t1".to_string()],
        )
        .await
        .unwrap();

        remove_task_id(&store, &col.id, "t1").await.unwrap();
        let col = get_column(&store, &col.id).await.unwrap();
        assert_eq!(col.task_order_ids, ["t2"]);
    }

    #[tokio::test]
    async fn sprint_listing_is_in_creation_order() {
        let store = MemoryStore::new();
        let a = create_column(&store, "s1", ColumnTitle::Backlog).await.unwrap();
        let b = create_column(&store, "s1", ColumnTitle::Todo).await.unwrap();
        create_column(&store, "other", ColumnTitle::Done).await.unwrap();

        let cols = list_for_sprint(&store, "s1").await.unwrap();
        let ids: Vec<_> = cols.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, [a.id.as_str(), b.id.as_str()]);
    }

    #[tokio::test]
    async fn mutations_on_unknown_column_are_not_found() {
        let store = MemoryStore::new();
        assert!(append_task_id(&store, "ghost", "t1")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(rename_column(&store, "ghost", ColumnTitle::Done)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(delete_column(&store, "ghost")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
