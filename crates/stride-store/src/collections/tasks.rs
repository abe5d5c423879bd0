//! Task collection operations.

use serde_json::{json, Value};

use crate::document::{DocumentStore, Filter, Sort};
use crate::error::{StrideError, StrideResult};
use crate::models::{now_millis, Task};

const COLLECTION: &str = "tasks";

pub async fn create_task(store: &dyn DocumentStore, task: &Task) -> StrideResult<String> {
    store.insert(COLLECTION, serde_json::to_value(task)?).await
}

pub async fn get_task(store: &dyn DocumentStore, task_id: &str) -> StrideResult<Task> {
    let doc = store
        .find_by_id(COLLECTION, task_id)
        .await?
        .ok_or_else(|| StrideError::not_found("Task", task_id))?;
    Ok(serde_json::from_value(doc)?)
}

pub async fn list_for_sprint(
    store: &dyn DocumentStore,
    sprint_id: &str,
) -> StrideResult<Vec<Task>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("sprintId", sprint_id),
            Some(Sort::asc("createdAt")),
        )
        .await?;
    decode_all(docs)
}

pub async fn list_for_column(
    store: &dyn DocumentStore,
    column_id: &str,
) -> StrideResult<Vec<Task>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("boardColumnId", column_id),
            Some(Sort::asc("createdAt")),
        )
        .await?;
    decode_all(docs)
}

/// Merge a field patch into a task, refreshing `updatedAt`.
pub async fn update_task(
    store: &dyn DocumentStore,
    task_id: &str,
    mut patch: Value,
) -> StrideResult<()> {
    if let Some(obj) = patch.as_object_mut() {
        obj.insert("updatedAt".to_string(), json!(now_millis()));
    }
    let updated = store.update_by_id(COLLECTION, task_id, patch).await?;
    if !updated {
        return Err(StrideError::not_found("Task", task_id));
    }
    Ok(())
}

/// Point a task at a different column. Order-list maintenance is the
/// caller's job.
pub async fn set_board_column(
    store: &dyn DocumentStore,
    task_id: &str,
    column_id: &str,
) -> StrideResult<()> {
    update_task(store, task_id, json!({ "boardColumnId": column_id })).await
}

pub async fn delete_task(store: &dyn DocumentStore, task_id: &str) -> StrideResult<()> {
    let deleted = store.delete_by_id(COLLECTION, task_id).await?;
    if !deleted {
        return Err(StrideError::not_found("Task", task_id));
    }
    Ok(())
}

fn decode_all(docs: Vec<Value>) -> StrideResult<Vec<Task>> {
    docs.into_iter()
        .map(|doc| Ok(serde_json::from_value(doc)?))
        .collect()
}
