//! Notification collection operations.

use serde_json::json;

use crate::document::{DocumentStore, Filter, Sort};
use crate::error::{StrideError, StrideResult};
use crate::models::Notification;

const COLLECTION: &str = "notifications";

/// A user's history view is capped to the most recent entries.
pub const USER_HISTORY_LIMIT: usize = 50;

pub async fn create_notification(
    store: &dyn DocumentStore,
    notification: &Notification,
) -> StrideResult<String> {
    store
        .insert(COLLECTION, serde_json::to_value(notification)?)
        .await
}

pub async fn get_notification(
    store: &dyn DocumentStore,
    id: &str,
) -> StrideResult<Notification> {
    let doc = store
        .find_by_id(COLLECTION, id)
        .await?
        .ok_or_else(|| StrideError::not_found("Notification", id))?;
    Ok(serde_json::from_value(doc)?)
}

/// Newest-first history for a user, capped at [`USER_HISTORY_LIMIT`].
pub async fn list_for_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> StrideResult<Vec<Notification>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("userId", user_id),
            Some(Sort::desc("createdAt")),
        )
        .await?;
    let mut notifications = decode_all(docs)?;
    notifications.truncate(USER_HISTORY_LIMIT);
    Ok(notifications)
}

pub async fn list_for_project(
    store: &dyn DocumentStore,
    project_id: &str,
) -> StrideResult<Vec<Notification>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("projectId", project_id),
            Some(Sort::desc("createdAt")),
        )
        .await?;
    decode_all(docs)
}

pub async fn list_for_task(
    store: &dyn DocumentStore,
    task_id: &str,
) -> StrideResult<Vec<Notification>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("taskId", task_id),
            Some(Sort::desc("createdAt")),
        )
        .await?;
    decode_all(docs)
}

/// Mark one notification read. Returns the updated record.
pub async fn mark_read(store: &dyn DocumentStore, id: &str) -> StrideResult<Notification> {
    let updated = store
        .update_by_id(COLLECTION, id, json!({ "isRead": true }))
        .await?;
    if !updated {
        return Err(StrideError::not_found("Notification", id));
    }
    get_notification(store, id).await
}

/// Mark every unread notification of a user read. Returns how many
/// were flipped.
pub async fn mark_all_read(store: &dyn DocumentStore, user_id: &str) -> StrideResult<usize> {
    let unread = store
        .find_many(
            COLLECTION,
            Filter::new().eq("userId", user_id).eq("isRead", false),
            None,
        )
        .await?;
    let mut count = 0;
    for doc in &unread {
        if let Some(id) = doc.get("id").and_then(|v| v.as_str()) {
            if store
                .update_by_id(COLLECTION, id, json!({ "isRead": true }))
                .await?
            {
                count += 1;
            }
        }
    }
    Ok(count)
}

fn decode_all(docs: Vec<serde_json::Value>) -> StrideResult<Vec<Notification>> {
    docs.into_iter()
        .map(|doc| Ok(serde_json::from_value(doc)?))
        .collect()
}
