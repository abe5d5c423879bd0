//! Chat room collection operations.
//!
//! Rooms embed their message log; mutations are read-modify-write on
//! the room document, which is the unit of consistency for a room.

use serde_json::json;

use crate::document::{DocumentStore, Filter};
use crate::error::{StrideError, StrideResult};
use crate::models::{now_millis, Attachment, ChatMessage, ChatRoom, DELETED_MESSAGE_TEXT};

const COLLECTION: &str = "chat_rooms";

pub async fn get_room(store: &dyn DocumentStore, room_id: &str) -> StrideResult<ChatRoom> {
    let doc = store
        .find_by_id(COLLECTION, room_id)
        .await?
        .ok_or_else(|| StrideError::not_found("Chat room", room_id))?;
    Ok(serde_json::from_value(doc)?)
}

pub async fn find_room_by_project(
    store: &dyn DocumentStore,
    project_id: &str,
) -> StrideResult<Option<ChatRoom>> {
    let docs = store
        .find_many(
            COLLECTION,
            Filter::new().eq("projectId", project_id),
            None,
        )
        .await?;
    match docs.into_iter().next() {
        Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
        None => Ok(None),
    }
}

/// Create an empty room for a project.
pub async fn create_room(store: &dyn DocumentStore, project_id: &str) -> StrideResult<ChatRoom> {
    let now = now_millis();
    let room = ChatRoom {
        id: uuid::Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        messages: Vec::new(),
        last_message: String::new(),
        last_message_time: None,
        created_at: now,
        updated_at: now,
    };
    store.insert(COLLECTION, serde_json::to_value(&room)?).await?;
    Ok(room)
}

/// Append a message to the room's log and refresh the denormalized
/// `lastMessage` preview.
pub async fn append_message(
    store: &dyn DocumentStore,
    room_id: &str,
    message: &ChatMessage,
) -> StrideResult<()> {
    let mut room = get_room(store, room_id).await?;
    room.messages.push(message.clone());
    let patch = json!({
        "messages": room.messages,
        "lastMessage": message.message,
        "lastMessageTime": message.timestamp,
        "updatedAt": now_millis(),
    });
    store.update_by_id(COLLECTION, room_id, patch).await?;
    Ok(())
}

/// Soft-delete a message in place: flag set, body replaced with the
/// placeholder, attachment cleared. The slot keeps its log position.
/// Returns the updated message and the attachment it carried, so the
/// caller can release the blob from the same snapshot that was written.
pub async fn soft_delete_message(
    store: &dyn DocumentStore,
    room_id: &str,
    message_id: &str,
) -> StrideResult<(ChatMessage, Option<Attachment>)> {
    let mut room = get_room(store, room_id).await?;
    let message = room
        .messages
        .iter_mut()
        .find(|m| m.id == message_id)
        .ok_or_else(|| StrideError::not_found("Message", message_id))?;
    let attachment = message.attachment.take();
    message.is_deleted = true;
    message.message = DELETED_MESSAGE_TEXT.to_string();
    let updated = message.clone();

    let patch = json!({
        "messages": room.messages,
        "updatedAt": now_millis(),
    });
    store.update_by_id(COLLECTION, room_id, patch).await?;
    Ok((updated, attachment))
}

/// Hard-delete a room. Returns the room as it was, so the caller can
/// release any attachment blobs it still referenced.
pub async fn delete_room(store: &dyn DocumentStore, room_id: &str) -> StrideResult<ChatRoom> {
    let room = get_room(store, room_id).await?;
    store.delete_by_id(COLLECTION, room_id).await?;
    Ok(room)
}
