//! Chat room service: message lifecycle plus presence signals.
//!
//! Messages append to the room's log in send order as committed by the
//! store; that commit order is the room's message order. Typing events
//! are never persisted.

use std::sync::Arc;

use base64::Engine;
use tracing::{info, warn};

use stride_store::blob_store::BlobStore;
use stride_store::collections::chats;
use stride_store::models::{now_millis, Attachment, ChatMessage, ChatRoom};
use stride_store::{DocumentStore, StrideError, StrideResult};

use crate::events::{FilePayload, SendMessagePayload, ServerEvent};
use crate::registry::{Broadcaster, ConnId, RoomKey};

/// Blob store folder attachments are uploaded into.
const ATTACHMENT_FOLDER: &str = "chat";

pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            store,
            blobs,
            broadcaster,
        }
    }

    /// Fetch a project's chat room, creating it on first access.
    pub async fn room_for_project(&self, project_id: &str) -> StrideResult<ChatRoom> {
        if let Some(room) = chats::find_room_by_project(self.store.as_ref(), project_id).await? {
            return Ok(room);
        }
        let room = chats::create_room(self.store.as_ref(), project_id).await?;
        info!(project_id, room_id = %room.id, "chat room created");
        Ok(room)
    }

    /// Validate, persist and broadcast a new message. A message must
    /// carry text or a file; an attached file is uploaded to the blob
    /// store before anything is persisted.
    pub async fn send_message(&self, payload: SendMessagePayload) -> StrideResult<ChatMessage> {
        let SendMessagePayload {
            room_id,
            sender_id,
            sender_name,
            sender_role,
            sender_avatar_url,
            message,
            file,
        } = payload;

        if room_id.is_empty() || sender_id.is_empty() || sender_name.is_empty() {
            return Err(StrideError::validation(
                "roomId, senderId and senderName are required",
            ));
        }
        let body = message.unwrap_or_default();
        if body.is_empty() && file.is_none() {
            return Err(StrideError::validation("message text or file is required"));
        }

        // The room must exist before the attachment bytes hit the blob
        // store, or a rejected send would strand an orphan file.
        chats::get_room(self.store.as_ref(), &room_id).await?;

        let attachment = match file {
            Some(file) => Some(self.upload_attachment(file).await?),
            None => None,
        };

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id,
            sender_name,
            sender_role,
            sender_avatar_url: sender_avatar_url.unwrap_or_default(),
            message: body,
            attachment,
            timestamp: now_millis(),
            is_deleted: false,
        };

        chats::append_message(self.store.as_ref(), &room_id, &message).await?;
        self.broadcaster.publish(
            &RoomKey::chat(&room_id),
            ServerEvent::NewMessage(message.clone()),
        );
        Ok(message)
    }

    async fn upload_attachment(&self, file: FilePayload) -> StrideResult<Attachment> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(file.base64.as_bytes())
            .map_err(|e| StrideError::validation(format!("invalid base64 file payload: {}", e)))?;
        let stored = self
            .blobs
            .upload(&bytes, ATTACHMENT_FOLDER, &file.file_name)
            .await?;
        Ok(Attachment {
            file_name: file.file_name,
            file_type: file.file_type,
            file_url: stored.url,
            file_size: bytes.len() as u64,
            storage_id: stored.storage_id,
        })
    }

    /// Soft-delete a message: the slot keeps its position, the body
    /// becomes the placeholder, the attachment (if any) is released.
    pub async fn delete_message(
        &self,
        room_id: &str,
        message_id: &str,
    ) -> StrideResult<ChatMessage> {
        // One read-modify-write; the attachment comes back from the same
        // snapshot that was persisted, so the release cannot act on a
        // different version of the message.
        let (deleted, attachment) =
            chats::soft_delete_message(self.store.as_ref(), room_id, message_id).await?;

        if let Some(attachment) = &attachment {
            // A stuck blob must not block the logical delete.
            if let Err(e) = self.blobs.delete(&attachment.storage_id).await {
                warn!(room_id, message_id, error = %e, "failed to release attachment blob");
            }
        }

        self.broadcaster.publish(
            &RoomKey::chat(room_id),
            ServerEvent::MessageDeleted {
                room_id: room_id.to_string(),
                message_id: message_id.to_string(),
            },
        );
        Ok(deleted)
    }

    /// Hard-delete a room and release every attachment it still held.
    pub async fn delete_room(&self, room_id: &str) -> StrideResult<()> {
        let room = chats::delete_room(self.store.as_ref(), room_id).await?;
        for message in &room.messages {
            if let Some(attachment) = &message.attachment {
                if let Err(e) = self.blobs.delete(&attachment.storage_id).await {
                    warn!(room_id, message_id = %message.id, error = %e,
                        "failed to release attachment blob");
                }
            }
        }
        info!(room_id, messages = room.messages.len(), "chat room deleted");
        Ok(())
    }

    pub fn join(&self, conn: &ConnId, room_id: &str) {
        self.broadcaster.subscribe(conn, RoomKey::chat(room_id));
    }

    pub fn leave(&self, conn: &ConnId, room_id: &str) {
        self.broadcaster.unsubscribe(conn, &RoomKey::chat(room_id));
    }

    /// Ephemeral presence signal to everyone in the room except the
    /// typist.
    pub fn typing(&self, conn: &ConnId, room_id: &str, user_id: &str, user_name: &str) {
        self.broadcaster.publish_except(
            &RoomKey::chat(room_id),
            conn,
            ServerEvent::UserTyping {
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
            },
        );
    }

    pub fn stop_typing(&self, conn: &ConnId, room_id: &str, user_id: &str) {
        self.broadcaster.publish_except(
            &RoomKey::chat(room_id),
            conn,
            ServerEvent::UserStopTyping {
                user_id: user_id.to_string(),
            },
        );
    }
}
