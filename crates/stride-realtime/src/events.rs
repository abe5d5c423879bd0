//! Wire event types for the WebSocket boundary.
//!
//! Tagged `{"type": ..., "data": ...}` envelopes; event names are
//! snake_case, payload fields camelCase.

use serde::{Deserialize, Serialize};
use stride_store::models::{ChatMessage, Notification};

/// Base64-encoded file riding along a `send_message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub base64: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Payload of a `send_message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: String,
    #[serde(default)]
    pub sender_avatar_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file: Option<FilePayload>,
}

/// Events a client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinUserRoom { id: String },
    JoinProjectRoom { id: String },
    JoinTaskRoom { id: String },
    JoinChatRoom { room_id: String },
    LeaveChatRoom { room_id: String },
    SendMessage(SendMessagePayload),
    DeleteMessage { room_id: String, message_id: String },
    Typing { room_id: String, user_id: String, user_name: String },
    StopTyping { room_id: String, user_id: String },
    MarkRead { notification_id: String },
    MarkAllRead { user_id: String },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerEvent {
    UserNotification(Notification),
    ProjectNotification(Notification),
    TaskNotification(Notification),
    NewMessage(ChatMessage),
    MessageDeleted { room_id: String, message_id: String },
    UserTyping { user_id: String, user_name: String },
    UserStopTyping { user_id: String },
    /// Error acknowledgment, delivered only to the originating connection.
    Error { message: String },
}
