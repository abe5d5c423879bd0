//! Persisted document types shared across the workspace.
//!
//! Field names serialize in camelCase to match the wire format clients
//! already speak. Timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};

/// Body text a chat message is replaced with on soft delete.
pub const DELETED_MESSAGE_TEXT: &str = "This message has been deleted";

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ─────────────────────────── NOTIFICATIONS ────────────────────────────

/// Notification vocabulary. Closed set; unknown kinds are rejected at
/// the serde boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    ProjectInvitation,
    ProjectRoleChanged,
    ProjectMemberRemoved,
    ProjectMemberJoined,
    InvitationAccepted,
    MemberRoleChanged,
    MemberRemoved,
    SprintCreated,
    SprintStarted,
    SprintCompleted,
    SprintUpdated,
    SprintDeleted,
    TaskCreated,
    TaskAssigned,
    TaskUpdated,
    TaskDeleted,
    TaskMoved,
    TaskCommented,
}

/// A persisted notification. Exactly one of `user_id` / `project_id` /
/// `task_id` is populated; construction goes through the fan-out
/// service's target type, never by filling fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub is_read: bool,
    pub created_at: i64,
}

// ─────────────────────────────── CHAT ──────────────────────────────────

/// File metadata attached to a chat message. `storage_id` is the blob
/// store handle used to release the file when the message is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub file_size: u64,
    pub storage_id: String,
}

/// One entry in a chat room's message log. Sender display fields are
/// captured at send time; later profile edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_role: String,
    /// Empty string when the sender has no avatar, never null.
    pub sender_avatar_url: String,
    /// Empty string is valid when an attachment is present.
    pub message: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub timestamp: i64,
    pub is_deleted: bool,
}

/// Per-project chat room with an embedded append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    pub project_id: String,
    pub messages: Vec<ChatMessage>,
    /// Denormalized preview of the latest message for room listings.
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ─────────────────────────────── BOARD ─────────────────────────────────

/// Column title vocabulary. `Backlog` is special: default destination
/// for new tasks and protected from rename/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTitle {
    Backlog,
    Todo,
    InProcess,
    Review,
    Done,
}

impl ColumnTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProcess => "in_process",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    /// Parse a title, case-insensitively. Returns `None` for anything
    /// outside the vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "todo" => Some(Self::Todo),
            "in_process" => Some(Self::InProcess),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A board column within a sprint. `task_order_ids` is the only record
/// of intra-column ranking; every live task pointing at this column
/// appears in it exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub id: String,
    pub sprint_id: String,
    pub title: ColumnTitle,
    pub task_order_ids: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task. Belongs to exactly one column at a time; ranking within the
/// column lives on the column, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub sprint_id: String,
    pub board_column_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub story_points: i64,
    #[serde(default)]
    pub assignee_ids: Vec<String>,
    #[serde(default)]
    pub comments: Vec<TaskComment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A comment left on a task. Rides on the task document; the board
/// services read and write around it without touching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&NotificationKind::SprintStarted).unwrap();
        assert_eq!(json, "\"sprint_started\"");
        let back: NotificationKind = serde_json::from_str("\"task_moved\"").unwrap();
        assert_eq!(back, NotificationKind::TaskMoved);
    }

    #[test]
    fn unknown_notification_kind_is_rejected() {
        let res: Result<NotificationKind, _> = serde_json::from_str("\"task_exploded\"");
        assert!(res.is_err());
    }

    #[test]
    fn column_title_parse_is_case_insensitive() {
        assert_eq!(ColumnTitle::parse("Backlog"), Some(ColumnTitle::Backlog));
        assert_eq!(ColumnTitle::parse("IN_PROCESS"), Some(ColumnTitle::InProcess));
        assert_eq!(ColumnTitle::parse("doing"), None);
    }

    #[test]
    fn chat_message_serializes_camel_case() {
        let msg = ChatMessage {
            id: "m1".into(),
            sender_id: "u1".into(),
            sender_name: "Ana".into(),
            sender_role: "admin".into(),
            sender_avatar_url: String::new(),
            message: "hi".into(),
            attachment: None,
            timestamp: 1_700_000_000_000,
            is_deleted: false,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["senderId"], "u1");
        assert_eq!(v["isDeleted"], false);
        // empty avatar stays an empty string on the wire
        assert_eq!(v["senderAvatarUrl"], "");
    }

    #[test]
    fn attachment_round_trips_with_storage_id() {
        let att = Attachment {
            file_name: "report.pdf".into(),
            file_type: "application/pdf".into(),
            file_url: "/blobs/chat/abc_report.pdf".into(),
            file_size: 1234,
            storage_id: "chat/abc_report.pdf".into(),
        };
        let v = serde_json::to_value(&att).unwrap();
        assert_eq!(v["fileUrl"], "/blobs/chat/abc_report.pdf");
        let back: Attachment = serde_json::from_value(v).unwrap();
        assert_eq!(back, att);
    }
}
