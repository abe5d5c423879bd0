//! Notification fan-out: persist first, then broadcast.
//!
//! The insert is the durable record; the publish is a convenience push
//! to whoever is connected right now. A failed publish never rolls the
//! insert back, and a missed push is recoverable through the history
//! reads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use stride_store::collections::notifications;
use stride_store::models::{now_millis, Notification, NotificationKind};
use stride_store::{DocumentStore, StrideResult};

use crate::events::ServerEvent;
use crate::registry::{Broadcaster, RoomKey};

/// Logical recipient of a notification. Exactly one reference exists
/// by construction; the persisted document mirrors the chosen variant
/// into its optional id fields. On the wire it is externally tagged:
/// `{"user": "u-1"}`, `{"project": "p-1"}` or `{"task": "t-1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyTarget {
    User(String),
    Project(String),
    Task(String),
}

impl NotifyTarget {
    fn room_key(&self) -> RoomKey {
        match self {
            Self::User(id) => RoomKey::user(id),
            Self::Project(id) => RoomKey::project(id),
            Self::Task(id) => RoomKey::task(id),
        }
    }
}

/// Persists notifications and pushes them into the matching room.
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// Create a notification for `target` and broadcast it to the
    /// target's room.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        target: NotifyTarget,
    ) -> StrideResult<Notification> {
        let mut notification = Notification {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            user_id: None,
            project_id: None,
            task_id: None,
            is_read: false,
            created_at: now_millis(),
        };
        match &target {
            NotifyTarget::User(id) => notification.user_id = Some(id.clone()),
            NotifyTarget::Project(id) => notification.project_id = Some(id.clone()),
            NotifyTarget::Task(id) => notification.task_id = Some(id.clone()),
        }

        notifications::create_notification(self.store.as_ref(), &notification).await?;

        let room = target.room_key();
        let event = match &target {
            NotifyTarget::User(_) => ServerEvent::UserNotification(notification.clone()),
            NotifyTarget::Project(_) => ServerEvent::ProjectNotification(notification.clone()),
            NotifyTarget::Task(_) => ServerEvent::TaskNotification(notification.clone()),
        };
        self.broadcaster.publish(&room, event);

        info!(kind = ?kind, room = %room, "notification dispatched");
        Ok(notification)
    }

    /// Newest-first history for a user, capped to the most recent
    /// entries.
    pub async fn user_notifications(&self, user_id: &str) -> StrideResult<Vec<Notification>> {
        notifications::list_for_user(self.store.as_ref(), user_id).await
    }

    pub async fn project_notifications(&self, project_id: &str) -> StrideResult<Vec<Notification>> {
        notifications::list_for_project(self.store.as_ref(), project_id).await
    }

    pub async fn task_notifications(&self, task_id: &str) -> StrideResult<Vec<Notification>> {
        notifications::list_for_task(self.store.as_ref(), task_id).await
    }

    /// Mark one notification read. No broadcast.
    pub async fn mark_read(&self, notification_id: &str) -> StrideResult<Notification> {
        notifications::mark_read(self.store.as_ref(), notification_id).await
    }

    /// Mark all of a user's unread notifications read. Returns the
    /// number flipped.
    pub async fn mark_all_read(&self, user_id: &str) -> StrideResult<usize> {
        notifications::mark_all_read(self.store.as_ref(), user_id).await
    }
}
