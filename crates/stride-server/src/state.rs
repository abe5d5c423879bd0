//! Application state.

use std::sync::Arc;

use stride_realtime::{Broadcaster, ChatService, NotificationService, RoomRegistry};
use stride_store::{BlobStore, DocumentStore};

/// State shared across handlers. Cloning is cheap; everything inside is
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<RoomRegistry>,
    pub notifications: Arc<NotificationService>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let broadcaster: Arc<dyn Broadcaster> = registry.clone();
        let notifications = Arc::new(NotificationService::new(store.clone(), broadcaster.clone()));
        let chat = Arc::new(ChatService::new(store.clone(), blobs, broadcaster));

        Self {
            store,
            registry,
            notifications,
            chat,
        }
    }
}
