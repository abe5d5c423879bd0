//! Fakes shared by the service tests in this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use stride_store::blob_store::{BlobStore, StoredBlob};
use stride_store::document::{DocumentStore, Filter, Sort};
use stride_store::{StrideError, StrideResult};

use crate::events::ServerEvent;
use crate::registry::{Broadcaster, ConnId, RoomKey};

/// Records publishes instead of delivering them.
#[derive(Default)]
pub(crate) struct RecordingBroadcaster {
    published: Mutex<Vec<(RoomKey, Option<ConnId>, ServerEvent)>>,
}

impl RecordingBroadcaster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<(RoomKey, Option<ConnId>, ServerEvent)> {
        self.published.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn subscribe(&self, _conn: &ConnId, _room: RoomKey) {}

    fn unsubscribe(&self, _conn: &ConnId, _room: &RoomKey) {}

    fn unsubscribe_all(&self, _conn: &ConnId) {}

    fn publish(&self, room: &RoomKey, event: ServerEvent) {
        self.published
            .lock()
            .unwrap()
            .push((room.clone(), None, event));
    }

    fn publish_except(&self, room: &RoomKey, except: &ConnId, event: ServerEvent) {
        self.published
            .lock()
            .unwrap()
            .push((room.clone(), Some(except.clone()), event));
    }
}

/// Records uploads and deletes; can be told to fail deletes to
/// exercise the best-effort cleanup path.
#[derive(Default)]
pub(crate) struct RecordingBlobStore {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl RecordingBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub(crate) fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub(crate) fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn upload(&self, bytes: &[u8], folder: &str, name: &str) -> StrideResult<StoredBlob> {
        self.uploads
            .lock()
            .unwrap()
            .push((folder.to_string(), name.to_string(), bytes.to_vec()));
        let storage_id = format!("{}/{}", folder, name);
        Ok(StoredBlob {
            url: format!("/blobs/{}", storage_id),
            storage_id,
        })
    }

    async fn delete(&self, storage_id: &str) -> StrideResult<()> {
        self.deletes.lock().unwrap().push(storage_id.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StrideError::Blob("simulated blob outage".to_string()));
        }
        Ok(())
    }
}

/// Document store that fails every operation.
pub(crate) struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, _collection: &str, _doc: Value) -> StrideResult<String> {
        Err(StrideError::storage("injected insert failure"))
    }

    async fn find_by_id(&self, _collection: &str, _id: &str) -> StrideResult<Option<Value>> {
        Err(StrideError::storage("injected read failure"))
    }

    async fn find_many(
        &self,
        _collection: &str,
        _filter: Filter,
        _sort: Option<Sort>,
    ) -> StrideResult<Vec<Value>> {
        Err(StrideError::storage("injected read failure"))
    }

    async fn update_by_id(&self, _collection: &str, _id: &str, _patch: Value) -> StrideResult<bool> {
        Err(StrideError::storage("injected update failure"))
    }

    async fn delete_by_id(&self, _collection: &str, _id: &str) -> StrideResult<bool> {
        Err(StrideError::storage("injected delete failure"))
    }
}
