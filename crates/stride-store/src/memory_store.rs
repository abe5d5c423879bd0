//! In-memory document store.
//!
//! Backs tests and single-process deployments where Redis is not
//! available. Insertion order is preserved per collection so unsorted
//! reads behave like an append log.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::document::{ensure_doc_id, merge_patch, DocumentStore, Filter, Sort};
use crate::error::StrideResult;

/// Mutex-guarded map of collection name to ordered documents.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> StrideResult<String> {
        let id = ensure_doc_id(&mut doc);
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs.iter_mut().find(|(doc_id, _)| *doc_id == id) {
            existing.1 = doc;
        } else {
            docs.push((id.clone(), doc));
        }
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StrideResult<Option<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Filter,
        sort: Option<Sort>,
    ) -> StrideResult<Vec<Value>> {
        let collections = self.collections.lock().unwrap();
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default();
        if let Some(sort) = sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(matched)
    }

    async fn update_by_id(&self, collection: &str, id: &str, patch: Value) -> StrideResult<bool> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, doc)) => {
                merge_patch(doc, &patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StrideResult<bool> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);
        Ok(docs.len() < before)
    }
}
