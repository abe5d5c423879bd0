//! Redis-backed document store.
//!
//! Each document lives in a hash at `stride:{collection}:{id}` with the
//! JSON body under a `data` field. Membership sets make reads scan-free:
//! `stride:{collection}:all` holds every id, and
//! `stride:{collection}:idx:{field}:{value}` holds the ids whose
//! top-level string/bool field equals that value, so equality filters
//! hit a set instead of the whole collection.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use async_trait::async_trait;

use crate::document::{ensure_doc_id, merge_patch, DocumentStore, Filter, Sort};
use crate::error::StrideResult;

/// Redis connection pool. ConnectionManager handles multiplexing
/// internally and is Clone, so callers clone it to get a mutable
/// handle for each operation.
pub type RedisPool = ConnectionManager;

/// Initialize a Redis connection pool from a URL.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_pool(redis_url: &str) -> StrideResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(manager)
}

/// Document store backed by Redis hashes and membership sets.
#[derive(Clone)]
pub struct RedisStore {
    pool: RedisPool,
    prefix: String,
}

impl RedisStore {
    pub fn new(pool: RedisPool) -> Self {
        Self::with_prefix(pool, "stride")
    }

    /// Use a custom key prefix (separate namespaces on a shared server).
    pub fn with_prefix(pool: RedisPool, prefix: &str) -> Self {
        Self {
            pool,
            prefix: prefix.to_string(),
        }
    }

    fn doc_key(&self, collection: &str, id: &str) -> String {
        doc_key(&self.prefix, collection, id)
    }

    fn all_key(&self, collection: &str) -> String {
        all_key(&self.prefix, collection)
    }

    fn index_key(&self, collection: &str, field: &str, value: &str) -> String {
        index_key(&self.prefix, collection, field, value)
    }

    async fn load(&self, collection: &str, id: &str) -> StrideResult<Option<Value>> {
        let mut conn = self.pool.clone();
        let json: Option<String> = conn.hget(self.doc_key(collection, id), "data").await?;
        match json {
            Some(j) => Ok(Some(serde_json::from_str(&j)?)),
            None => Ok(None),
        }
    }

    async fn write_doc(&self, collection: &str, id: &str, doc: &Value) -> StrideResult<()> {
        let mut conn = self.pool.clone();
        let key = self.doc_key(collection, id);
        conn.hset::<_, _, _, ()>(&key, "data", serde_json::to_string(doc)?)
            .await?;
        Ok(())
    }

    /// Candidate ids for a filter: the first indexable term's set, or
    /// the whole collection when no term is indexable.
    async fn candidate_ids(&self, collection: &str, filter: &Filter) -> StrideResult<Vec<String>> {
        let mut conn = self.pool.clone();
        for (field, value) in filter.terms() {
            if let Some(rendered) = index_value(value) {
                let ids: Vec<String> = conn
                    .smembers(self.index_key(collection, field, &rendered))
                    .await?;
                return Ok(ids);
            }
        }
        let ids: Vec<String> = conn.smembers(self.all_key(collection)).await?;
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> StrideResult<String> {
        let id = ensure_doc_id(&mut doc);
        self.write_doc(collection, &id, &doc).await?;
        let mut conn = self.pool.clone();
        conn.sadd::<_, _, ()>(self.all_key(collection), &id).await?;
        for (field, value) in indexable_fields(&doc) {
            conn.sadd::<_, _, ()>(self.index_key(collection, &field, &value), &id)
                .await?;
        }
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StrideResult<Option<Value>> {
        self.load(collection, id).await
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Filter,
        sort: Option<Sort>,
    ) -> StrideResult<Vec<Value>> {
        let ids = self.candidate_ids(collection, &filter).await?;
        let mut matched = Vec::new();
        for id in ids {
            if let Some(doc) = self.load(collection, &id).await? {
                if filter.matches(&doc) {
                    matched.push(doc);
                }
            }
        }
        if let Some(sort) = sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(matched)
    }

    async fn update_by_id(&self, collection: &str, id: &str, patch: Value) -> StrideResult<bool> {
        let Some(mut doc) = self.load(collection, id).await? else {
            return Ok(false);
        };
        let old_index = indexable_fields(&doc);
        merge_patch(&mut doc, &patch);
        let new_index = indexable_fields(&doc);

        let mut conn = self.pool.clone();
        for entry in old_index.iter().filter(|e| !new_index.contains(e)) {
            conn.srem::<_, _, ()>(self.index_key(collection, &entry.0, &entry.1), id)
                .await?;
        }
        for entry in new_index.iter().filter(|e| !old_index.contains(e)) {
            conn.sadd::<_, _, ()>(self.index_key(collection, &entry.0, &entry.1), id)
                .await?;
        }
        self.write_doc(collection, id, &doc).await?;
        Ok(true)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StrideResult<bool> {
        let Some(doc) = self.load(collection, id).await? else {
            return Ok(false);
        };
        let mut conn = self.pool.clone();
        for (field, value) in indexable_fields(&doc) {
            conn.srem::<_, _, ()>(self.index_key(collection, &field, &value), id)
                .await?;
        }
        conn.del::<_, ()>(self.doc_key(collection, id)).await?;
        conn.srem::<_, _, ()>(self.all_key(collection), id).await?;
        Ok(true)
    }
}

fn doc_key(prefix: &str, collection: &str, id: &str) -> String {
    format!("{}:{}:{}", prefix, collection, id)
}

fn all_key(prefix: &str, collection: &str) -> String {
    format!("{}:{}:all", prefix, collection)
}

fn index_key(prefix: &str, collection: &str, field: &str, value: &str) -> String {
    format!("{}:{}:idx:{}:{}", prefix, collection, field, value)
}

/// Render a field value for use in an index key. Only strings and
/// bools are indexed; numbers and structured values are filtered in
/// process instead.
fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn indexable_fields(doc: &Value) -> Vec<(String, String)> {
    let Some(obj) = doc.as_object() else {
        return Vec::new();
    };
    obj.iter()
        .filter(|(field, _)| *field != "id")
        .filter_map(|(field, value)| index_value(value).map(|v| (field.clone(), v)))
        .collect()
}
