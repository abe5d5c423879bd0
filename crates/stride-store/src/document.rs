//! Narrow document-store interface the services persist through.
//!
//! Documents are JSON values at this boundary; the typed wrappers in
//! [`crate::collections`] handle (de)serialization per document type.
//! Filters are top-level field equality only; that covers the access
//! patterns this system has and every backend can implement it.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::StrideResult;

/// Field-equality filter over top-level document fields. All terms
/// must match.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    terms: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality term.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.terms.push((field.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, Value)] {
        &self.terms
    }

    /// True when every term equals the document's top-level field.
    /// A missing field never matches.
    pub fn matches(&self, doc: &Value) -> bool {
        self.terms
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Single-field sort. Numbers compare numerically, strings
/// lexicographically; documents missing the field sort first.
#[derive(Debug, Clone)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }

    /// Comparator for two documents under this sort.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                x.cmp(&y)
            } else if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            } else if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
                x.cmp(y)
            } else {
                Ordering::Equal
            }
        }
    }
}

/// Document persistence boundary. Backends: [`crate::redis_store::RedisStore`]
/// and [`crate::memory_store::MemoryStore`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. The id is taken from the document's `id`
    /// field; a missing id gets a fresh uuid written into the document.
    /// Returns the id.
    async fn insert(&self, collection: &str, doc: Value) -> StrideResult<String>;

    /// Fetch one document by id.
    async fn find_by_id(&self, collection: &str, id: &str) -> StrideResult<Option<Value>>;

    /// Fetch all documents matching `filter`, sorted when `sort` is
    /// given (otherwise insertion order is not guaranteed).
    async fn find_many(
        &self,
        collection: &str,
        filter: Filter,
        sort: Option<Sort>,
    ) -> StrideResult<Vec<Value>>;

    /// Merge `patch`'s top-level fields into the stored document.
    /// Returns false when the id is unknown.
    async fn update_by_id(&self, collection: &str, id: &str, patch: Value) -> StrideResult<bool>;

    /// Delete a document. Returns false when the id is unknown.
    async fn delete_by_id(&self, collection: &str, id: &str) -> StrideResult<bool>;
}

/// Read a document's `id` field, generating and injecting a uuid when
/// absent. Shared by backends so both honor the same insert contract.
pub(crate) fn ensure_doc_id(doc: &mut Value) -> String {
    if let Some(id) = doc.get("id").and_then(Value::as_str) {
        return id.to_string();
    }
    let id = uuid::Uuid::new_v4().to_string();
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("id".to_string(), Value::String(id.clone()));
    }
    id
}

/// Merge `patch`'s top-level fields into `doc` in place.
pub(crate) fn merge_patch(doc: &mut Value, patch: &Value) {
    if let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_terms() {
        let doc = json!({"userId": "u1", "isRead": false, "createdAt": 5});
        assert!(Filter::new().eq("userId", "u1").matches(&doc));
        assert!(Filter::new().eq("userId", "u1").eq("isRead", false).matches(&doc));
        assert!(!Filter::new().eq("userId", "u2").matches(&doc));
        assert!(!Filter::new().eq("projectId", "p1").matches(&doc));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&json!({"anything": 1})));
    }

    #[test]
    fn sort_desc_puts_newest_first() {
        let mut docs = vec![
            json!({"id": "a", "createdAt": 10}),
            json!({"id": "b", "createdAt": 30}),
            json!({"id": "c", "createdAt": 20}),
        ];
        let sort = Sort::desc("createdAt");
        docs.sort_by(|a, b| sort.compare(a, b));
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn missing_sort_field_sorts_first_ascending() {
        let mut docs = vec![json!({"id": "a", "t": 1}), json!({"id": "b"})];
        let sort = Sort::asc("t");
        docs.sort_by(|a, b| sort.compare(a, b));
        assert_eq!(docs[0]["id"], "b");
    }

    #[test]
    fn merge_patch_overwrites_only_named_fields() {
        let mut doc = json!({"id": "x", "title": "old", "isRead": false});
        merge_patch(&mut doc, &json!({"isRead": true}));
        assert_eq!(doc, json!({"id": "x", "title": "old", "isRead": true}));
    }

    #[test]
    fn ensure_doc_id_generates_when_absent() {
        let mut doc = json!({"title": "t"});
        let id = ensure_doc_id(&mut doc);
        assert_eq!(doc["id"].as_str().unwrap(), id);
        // an existing id is kept
        let mut doc = json!({"id": "fixed"});
        assert_eq!(ensure_doc_id(&mut doc), "fixed");
    }
}
