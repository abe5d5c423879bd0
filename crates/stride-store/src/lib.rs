//! Stride Storage Layer
//!
//! Document and blob persistence behind narrow traits, with Redis and
//! in-memory document backends and a filesystem blob backend.

pub mod blob_store;
pub mod collections;
pub mod document;
pub mod error;
pub mod memory_store;
pub mod models;
pub mod redis_store;

pub use blob_store::{BlobStore, FsBlobStore, StoredBlob};
pub use document::{DocumentStore, Filter, Sort, SortOrder};
pub use error::{StrideError, StrideResult};
pub use memory_store::MemoryStore;
pub use redis_store::{init_pool, RedisPool, RedisStore};
