//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_BLOB_DIR: &str = "./blobs";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which document store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Runtime settings. Everything is optional and falls back to a default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to (`STRIDE_BIND_ADDR`).
    pub bind_addr: String,
    /// Redis connection string (`REDIS_URL`).
    pub redis_url: String,
    /// Document store backend (`STRIDE_STORE`: `redis` or `memory`).
    pub store_backend: StoreBackend,
    /// Directory chat attachments are written to (`STRIDE_BLOB_DIR`).
    pub blob_dir: PathBuf,
    /// Upper bound for a single attachment (`STRIDE_MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("STRIDE_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            store_backend: parse_backend(env::var("STRIDE_STORE").ok().as_deref()),
            blob_dir: env::var("STRIDE_BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_BLOB_DIR)),
            max_upload_bytes: parse_max_upload(env::var("STRIDE_MAX_UPLOAD_BYTES").ok().as_deref()),
        }
    }
}

fn parse_backend(raw: Option<&str>) -> StoreBackend {
    match raw {
        None => StoreBackend::Redis,
        Some("redis") => StoreBackend::Redis,
        Some("memory") => StoreBackend::Memory,
        Some(other) => {
            warn!(value = other, "unknown STRIDE_STORE, falling back to redis");
            StoreBackend::Redis
        }
    }
}

fn parse_max_upload(raw: Option<&str>) -> usize {
    match raw {
        None => DEFAULT_MAX_UPLOAD_BYTES,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(value = raw, "invalid STRIDE_MAX_UPLOAD_BYTES, using default");
                DEFAULT_MAX_UPLOAD_BYTES
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing_defaults_to_redis() {
        assert_eq!(parse_backend(None), StoreBackend::Redis);
        assert_eq!(parse_backend(Some("redis")), StoreBackend::Redis);
        assert_eq!(parse_backend(Some("memory")), StoreBackend::Memory);
        assert_eq!(parse_backend(Some("postgres")), StoreBackend::Redis);
    }

    #[test]
    fn upload_limit_rejects_garbage_and_zero() {
        assert_eq!(parse_max_upload(Some("2048")), 2048);
        assert_eq!(parse_max_upload(Some("0")), DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(parse_max_upload(Some("lots")), DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(parse_max_upload(None), DEFAULT_MAX_UPLOAD_BYTES);
    }
}
