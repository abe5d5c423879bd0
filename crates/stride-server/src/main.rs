//! Server binary: wires the configured store and blob backend into the
//! router and runs it.

use std::sync::Arc;

use stride_server::config::{ServerConfig, StoreBackend};
use stride_server::state::AppState;
use stride_store::{DocumentStore, FsBlobStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Redis => {
            let pool = stride_store::init_pool(&config.redis_url).await?;
            Arc::new(RedisStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };
    let blobs = FsBlobStore::new(config.blob_dir.clone(), config.max_upload_bytes).await?;

    let state = AppState::new(store, Arc::new(blobs));
    stride_server::run_server(state, &config.bind_addr).await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stride=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
