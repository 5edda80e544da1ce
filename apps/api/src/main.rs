mod applications;
mod auth;
mod blobs;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::applications::repository::ApplicationRepository;
use crate::auth::identity::RedisSessionResolver;
use crate::blobs::local::LocalObjectStore;
use crate::blobs::s3::S3ObjectStore;
use crate::blobs::ObjectStore;
use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgDocumentStore;
use crate::store::DocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobboard API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (migrations run on connect)
    let pool = create_pool(&config.database_url).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));

    // Redis sessions
    let redis = redis::Client::open(config.redis_url.clone())?;
    let identity = RedisSessionResolver::connect(redis, store.clone()).await?;
    info!("Redis session store connected");

    let blobs = build_object_store(&config.storage).await?;

    let state = AppState {
        applications: ApplicationRepository::new(store, blobs),
        identity: Arc::new(identity),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_object_store(storage: &StorageBackend) -> Result<Arc<dyn ObjectStore>> {
    match storage {
        StorageBackend::Local { uploads_dir } => {
            tokio::fs::create_dir_all(uploads_dir)
                .await
                .with_context(|| format!("creating uploads dir {}", uploads_dir.display()))?;
            info!("Storing documents under {}", uploads_dir.display());
            Ok(Arc::new(LocalObjectStore::new(uploads_dir.clone())))
        }
        StorageBackend::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => Ok(Arc::new(
            S3ObjectStore::connect(endpoint, access_key_id, secret_access_key, bucket).await,
        )),
    }
}
