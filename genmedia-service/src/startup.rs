use crate::config::{GenmediaConfig, ProviderBackend, StorageBackend};
use crate::handlers;
use crate::services::blob::{BlobStore, LocalBlobStore, MemoryBlobStore, MongoBlobStore};
use crate::services::providers::mock::MockProvider;
use crate::services::providers::stability::{StabilityConfig, StabilityProvider};
use crate::services::providers::GenerationProvider;
use crate::services::{
    ArtifactStore, EnvSecretProvider, GenerationLimiter, GenerationService, SecretProvider,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: GenmediaConfig,
    pub store: ArtifactStore,
    pub generator: GenerationService,
    pub secrets: Arc<dyn SecretProvider>,
}

impl AppState {
    /// Wire the configured blob backend and provider. Secrets come from the
    /// process environment.
    pub async fn from_config(config: &GenmediaConfig) -> Result<Self, AppError> {
        let backend = blob_backend(config).await?;
        let provider = provider(config)?;

        tracing::info!(
            storage = backend.name(),
            provider = provider.name(),
            max_concurrent_generations = config.limits.max_concurrent_generations,
            max_upload_bytes = config.max_upload_bytes(),
            "Service components initialized"
        );

        Ok(Self {
            config: config.clone(),
            store: ArtifactStore::new(backend),
            generator: GenerationService::new(
                provider,
                GenerationLimiter::new(config.limits.max_concurrent_generations),
                config.provider.timeout(),
            ),
            secrets: Arc::new(EnvSecretProvider),
        })
    }
}

async fn blob_backend(config: &GenmediaConfig) -> Result<Arc<dyn BlobStore>, AppError> {
    let storage = &config.storage;
    let backend: Arc<dyn BlobStore> = match storage.backend {
        StorageBackend::Memory => Arc::new(MemoryBlobStore::new()),
        StorageBackend::Local => Arc::new(
            LocalBlobStore::new(&storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        storage.local_path,
                        e
                    );
                    AppError::StorageError(e.into())
                })?,
        ),
        StorageBackend::Mongodb => Arc::new(
            MongoBlobStore::connect(
                &storage.mongodb.uri,
                &storage.mongodb.database,
                &storage.mongodb.collection,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                AppError::DatabaseError(e.into())
            })?,
        ),
    };
    Ok(backend)
}

fn provider(config: &GenmediaConfig) -> Result<Arc<dyn GenerationProvider>, AppError> {
    let provider: Arc<dyn GenerationProvider> = match config.provider.backend {
        ProviderBackend::Stability => Arc::new(StabilityProvider::new(StabilityConfig {
            api_host: config.provider.api_host.clone(),
            video_poll_interval: config.provider.video_poll_interval(),
        })?),
        ProviderBackend::Mock => {
            tracing::warn!("Using mock generation provider");
            Arc::new(MockProvider::new())
        }
    };
    Ok(provider)
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/ai-image-generation/generate", post(handlers::generate_images))
        .route("/ai-image-generation/edit-image", post(handlers::edit_image))
        .route("/ai-image-generation/images/:key", get(handlers::get_image))
        .route(
            "/ai-video-generation/generate-video",
            post(handlers::generate_video),
        )
        .route("/ai-video-generation/videos/:filename", get(handlers::get_video))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: GenmediaConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config).await?;
        Self::build_with_state(state).await
    }

    /// Bind and serve a prepared state. Port 0 picks a free port.
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, router(state.clone()));

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.state.store
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
