#![allow(dead_code)]

use genmedia_service::config::{
    GenmediaConfig, LimitsConfig, MongoConfig, ProviderBackend, ProviderConfig, StorageBackend,
    StorageConfig,
};
use genmedia_service::dtos::DEFAULT_ENGINE_ID;
use genmedia_service::services::blob::MemoryBlobStore;
use genmedia_service::services::providers::mock::MockProvider;
use genmedia_service::services::{
    ArtifactStore, GenerationLimiter, GenerationService, StaticSecretProvider,
};
use genmedia_service::startup::{AppState, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub const API_KEY_NAME: &str = "STABILITY_API_KEY";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockProvider>,
    pub blobs: Arc<MemoryBlobStore>,
    pub client: reqwest::Client,
}

pub fn test_config() -> GenmediaConfig {
    GenmediaConfig {
        common: CoreConfig { port: 0 },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            local_path: "target/test-storage".to_string(),
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "genmedia_test".to_string(),
                collection: "artifacts".to_string(),
            },
        },
        provider: ProviderConfig {
            backend: ProviderBackend::Mock,
            api_host: "http://127.0.0.1:9".to_string(),
            api_key_name: API_KEY_NAME.to_string(),
            default_engine_id: DEFAULT_ENGINE_ID.to_string(),
            timeout_secs: 5,
            video_poll_interval_ms: 10,
        },
        limits: LimitsConfig {
            max_concurrent_generations: 4,
            max_upload_bytes: 1024 * 1024,
        },
    }
}

impl TestApp {
    /// Memory storage, mock provider, and an API key that is present.
    pub async fn spawn() -> Self {
        Self::spawn_with(MockProvider::new(), true, Duration::from_secs(5)).await
    }

    pub async fn spawn_with(provider: MockProvider, with_api_key: bool, timeout: Duration) -> Self {
        let config = test_config();
        let provider = Arc::new(provider);
        let blobs = Arc::new(MemoryBlobStore::new());

        let mut secrets = StaticSecretProvider::new();
        if with_api_key {
            secrets = secrets.with(API_KEY_NAME, "sk-test");
        }

        let state = AppState {
            store: ArtifactStore::new(blobs.clone()),
            generator: GenerationService::new(
                provider.clone(),
                GenerationLimiter::new(config.limits.max_concurrent_generations),
                timeout,
            ),
            secrets: Arc::new(secrets),
            config,
        };

        let app = Application::build_with_state(state)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            provider,
            blobs,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
