use crate::dtos::DEFAULT_ENGINE_ID;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::time::Duration;

const DEFAULT_STABILITY_API_HOST: &str = "https://api.stability.ai";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_VIDEO_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 16;
/// 20MB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
/// MongoDB caps a document at 16MB; leave room for the key and metadata.
pub const MONGODB_MAX_BLOB_BYTES: usize = 15 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct GenmediaConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Local,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub backend: ProviderBackend,
    pub api_host: String,
    /// Name of the secret holding the provider API key, resolved per request.
    pub api_key_name: String,
    pub default_engine_id: String,
    pub timeout_secs: u64,
    pub video_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    Stability,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// 0 disables the limiter.
    pub max_concurrent_generations: usize,
    pub max_upload_bytes: usize,
}

impl GenmediaConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(GenmediaConfig {
            common: common_config,
            storage: StorageConfig {
                backend: get_env("STORAGE_BACKEND", Some("local"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
                mongodb: MongoConfig {
                    uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                    database: get_env("MONGODB_DATABASE", Some("genmedia_db"), is_prod)?,
                    collection: get_env("MONGODB_COLLECTION", Some("artifacts"), is_prod)?,
                },
            },
            provider: ProviderConfig {
                backend: get_env("PROVIDER_BACKEND", Some("stability"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                api_host: get_env("STABILITY_API_HOST", Some(DEFAULT_STABILITY_API_HOST), is_prod)?,
                api_key_name: get_env(
                    "STABILITY_API_KEY_NAME",
                    Some("STABILITY_API_KEY"),
                    is_prod,
                )?,
                default_engine_id: get_env("DEFAULT_ENGINE_ID", Some(DEFAULT_ENGINE_ID), is_prod)?,
                timeout_secs: get_env_parsed(
                    "PROVIDER_TIMEOUT_SECS",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                    is_prod,
                )?,
                video_poll_interval_ms: get_env_parsed(
                    "VIDEO_POLL_INTERVAL_MS",
                    DEFAULT_VIDEO_POLL_INTERVAL_MS,
                    is_prod,
                )?,
            },
            limits: LimitsConfig {
                max_concurrent_generations: get_env_parsed(
                    "MAX_CONCURRENT_GENERATIONS",
                    DEFAULT_MAX_CONCURRENT_GENERATIONS,
                    is_prod,
                )?,
                max_upload_bytes: get_env_parsed(
                    "MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                    is_prod,
                )?,
            },
        })
    }
}

impl GenmediaConfig {
    /// Request body limit. Lowered to what one MongoDB document can hold when
    /// that backend is selected.
    pub fn max_upload_bytes(&self) -> usize {
        match self.storage.backend {
            StorageBackend::Mongodb => self.limits.max_upload_bytes.min(MONGODB_MAX_BLOB_BYTES),
            _ => self.limits.max_upload_bytes,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_millis(self.video_poll_interval_ms)
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "local" => Ok(StorageBackend::Local),
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl std::str::FromStr for ProviderBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stability" => Ok(ProviderBackend::Stability),
            "mock" => Ok(ProviderBackend::Mock),
            _ => Err(format!("Invalid provider backend: {}", s)),
        }
    }
}
