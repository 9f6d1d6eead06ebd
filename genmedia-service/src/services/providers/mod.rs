//! Generative provider abstraction and implementations.
//!
//! Handlers talk to a [`GenerationProvider`] trait object, so the vendor
//! binding (Stability, mock) can be swapped without touching storage.

pub mod mock;
pub mod stability;

use crate::models::Artifact;
use async_trait::async_trait;
use secrecy::SecretString;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider did not answer within {0} seconds")]
    Timeout(u64),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            ProviderError::InvalidRequest(msg) => {
                AppError::BadRequest(anyhow::anyhow!("Provider rejected request: {}", msg))
            }
            ProviderError::RateLimited => {
                AppError::TooManyRequests("Provider rate limit exceeded".to_string(), None)
            }
            ProviderError::ApiError(msg) | ProviderError::NetworkError(msg) => {
                AppError::BadGateway(msg)
            }
            ProviderError::Timeout(secs) => {
                AppError::GatewayTimeout(format!("provider did not answer within {}s", secs))
            }
        }
    }
}

/// Text-to-image parameters.
#[derive(Debug, Clone)]
pub struct TextToImage {
    pub engine_id: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    /// `None` lets the provider pick.
    pub seed: Option<u32>,
}

/// Image-to-image parameters.
#[derive(Debug, Clone)]
pub struct ImageToImage {
    pub engine_id: String,
    pub prompt: String,
    pub init_image: Vec<u8>,
    /// Prompt influence: 0.0 keeps the init image, 1.0 follows the prompt.
    pub image_strength: f32,
    pub samples: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub seed: Option<u32>,
}

/// Image-to-video parameters.
#[derive(Debug, Clone)]
pub struct ImageToVideo {
    pub init_image: Vec<u8>,
    pub seed: u32,
    pub cfg_scale: f32,
    /// 1..=255, higher means more motion.
    pub motion_bucket_id: u32,
}

#[derive(Debug, Clone)]
pub enum GenerationRequest {
    TextToImage(TextToImage),
    ImageToImage(ImageToImage),
    ImageToVideo(ImageToVideo),
}

impl GenerationRequest {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationRequest::TextToImage(_) => "text_to_image",
            GenerationRequest::ImageToImage(_) => "image_to_image",
            GenerationRequest::ImageToVideo(_) => "image_to_video",
        }
    }
}

/// Seed `0` on the public API means "random".
pub fn optional_seed(seed: u32) -> Option<u32> {
    (seed != 0).then_some(seed)
}

/// A generative backend.
///
/// Artifacts come back unfiltered: content-filtered and failed entries are
/// reported through [`Artifact::finish_reason`], not as errors.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        api_key: &SecretString,
        request: &GenerationRequest,
    ) -> Result<Vec<Artifact>, ProviderError>;

    fn name(&self) -> &'static str;
}
