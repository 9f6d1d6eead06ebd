//! Stability AI REST binding.
//!
//! - text-to-image: `POST /v1/generation/{engine}/text-to-image` (JSON)
//! - image-to-image: `POST /v1/generation/{engine}/image-to-image` (multipart)
//! - image-to-video: `POST /v2beta/image-to-video` (multipart), then poll
//!   `GET /v2beta/image-to-video/result/{id}` until it stops answering 202.
//!
//! No timeout is applied here beyond the HTTP client's connect timeout; the
//! caller bounds the whole call, polling included.

use super::{
    GenerationProvider, GenerationRequest, ImageToImage, ImageToVideo, ProviderError, TextToImage,
};
use crate::models::{Artifact, FinishReason, MediaKind};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stability provider configuration.
#[derive(Debug, Clone)]
pub struct StabilityConfig {
    pub api_host: String,
    pub video_poll_interval: Duration,
}

/// Stability AI provider.
pub struct StabilityProvider {
    config: StabilityConfig,
    client: Client,
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Serialize)]
struct TextToImageBody<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
}

#[derive(Deserialize)]
struct GenerationResponse {
    artifacts: Vec<ApiArtifact>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArtifact {
    base64: String,
    seed: u32,
    finish_reason: String,
}

#[derive(Deserialize)]
struct VideoJob {
    id: String,
}

impl StabilityProvider {
    pub fn new(config: StabilityConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_host.trim_end_matches('/'), path)
    }

    async fn text_to_image(
        &self,
        api_key: &SecretString,
        params: &TextToImage,
    ) -> Result<Vec<Artifact>, ProviderError> {
        let body = TextToImageBody {
            text_prompts: vec![TextPrompt {
                text: &params.prompt,
                weight: 1.0,
            }],
            cfg_scale: params.cfg_scale,
            height: params.height,
            width: params.width,
            samples: params.samples,
            steps: params.steps,
            seed: params.seed,
        };

        tracing::debug!(
            engine = %params.engine_id,
            width = params.width,
            height = params.height,
            samples = params.samples,
            "Sending text-to-image request to Stability"
        );

        let response = self
            .client
            .post(self.url(&format!(
                "/v1/generation/{}/text-to-image",
                params.engine_id
            )))
            .bearer_auth(api_key.expose_secret())
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        decode_image_artifacts(check_status(response).await?).await
    }

    async fn image_to_image(
        &self,
        api_key: &SecretString,
        params: &ImageToImage,
    ) -> Result<Vec<Artifact>, ProviderError> {
        // The API's strength is how much of the init image survives.
        let init_strength = (1.0 - params.image_strength).clamp(0.0, 1.0);

        let mut form = Form::new()
            .part(
                "init_image",
                Part::bytes(params.init_image.clone()).file_name("init_image"),
            )
            .text("init_image_mode", "IMAGE_STRENGTH")
            .text("image_strength", init_strength.to_string())
            .text("text_prompts[0][text]", params.prompt.clone())
            .text("cfg_scale", params.cfg_scale.to_string())
            .text("samples", params.samples.to_string())
            .text("steps", params.steps.to_string());
        if let Some(seed) = params.seed {
            form = form.text("seed", seed.to_string());
        }

        tracing::debug!(
            engine = %params.engine_id,
            init_bytes = params.init_image.len(),
            init_strength,
            "Sending image-to-image request to Stability"
        );

        let response = self
            .client
            .post(self.url(&format!(
                "/v1/generation/{}/image-to-image",
                params.engine_id
            )))
            .bearer_auth(api_key.expose_secret())
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        decode_image_artifacts(check_status(response).await?).await
    }

    async fn image_to_video(
        &self,
        api_key: &SecretString,
        params: &ImageToVideo,
    ) -> Result<Vec<Artifact>, ProviderError> {
        let form = Form::new()
            .part(
                "image",
                Part::bytes(params.init_image.clone()).file_name("image.png"),
            )
            .text("seed", params.seed.to_string())
            .text("cfg_scale", params.cfg_scale.to_string())
            .text("motion_bucket_id", params.motion_bucket_id.to_string());

        let response = self
            .client
            .post(self.url("/v2beta/image-to-video"))
            .bearer_auth(api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        let job: VideoJob = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse video job: {}", e)))?;

        tracing::info!(job_id = %job.id, "Video generation started");

        loop {
            tokio::time::sleep(self.config.video_poll_interval).await;

            let response = self
                .client
                .get(self.url(&format!("/v2beta/image-to-video/result/{}", job.id)))
                .bearer_auth(api_key.expose_secret())
                .header(header::ACCEPT, "video/*")
                .send()
                .await
                .map_err(network_error)?;

            if response.status() == StatusCode::ACCEPTED {
                tracing::debug!(job_id = %job.id, "Video still rendering");
                continue;
            }

            let response = check_status(response).await?;
            let finish_reason = response
                .headers()
                .get("finish-reason")
                .and_then(|v| v.to_str().ok())
                .map(FinishReason::from_wire)
                .unwrap_or(FinishReason::Success);
            let seed = response
                .headers()
                .get("seed")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(params.seed);
            let binary = response
                .bytes()
                .await
                .map_err(network_error)?
                .to_vec();

            return Ok(vec![Artifact {
                kind: MediaKind::Video,
                finish_reason,
                seed,
                binary,
            }]);
        }
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::NetworkError(e.to_string())
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNPROCESSABLE_ENTITY => ProviderError::InvalidRequest(format!(
            "Stability API error {}: {}",
            status, error_text
        )),
        _ => ProviderError::ApiError(format!("Stability API error {}: {}", status, error_text)),
    })
}

async fn decode_image_artifacts(response: Response) -> Result<Vec<Artifact>, ProviderError> {
    let body: GenerationResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

    body.artifacts
        .into_iter()
        .map(|a| {
            let binary = base64::engine::general_purpose::STANDARD
                .decode(a.base64.as_bytes())
                .map_err(|e| ProviderError::ApiError(format!("Invalid artifact payload: {}", e)))?;
            Ok(Artifact {
                kind: MediaKind::Image,
                finish_reason: FinishReason::from_wire(&a.finish_reason),
                seed: a.seed,
                binary,
            })
        })
        .collect()
}

#[async_trait]
impl GenerationProvider for StabilityProvider {
    async fn generate(
        &self,
        api_key: &SecretString,
        request: &GenerationRequest,
    ) -> Result<Vec<Artifact>, ProviderError> {
        match request {
            GenerationRequest::TextToImage(params) => self.text_to_image(api_key, params).await,
            GenerationRequest::ImageToImage(params) => self.image_to_image(api_key, params).await,
            GenerationRequest::ImageToVideo(params) => self.image_to_video(api_key, params).await,
        }
    }

    fn name(&self) -> &'static str {
        "stability"
    }
}
