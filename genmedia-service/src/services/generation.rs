//! Runs provider calls under the concurrency cap and the outbound timeout.

use crate::models::Artifact;
use crate::services::limiter::GenerationLimiter;
use crate::services::metrics::record_provider_request;
use crate::services::providers::{GenerationProvider, GenerationRequest, ProviderError};
use secrecy::SecretString;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn GenerationProvider>,
    limiter: GenerationLimiter,
    timeout: Duration,
}

impl GenerationService {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        limiter: GenerationLimiter,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Call the provider. Saturation is 503, a slow provider is 504, other
    /// provider failures map through [`ProviderError`].
    pub async fn generate(
        &self,
        api_key: &SecretString,
        request: &GenerationRequest,
    ) -> Result<Vec<Artifact>, AppError> {
        let kind = request.kind();
        let _permit = self.limiter.try_acquire().ok_or_else(|| {
            tracing::warn!(kind, "Generation capacity exhausted, rejecting request");
            record_provider_request(kind, "rejected");
            AppError::ServiceUnavailable
        })?;

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.provider.generate(api_key, request))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.timeout.as_secs())));

        match outcome {
            Ok(artifacts) => {
                tracing::info!(
                    kind,
                    provider = self.provider.name(),
                    artifacts = artifacts.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Provider call completed"
                );
                record_provider_request(kind, "ok");
                Ok(artifacts)
            }
            Err(e) => {
                tracing::error!(
                    kind,
                    provider = self.provider.name(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Provider call failed"
                );
                record_provider_request(
                    kind,
                    if matches!(e, ProviderError::Timeout(_)) {
                        "timeout"
                    } else {
                        "error"
                    },
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockProvider;
    use crate::services::providers::TextToImage;
    use axum::http::StatusCode;

    fn request() -> GenerationRequest {
        GenerationRequest::TextToImage(TextToImage {
            engine_id: "engine".to_string(),
            prompt: "fox".to_string(),
            width: 64,
            height: 64,
            samples: 1,
            steps: 10,
            cfg_scale: 7.0,
            seed: None,
        })
    }

    fn key() -> SecretString {
        SecretString::new("k".to_string())
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_gateway_timeout() {
        let provider = Arc::new(MockProvider::new().with_delay(Duration::from_secs(5)));
        let service = GenerationService::new(
            provider,
            GenerationLimiter::unlimited(),
            Duration::from_millis(20),
        );

        let err = service.generate(&key(), &request()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn saturated_limiter_rejects_without_calling_provider() {
        let provider = Arc::new(MockProvider::new());
        let limiter = GenerationLimiter::new(1);
        let _held = limiter.try_acquire().unwrap();
        let service = GenerationService::new(provider.clone(), limiter, Duration::from_secs(1));

        let err = service.generate(&key(), &request()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_call_returns_artifacts() {
        let service = GenerationService::new(
            Arc::new(MockProvider::new()),
            GenerationLimiter::new(4),
            Duration::from_secs(1),
        );
        let artifacts = service.generate(&key(), &request()).await.unwrap();
        assert_eq!(artifacts.len(), 1);
    }
}
