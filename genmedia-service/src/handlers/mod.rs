pub mod health;
pub mod images;
pub mod videos;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use images::{edit_image, generate_images, get_image};
pub use videos::{generate_video, get_video};

use crate::models::{Artifact, MediaKind};
use crate::services::metrics::record_filtered;
use crate::services::StoreError;
use crate::startup::AppState;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use service_core::error::AppError;

/// Provider credential for this request. Looked up on every call.
fn resolve_api_key(state: &AppState) -> Result<SecretString, AppError> {
    let name = &state.config.provider.api_key_name;
    state.secrets.get(name).ok_or_else(|| {
        tracing::error!(secret = %name, "Provider API key secret not found");
        AppError::ConfigError(anyhow::anyhow!(
            "Configuration error: Stability AI API key not found."
        ))
    })
}

/// Short prompt excerpt for log lines.
fn preview(prompt: &str) -> String {
    prompt.chars().take(50).collect()
}

/// Drop filtered and unusable artifacts, counting the filtered ones.
fn usable_artifacts(artifacts: Vec<Artifact>, kind: MediaKind) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .filter(|artifact| {
            if artifact.is_filtered() {
                tracing::warn!(
                    media = %kind,
                    seed = artifact.seed,
                    "Artifact censored by content filter"
                );
                record_filtered(kind);
                return false;
            }
            if !artifact.is_usable(kind) {
                tracing::warn!(
                    expected = %kind,
                    actual = %artifact.kind,
                    finish_reason = ?artifact.finish_reason,
                    "Skipping unusable artifact"
                );
                return false;
            }
            true
        })
        .collect()
}

/// Serve stored bytes with the fixed content type of `kind`. Unknown keys are
/// a bare 404.
async fn serve_artifact(state: &AppState, key: &str, kind: MediaKind) -> Response {
    match state.store.get(key).await {
        Ok(bytes) => {
            tracing::info!(key = %key, size = bytes.len(), "Serving artifact");
            ([(header::CONTENT_TYPE, kind.content_type())], bytes).into_response()
        }
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(key = %key, "Artifact not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
