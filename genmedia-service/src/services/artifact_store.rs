//! Artifact store: names, persists and retrieves generated media.
//!
//! Keys have the shape `user[_tag]_prompt_token.ext`:
//!
//! - `user` is the sanitized caller id, at most 64 characters, `anon` when
//!   absent or empty;
//! - `tag` is an optional marker such as `original` or `edited`, at most 32;
//! - `prompt` is the sanitized first 20 characters of the prompt;
//! - `token` is 128 random bits as 32 lowercase hex digits;
//! - `ext` follows the media kind (`png`, `mp4`).
//!
//! Sanitizing keeps `[A-Za-z0-9._-]` and drops everything else, so every key
//! is a single URL path segment and a single file name.
//!
//! The store is append-only. A zero-length payload reads back as not found.

use crate::models::MediaKind;
use crate::services::blob::{BlobError, BlobStore};
use metrics::counter;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

const ANONYMOUS_USER: &str = "anon";
const PROMPT_PREFIX_CHARS: usize = 20;
const MAX_USER_CHARS: usize = 64;
const MAX_TAG_CHARS: usize = 32;
/// Common file-name limit. `build_key` stays well below it.
pub const MAX_KEY_LEN: usize = 255;
/// A 128-bit token collides practically never; this only bounds the loop.
const MAX_PUT_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] BlobError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => {
                AppError::NotFound(anyhow::anyhow!("Artifact '{}' not found", key))
            }
            StoreError::StorageFailure(e) => AppError::StorageError(anyhow::Error::new(e)),
        }
    }
}

/// Inputs the storage key is derived from.
#[derive(Debug, Clone, Copy)]
pub struct KeySeed<'a> {
    pub user_id: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub prompt: &'a str,
    pub kind: MediaKind,
}

impl<'a> KeySeed<'a> {
    pub fn new(user_id: Option<&'a str>, prompt: &'a str, kind: MediaKind) -> Self {
        Self {
            user_id,
            tag: None,
            prompt,
            kind,
        }
    }

    pub fn tagged(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Keep only `[A-Za-z0-9._-]`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// True for keys `put` could have produced: non-empty, one path segment,
/// no longer than [`MAX_KEY_LEN`].
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key != "."
        && key != ".."
        && sanitize(key).len() == key.len()
}

fn truncate(mut value: String, max: usize) -> String {
    // Sanitized output is ASCII, so byte and char boundaries agree.
    value.truncate(max);
    value
}

fn random_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Assemble a key from `seed` and a caller-provided `token`.
pub fn build_key(seed: &KeySeed<'_>, token: &str) -> String {
    let user = seed
        .user_id
        .filter(|u| !u.is_empty())
        .unwrap_or(ANONYMOUS_USER);
    let prompt_prefix: String = seed.prompt.chars().take(PROMPT_PREFIX_CHARS).collect();

    let mut key = truncate(sanitize(user), MAX_USER_CHARS);
    if let Some(tag) = seed.tag {
        key.push('_');
        key.push_str(&truncate(sanitize(tag), MAX_TAG_CHARS));
    }
    key.push('_');
    key.push_str(&sanitize(&prompt_prefix));
    key.push('_');
    key.push_str(token);
    key.push('.');
    key.push_str(seed.kind.extension());
    key
}

/// Sole owner of the key-to-bytes mapping.
#[derive(Clone)]
pub struct ArtifactStore {
    backend: Arc<dyn BlobStore>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn BlobStore>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Persist `data` under a fresh key and return the key.
    pub async fn put(&self, seed: &KeySeed<'_>, data: &[u8]) -> Result<String, StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let key = build_key(seed, &random_token());

            match self.backend.insert(&key, data).await {
                Ok(()) => {
                    tracing::info!(
                        key = %key,
                        size = data.len(),
                        backend = self.backend.name(),
                        "Stored artifact"
                    );
                    counter!("artifacts_stored_total", "media" => seed.kind.as_str())
                        .increment(1);
                    return Ok(key);
                }
                Err(BlobError::AlreadyExists(_)) if attempt < MAX_PUT_ATTEMPTS => {
                    tracing::warn!(key = %key, attempt, "Artifact key collision, retrying");
                }
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Failed to store artifact");
                    counter!("artifact_store_failures_total", "op" => "put").increment(1);
                    return Err(StoreError::StorageFailure(e));
                }
            }
        }
    }

    /// Exact bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }

        match self.backend.fetch(key).await {
            Ok(Some(data)) if !data.is_empty() => Ok(data),
            Ok(_) => Err(StoreError::NotFound(key.to_string())),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to read artifact");
                counter!("artifact_store_failures_total", "op" => "get").increment(1);
                Err(StoreError::StorageFailure(e))
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.backend.health_check().await.map_err(StoreError::from)
    }
}
