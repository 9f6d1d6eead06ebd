//! Mock provider for tests and local runs without a Stability account.

use super::{GenerationProvider, GenerationRequest, ProviderError};
use crate::models::{Artifact, FinishReason, MediaKind};
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Seed reported when the request leaves it to the provider.
const MOCK_RANDOM_SEED: u32 = 1_234_567;

/// Which artifacts the mock marks as content-filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    None,
    First,
    All,
}

/// Encode a solid-color PNG.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 80, 40, 255]));
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageOutputFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    out
}

/// Bytes shaped like the start of an MP4 file.
pub fn sample_mp4() -> Vec<u8> {
    let mut out = vec![0x00, 0x00, 0x00, 0x18];
    out.extend_from_slice(b"ftypmp42");
    out.resize(4096, 0);
    out
}

/// Mock provider. Answers instantly (or after `delay`) with tiny artifacts
/// and remembers every request it saw.
pub struct MockProvider {
    filter: FilterMode,
    delay: Option<Duration>,
    failure: Option<fn() -> ProviderError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            filter: FilterMode::None,
            delay: None,
            failure: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call with the error `make` builds.
    pub fn failing_with(mut self, make: fn() -> ProviderError) -> Self {
        self.failure = Some(make);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn finish_reason(&self, index: usize) -> FinishReason {
        match self.filter {
            FilterMode::All => FinishReason::ContentFiltered,
            FilterMode::First if index == 0 => FinishReason::ContentFiltered,
            _ => FinishReason::Success,
        }
    }

    fn images(&self, samples: u32, seed: Option<u32>) -> Vec<Artifact> {
        let base_seed = seed.unwrap_or(MOCK_RANDOM_SEED);
        (0..samples as usize)
            .map(|i| Artifact {
                kind: MediaKind::Image,
                finish_reason: self.finish_reason(i),
                seed: base_seed.wrapping_add(i as u32),
                binary: sample_png(8, 8),
            })
            .collect()
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(
        &self,
        _api_key: &SecretString,
        request: &GenerationRequest,
    ) -> Result<Vec<Artifact>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(make) = self.failure {
            return Err(make());
        }

        Ok(match request {
            GenerationRequest::TextToImage(params) => self.images(params.samples, params.seed),
            GenerationRequest::ImageToImage(params) => self.images(params.samples, params.seed),
            GenerationRequest::ImageToVideo(params) => vec![Artifact {
                kind: MediaKind::Video,
                finish_reason: self.finish_reason(0),
                seed: params.seed,
                binary: sample_mp4(),
            }],
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
