//! Generated artifacts as returned by a provider, before storage.

use serde::Serialize;
use std::fmt;

/// Media family of an artifact. Decides the key extension, the retrieval
/// route and the content type served for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
        }
    }

    /// Content type declared on retrieval. Images are always served as PNG,
    /// whatever the provider actually encoded.
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image/png",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Caller-visible path that dereferences `key`.
    pub fn reference(self, key: &str) -> String {
        match self {
            MediaKind::Image => format!("/ai-image-generation/images/{}", key),
            MediaKind::Video => format!("/ai-video-generation/videos/{}", key),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the provider stopped producing an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Success,
    ContentFiltered,
    Error,
}

impl FinishReason {
    /// Map the provider's wire value (`SUCCESS`, `CONTENT_FILTERED`, `ERROR`).
    pub fn from_wire(value: &str) -> Self {
        match value {
            "SUCCESS" => FinishReason::Success,
            "CONTENT_FILTERED" => FinishReason::ContentFiltered,
            _ => FinishReason::Error,
        }
    }
}

/// One binary result of a generation call.
#[derive(Clone)]
pub struct Artifact {
    pub kind: MediaKind,
    pub finish_reason: FinishReason,
    /// Seed the provider used. Informational, not unique.
    pub seed: u32,
    pub binary: Vec<u8>,
}

impl Artifact {
    pub fn is_filtered(&self) -> bool {
        self.finish_reason == FinishReason::ContentFiltered
    }

    /// Usable payload of the requested kind.
    pub fn is_usable(&self, kind: MediaKind) -> bool {
        self.kind == kind && self.finish_reason == FinishReason::Success && !self.binary.is_empty()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind)
            .field("finish_reason", &self.finish_reason)
            .field("seed", &self.seed)
            .field("bytes", &self.binary.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_embed_the_key() {
        assert_eq!(
            MediaKind::Image.reference("anon_fox_abc.png"),
            "/ai-image-generation/images/anon_fox_abc.png"
        );
        assert_eq!(
            MediaKind::Video.reference("anon_fox_abc.mp4"),
            "/ai-video-generation/videos/anon_fox_abc.mp4"
        );
    }

    #[test]
    fn unknown_finish_reason_is_an_error() {
        assert_eq!(FinishReason::from_wire("SUCCESS"), FinishReason::Success);
        assert_eq!(
            FinishReason::from_wire("CONTENT_FILTERED"),
            FinishReason::ContentFiltered
        );
        assert_eq!(FinishReason::from_wire("SOMETHING_NEW"), FinishReason::Error);
    }
}
