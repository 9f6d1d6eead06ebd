use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_quality() -> String {
    "Standard".to_string()
}

fn default_motion_intensity() -> String {
    "Medium".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoGenerationRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    /// `16:9`, `1:1` or `9:16`; anything else falls back to `16:9`.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// `Standard` or `High`.
    #[serde(default = "default_quality")]
    pub quality: String,
    /// `Low`, `Medium` or `High`.
    #[serde(default = "default_motion_intensity")]
    pub motion_intensity: String,
    /// Seed for the source image. 0 for random.
    #[serde(default)]
    pub seed: u32,
    pub user_id: Option<String>,
}

impl VideoGenerationRequest {
    /// Source image size for the aspect ratio. These are the only sizes the
    /// image-to-video model accepts.
    pub fn source_dimensions(&self) -> (u32, u32) {
        match self.aspect_ratio.as_str() {
            "1:1" => (768, 768),
            "9:16" => (576, 1024),
            _ => (1024, 576),
        }
    }

    pub fn source_steps(&self) -> u32 {
        if self.quality == "Standard" {
            30
        } else {
            50
        }
    }

    pub fn motion_bucket_id(&self) -> u32 {
        match self.motion_intensity.as_str() {
            "Low" => 30,
            "High" => 120,
            _ => 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedVideoData {
    pub video_path: String,
    /// Seed reported for the video step.
    pub video_seed: u32,
    /// Seed of the intermediate source image.
    pub source_image_seed: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoGenerationResponse {
    pub message: String,
    pub generated_video: Option<GeneratedVideoData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> VideoGenerationRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn aspect_ratio_maps_to_supported_sizes() {
        assert_eq!(request(r#"{"prompt":"p"}"#).source_dimensions(), (1024, 576));
        assert_eq!(
            request(r#"{"prompt":"p","aspect_ratio":"9:16"}"#).source_dimensions(),
            (576, 1024)
        );
        assert_eq!(
            request(r#"{"prompt":"p","aspect_ratio":"1:1"}"#).source_dimensions(),
            (768, 768)
        );
        assert_eq!(
            request(r#"{"prompt":"p","aspect_ratio":"4:3"}"#).source_dimensions(),
            (1024, 576)
        );
    }

    #[test]
    fn quality_and_motion_map_to_provider_parameters() {
        let standard = request(r#"{"prompt":"p"}"#);
        assert_eq!(standard.source_steps(), 30);
        assert_eq!(standard.motion_bucket_id(), 80);

        let high = request(r#"{"prompt":"p","quality":"High","motion_intensity":"High"}"#);
        assert_eq!(high.source_steps(), 50);
        assert_eq!(high.motion_bucket_id(), 120);

        let low = request(r#"{"prompt":"p","motion_intensity":"Low"}"#);
        assert_eq!(low.motion_bucket_id(), 30);

        let unknown = request(r#"{"prompt":"p","motion_intensity":"Wild"}"#);
        assert_eq!(unknown.motion_bucket_id(), 80);
    }
}
