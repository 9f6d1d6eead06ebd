use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

pub const DEFAULT_ENGINE_ID: &str = "stable-diffusion-xl-1024-v1-0";

fn default_n() -> u32 {
    1
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_engine_id() -> String {
    DEFAULT_ENGINE_ID.to_string()
}

fn default_steps() -> u32 {
    30
}

fn default_cfg_scale() -> f32 {
    7.0
}

fn default_image_strength() -> f32 {
    0.35
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageGenerationRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub user_id: Option<String>,
    #[serde(default = "default_n")]
    #[validate(range(min = 1, max = 10))]
    pub n: u32,
    /// `"WxH"`, e.g. `1024x1024`.
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_engine_id")]
    pub engine_id: String,
    #[serde(default = "default_steps")]
    #[validate(range(min = 10, max = 150))]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    #[validate(range(min = 0.0, max = 35.0))]
    pub cfg_scale: f32,
    /// 0 for random.
    #[serde(default)]
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImageData {
    /// Relative API path to retrieve the image.
    pub image_path: String,
    pub seed: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub message: String,
    pub generated_images: Vec<GeneratedImageData>,
}

/// Non-file fields of the `edit-image` multipart form.
#[derive(Debug, Clone, Validate)]
pub struct ImageEditRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub user_id: Option<String>,
    pub engine_id: String,
    #[validate(range(min = 10, max = 150))]
    pub steps: u32,
    #[validate(range(min = 0.0, max = 35.0))]
    pub cfg_scale: f32,
    pub seed: u32,
    /// Prompt influence: lower keeps more of the upload.
    #[validate(range(min = 0.0, max = 1.0))]
    pub image_strength: f32,
}

impl ImageEditRequest {
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            user_id: None,
            engine_id: default_engine_id(),
            steps: default_steps(),
            cfg_scale: default_cfg_scale(),
            seed: 0,
            image_strength: default_image_strength(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageEditResponse {
    pub message: String,
    pub original_image_path: Option<String>,
    pub edited_images: Vec<GeneratedImageData>,
}

/// Parse a `"WxH"` size into positive dimensions.
pub fn parse_size(size: &str) -> Result<(u32, u32), AppError> {
    let invalid = || {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid size format '{}'. Expected 'widthxheight' (e.g., '1024x1024').",
            size
        ))
    };

    let (width, height) = size.split_once('x').ok_or_else(invalid)?;
    let width: u32 = width.parse().map_err(|_| invalid())?;
    let height: u32 = height.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
