pub mod images;
pub mod videos;

pub use images::{
    parse_size, GeneratedImageData, ImageEditRequest, ImageEditResponse, ImageGenerationRequest,
    ImageGenerationResponse, DEFAULT_ENGINE_ID,
};
pub use videos::{GeneratedVideoData, VideoGenerationRequest, VideoGenerationResponse};
