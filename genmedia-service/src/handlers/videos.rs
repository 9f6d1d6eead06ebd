use super::{preview, resolve_api_key, serve_artifact, usable_artifacts};
use crate::dtos::{GeneratedVideoData, VideoGenerationRequest, VideoGenerationResponse};
use crate::models::MediaKind;
use crate::services::providers::{optional_seed, GenerationRequest, ImageToVideo, TextToImage};
use crate::services::KeySeed;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

const VIDEO_CFG_SCALE: f32 = 7.0;

/// Two provider calls: a source still from the prompt, then image-to-video
/// seeded with the still's seed.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(payload): Json<VideoGenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let api_key = resolve_api_key(&state)?;
    let (width, height) = payload.source_dimensions();

    tracing::info!(
        prompt = %preview(&payload.prompt),
        aspect_ratio = %payload.aspect_ratio,
        quality = %payload.quality,
        motion = %payload.motion_intensity,
        "Video generation requested"
    );

    let source_request = GenerationRequest::TextToImage(TextToImage {
        engine_id: state.config.provider.default_engine_id.clone(),
        prompt: payload.prompt.clone(),
        width,
        height,
        samples: 1,
        steps: payload.source_steps(),
        cfg_scale: VIDEO_CFG_SCALE,
        seed: optional_seed(payload.seed),
    });
    let source = usable_artifacts(
        state.generator.generate(&api_key, &source_request).await?,
        MediaKind::Image,
    )
    .into_iter()
    .next()
    .ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Failed to generate source image for video (possibly filtered)."
        ))
    })?;

    let source_image_seed = source.seed;
    tracing::info!(seed = source_image_seed, "Source image ready, starting video step");

    let video_request = GenerationRequest::ImageToVideo(ImageToVideo {
        init_image: source.binary,
        seed: source_image_seed,
        cfg_scale: VIDEO_CFG_SCALE,
        motion_bucket_id: payload.motion_bucket_id(),
    });
    let video = usable_artifacts(
        state.generator.generate(&api_key, &video_request).await?,
        MediaKind::Video,
    )
    .into_iter()
    .next()
    .ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Video generation failed or the result was filtered."
        ))
    })?;

    let seed = KeySeed::new(payload.user_id.as_deref(), &payload.prompt, MediaKind::Video);
    let key = state.store.put(&seed, &video.binary).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store generated video");
        AppError::from(e)
    })?;

    Ok(Json(VideoGenerationResponse {
        message: "Video generated successfully.".to_string(),
        generated_video: Some(GeneratedVideoData {
            video_path: MediaKind::Video.reference(&key),
            video_seed: video.seed,
            source_image_seed,
        }),
    }))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    serve_artifact(&state, &filename, MediaKind::Video).await
}
