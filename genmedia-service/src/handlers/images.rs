use super::{preview, resolve_api_key, serve_artifact, usable_artifacts};
use crate::dtos::{
    parse_size, GeneratedImageData, ImageEditRequest, ImageEditResponse, ImageGenerationRequest,
    ImageGenerationResponse,
};
use crate::models::{Artifact, MediaKind};
use crate::services::providers::{optional_seed, GenerationRequest, ImageToImage, TextToImage};
use crate::services::KeySeed;
use crate::startup::AppState;
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::str::FromStr;
use validator::Validate;

pub async fn generate_images(
    State(state): State<AppState>,
    Json(payload): Json<ImageGenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (width, height) = parse_size(&payload.size)?;
    let api_key = resolve_api_key(&state)?;

    tracing::info!(
        prompt = %preview(&payload.prompt),
        n = payload.n,
        width,
        height,
        engine = %payload.engine_id,
        "Image generation requested"
    );

    let request = GenerationRequest::TextToImage(TextToImage {
        engine_id: payload.engine_id.clone(),
        prompt: payload.prompt.clone(),
        width,
        height,
        samples: payload.n,
        steps: payload.steps,
        cfg_scale: payload.cfg_scale,
        seed: optional_seed(payload.seed),
    });
    let artifacts = usable_artifacts(
        state.generator.generate(&api_key, &request).await?,
        MediaKind::Image,
    );

    let seed = KeySeed::new(payload.user_id.as_deref(), &payload.prompt, MediaKind::Image);
    let generated_images = store_images(&state, &seed, artifacts).await;

    if generated_images.is_empty() {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Image generation failed or all images were filtered."
        )));
    }

    Ok(Json(ImageGenerationResponse {
        message: format!("{} image(s) generated successfully.", generated_images.len()),
        generated_images,
    }))
}

pub async fn edit_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut prompt = None;
    let mut user_id = None;
    let mut engine_id = None;
    let mut steps = None;
    let mut cfg_scale = None;
    let mut seed = None;
    let mut image_strength = None;
    let mut image_file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => prompt = Some(text_field(field).await?),
            "user_id" => user_id = Some(text_field(field).await?).filter(|v| !v.is_empty()),
            "engine_id" => engine_id = Some(text_field(field).await?),
            "steps" => steps = Some(number_field::<u32>(field, "steps").await?),
            "cfg_scale" => cfg_scale = Some(finite_field(field, "cfg_scale").await?),
            "seed" => seed = Some(number_field::<u32>(field, "seed").await?),
            "image_strength" => {
                image_strength = Some(finite_field(field, "image_strength").await?)
            }
            "image_file" => {
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read image file: {}", e))
                })?;
                image_file = Some(data.to_vec());
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    let prompt = prompt
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing required field 'prompt'.")))?;
    let image_file = image_file.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Missing required field 'image_file'."))
    })?;

    let mut form = ImageEditRequest::new(prompt);
    form.user_id = user_id;
    if let Some(engine_id) = engine_id.filter(|v| !v.is_empty()) {
        form.engine_id = engine_id;
    }
    form.steps = steps.unwrap_or(form.steps);
    form.cfg_scale = cfg_scale.unwrap_or(form.cfg_scale);
    form.seed = seed.unwrap_or(form.seed);
    form.image_strength = image_strength.unwrap_or(form.image_strength);
    form.validate()?;

    if image_file.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Uploaded image file is empty."
        )));
    }
    let image_file = ensure_decodable(image_file).await?;
    let api_key = resolve_api_key(&state)?;

    tracing::info!(
        prompt = %preview(&form.prompt),
        upload_bytes = image_file.len(),
        image_strength = form.image_strength,
        engine = %form.engine_id,
        "Image edit requested"
    );

    let request = GenerationRequest::ImageToImage(ImageToImage {
        engine_id: form.engine_id.clone(),
        prompt: form.prompt.clone(),
        init_image: image_file.clone(),
        image_strength: form.image_strength,
        samples: 1,
        steps: form.steps,
        cfg_scale: form.cfg_scale,
        seed: optional_seed(form.seed),
    });
    let edits = usable_artifacts(
        state.generator.generate(&api_key, &request).await?,
        MediaKind::Image,
    );
    if edits.is_empty() {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Image editing failed or all results were filtered."
        )));
    }

    // The original is kept only once there is an edit to pair it with.
    let original_seed =
        KeySeed::new(form.user_id.as_deref(), &form.prompt, MediaKind::Image).tagged("original");
    let original_key = state
        .store
        .put(&original_seed, &image_file)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to store original upload");
            AppError::from(e)
        })?;

    let edited_seed =
        KeySeed::new(form.user_id.as_deref(), &form.prompt, MediaKind::Image).tagged("edited");
    let edited_images = store_images(&state, &edited_seed, edits).await;

    if edited_images.is_empty() {
        return Err(AppError::InternalError(anyhow::anyhow!(
            "Failed to store edited images."
        )));
    }

    Ok(Json(ImageEditResponse {
        message: format!("{} image(s) edited successfully.", edited_images.len()),
        original_image_path: Some(MediaKind::Image.reference(&original_key)),
        edited_images,
    }))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    serve_artifact(&state, &key, MediaKind::Image).await
}

/// Store each image. Storage failures skip the artifact.
async fn store_images(
    state: &AppState,
    seed: &KeySeed<'_>,
    artifacts: Vec<Artifact>,
) -> Vec<GeneratedImageData> {
    let mut stored = Vec::new();
    for artifact in artifacts {
        match state.store.put(seed, &artifact.binary).await {
            Ok(key) => stored.push(GeneratedImageData {
                image_path: MediaKind::Image.reference(&key),
                seed: artifact.seed,
            }),
            Err(e) => {
                tracing::error!(
                    seed = artifact.seed,
                    error = %e,
                    "Failed to store generated image"
                );
            }
        }
    }
    stored
}

/// Reject uploads the image decoder cannot read.
async fn ensure_decodable(data: Vec<u8>) -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(move || match image::load_from_memory(&data) {
        Ok(_) => Ok(data),
        Err(e) => Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid image format. Please upload a valid image (e.g., PNG, JPEG): {}",
            e
        ))),
    })
    .await
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Image decode task failed: {}", e)))?
}

async fn text_field(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read form field: {}", e)))
}

async fn number_field<T: FromStr>(field: Field<'_>, name: &str) -> Result<T, AppError> {
    let raw = text_field(field).await?;
    raw.trim().parse().map_err(|_| invalid_value(&raw, name))
}

/// `NaN` and infinities parse as `f32` but slip past range validation.
async fn finite_field(field: Field<'_>, name: &str) -> Result<f32, AppError> {
    let raw = text_field(field).await?;
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid_value(&raw, name)),
    }
}

fn invalid_value(raw: &str, name: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Invalid value '{}' for field '{}'.",
        raw,
        name
    ))
}
