mod common;

use common::TestApp;
use genmedia_service::dtos::ImageGenerationResponse;
use genmedia_service::services::providers::mock::{FilterMode, MockProvider};
use genmedia_service::services::providers::ProviderError;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn generated_image_is_retrievable_from_returned_path() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "n": 1, "size": "512x512"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ImageGenerationResponse = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body.message, "1 image(s) generated successfully.");
    assert_eq!(body.generated_images.len(), 1);

    let image = &body.generated_images[0];
    let key = image
        .image_path
        .strip_prefix("/ai-image-generation/images/")
        .expect("unexpected image path");
    assert!(key.starts_with("anon_aredfox_"));
    assert!(key.ends_with(".png"));

    let fetched = app.get(&image.image_path).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.headers()["content-type"], "image/png");
    assert!(!fetched.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_forwards_dimensions_and_seed_to_provider() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({
                "prompt": "lighthouse",
                "n": 2,
                "size": "768x512",
                "seed": 99,
                "user_id": "u1"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ImageGenerationResponse = response.json().await.unwrap();
    let seeds: Vec<u32> = body.generated_images.iter().map(|i| i.seed).collect();
    assert_eq!(seeds, vec![99, 100]);
    assert!(body.generated_images[0].image_path.contains("/u1_lighthouse_"));
    assert_ne!(
        body.generated_images[0].image_path,
        body.generated_images[1].image_path
    );

    let requests = app.provider.requests();
    match &requests[0] {
        genmedia_service::services::providers::GenerationRequest::TextToImage(params) => {
            assert_eq!((params.width, params.height), (768, 512));
            assert_eq!(params.samples, 2);
            assert_eq!(params.seed, Some(99));
        }
        other => panic!("unexpected request {:?}", other),
    }
}

#[tokio::test]
async fn very_long_user_id_is_shortened_in_the_key() {
    let app = TestApp::spawn().await;
    let user_id = "u".repeat(300);

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "size": "512x512", "user_id": user_id}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ImageGenerationResponse = response.json().await.unwrap();
    let path = &body.generated_images[0].image_path;
    assert!(path.contains(&format!("/{}_aredfox_", "u".repeat(64))));
    assert_eq!(app.get(path).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_size_is_rejected_before_provider_call() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "size": "abcxdef"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn out_of_range_fields_are_unprocessable() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "n": 50}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn partially_filtered_batch_keeps_the_rest() {
    let app = TestApp::spawn_with(
        MockProvider::new().with_filter(FilterMode::First),
        true,
        Duration::from_secs(5),
    )
    .await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "n": 3, "size": "512x512"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ImageGenerationResponse = response.json().await.unwrap();
    assert_eq!(body.generated_images.len(), 2);
}

#[tokio::test]
async fn fully_filtered_batch_is_a_server_error() {
    let app = TestApp::spawn_with(
        MockProvider::new().with_filter(FilterMode::All),
        true,
        Duration::from_secs(5),
    )
    .await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "n": 2, "size": "512x512"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn missing_api_key_fails_before_provider_call() {
    let app = TestApp::spawn_with(MockProvider::new(), false, Duration::from_secs(5)).await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "size": "512x512"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn slow_provider_yields_gateway_timeout() {
    let app = TestApp::spawn_with(
        MockProvider::new().with_delay(Duration::from_secs(5)),
        true,
        Duration::from_millis(50),
    )
    .await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "size": "512x512"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway() {
    let app = TestApp::spawn_with(
        MockProvider::new().failing_with(|| ProviderError::ApiError("upstream 500".to_string())),
        true,
        Duration::from_secs(5),
    )
    .await;

    let response = app
        .post_json(
            "/ai-image-generation/generate",
            &json!({"prompt": "a red fox", "size": "512x512"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
