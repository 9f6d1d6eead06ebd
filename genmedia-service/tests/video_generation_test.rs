mod common;

use common::TestApp;
use genmedia_service::dtos::VideoGenerationResponse;
use genmedia_service::services::providers::mock::{sample_mp4, FilterMode, MockProvider};
use genmedia_service::services::providers::GenerationRequest;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn generated_video_is_served_as_mp4() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/ai-video-generation/generate-video",
            &json!({
                "prompt": "waves crashing on rocks",
                "aspect_ratio": "9:16",
                "quality": "High",
                "motion_intensity": "Low",
                "seed": 42,
                "user_id": "director"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: VideoGenerationResponse = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body.message, "Video generated successfully.");
    let video = body.generated_video.expect("video missing");
    assert_eq!(video.source_image_seed, 42);
    assert_eq!(video.video_seed, 42);
    assert!(video.video_path.starts_with("/ai-video-generation/videos/director_wavescrashingon"));
    assert!(video.video_path.ends_with(".mp4"));

    let fetched = app.get(&video.video_path).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.headers()["content-type"], "video/mp4");
    assert_eq!(fetched.bytes().await.unwrap().to_vec(), sample_mp4());

    let requests = app.provider.requests();
    assert_eq!(requests.len(), 2);
    match (&requests[0], &requests[1]) {
        (GenerationRequest::TextToImage(still), GenerationRequest::ImageToVideo(clip)) => {
            assert_eq!((still.width, still.height), (576, 1024));
            assert_eq!(still.steps, 50);
            assert_eq!(clip.motion_bucket_id, 30);
            assert_eq!(clip.seed, 42);
        }
        other => panic!("unexpected requests {:?}", other),
    }
}

#[tokio::test]
async fn filtered_source_image_stops_before_video_step() {
    let app = TestApp::spawn_with(
        MockProvider::new().with_filter(FilterMode::All),
        true,
        Duration::from_secs(5),
    )
    .await;

    let response = app
        .post_json(
            "/ai-video-generation/generate-video",
            &json!({"prompt": "waves"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.provider.call_count(), 1);
}

#[tokio::test]
async fn empty_prompt_is_unprocessable() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/ai-video-generation/generate-video", &json!({"prompt": ""}))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.provider.call_count(), 0);
}
