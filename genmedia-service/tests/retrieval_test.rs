mod common;

use common::TestApp;
use reqwest::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn unknown_image_key_is_not_found_without_body() {
    let app = TestApp::spawn().await;

    let response = app.get("/ai-image-generation/images/does-not-exist.png").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_video_key_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!("/ai-video-generation/videos/{}.mp4", Uuid::new_v4()))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn key_with_disallowed_characters_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/ai-image-generation/images/..%2F..%2Fetc%2Fpasswd").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overlong_key_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!("/ai-image-generation/images/{}.png", "a".repeat(300)))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retrieval_responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let response = app.get("/ai-image-generation/images/missing.png").await;

    assert!(response.headers().contains_key("x-request-id"));
}
