mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, setup, setup_with};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn root_lists_endpoints() {
    let test = setup();

    let response = test.app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["name"], "voicegate");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["endpoints"]["tts"], "/v1/audio/speech");
    assert_eq!(json["endpoints"]["stt"], "/v1/audio/transcriptions");
    assert_eq!(json["endpoints"]["voices"], "/v1/voices");
    assert_eq!(json["endpoints"]["health"], "/health");
}

#[tokio::test]
async fn health_reports_models_and_loaded_voices() {
    let test = setup();

    let json = body_json(test.app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["host"], "127.0.0.1");
    assert_eq!(json["port"], 8001);
    assert_eq!(
        json["models"],
        json!({"tts_base": true, "tts_voice_design": true, "stt": true})
    );
    assert_eq!(json["voices_loaded"], 0);
    assert_eq!(json["auth_enabled"], false);

    let response = test
        .app
        .clone()
        .oneshot(post_json("/v1/audio/speech", &json!({"input": "Hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(test.app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["voices_loaded"], 1);
}

#[tokio::test]
async fn health_reflects_precomputed_prompts() {
    let test = setup();
    assert_eq!(test.state.engine.precompute_prompts().await, 2);

    let json = body_json(test.app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["voices_loaded"], 2);
}

#[tokio::test]
async fn health_reports_auth_state() {
    let test = setup_with(|config| {
        config.server.api_key = Some("secret".to_string());
        config.server.port = 9100;
    });

    let json = body_json(test.app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(json["auth_enabled"], true);
    assert_eq!(json["port"], 9100);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let test = setup();

    let response = test.app.clone().oneshot(get("/v2/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
