mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, get, post_json, setup};
use serde_json::{json, Value};
use tower::ServiceExt;
use voicegate_voice::testing::wav_bytes;
use voicegate_voice::MANIFEST_FILE;

#[tokio::test]
async fn list_voices_reports_prompt_state() {
    let test = setup();
    test.state.engine.prompt_for("da").await.unwrap();

    let response = test.app.clone().oneshot(get("/v1/voices")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["default_voice"], "da");
    assert_eq!(json["total"], 2);
    assert_eq!(
        json["voices"],
        json!([
            {"name": "alice", "file": "alice.wav", "description": "Calm narrator", "has_prompt": false},
            {"name": "da", "file": "da.wav", "description": "Default assistant", "has_prompt": true},
        ])
    );
}

#[tokio::test]
async fn create_voice_returns_recording_and_registers_it() {
    let test = setup();

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/voices",
            &json!({"agent_name": "nova", "instruct": "Female, mid-thirties. Warm, smooth timbre."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=nova.wav"
    );
    assert_eq!(response.headers()["x-agent-voice"], "nova");
    let audio = body_bytes(response).await;
    assert!(voicegate_voice::is_wav(&audio));
    assert_eq!(
        std::fs::read(test.dir.path().join("nova.wav")).unwrap(),
        audio
    );

    let listed = body_json(test.app.clone().oneshot(get("/v1/voices")).await.unwrap()).await;
    assert_eq!(listed["total"], 3);
    let nova = listed["voices"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["name"] == "nova")
        .cloned()
        .unwrap();
    assert_eq!(nova["has_prompt"], true);
    assert_eq!(nova["description"], "Female, mid-thirties. Warm, smooth timbre.");

    // The new voice is immediately usable for synthesis.
    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/audio/speech",
            &json!({"input": "Hi", "agent": "nova"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test.speech.prompt_calls(), 1);
}

#[tokio::test]
async fn long_instructions_are_truncated_in_the_description() {
    let test = setup();
    let instruct = "x".repeat(150);

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/voices",
            &json!({"agent_name": "verbose", "instruct": instruct}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let manifest: Value = serde_json::from_str(
        &std::fs::read_to_string(test.dir.path().join(MANIFEST_FILE)).unwrap(),
    )
    .unwrap();
    let entry = &manifest["voices"]["verbose"];
    assert_eq!(entry["description"].as_str().unwrap().chars().count(), 100);
    assert_eq!(entry["instruct"].as_str().unwrap().len(), 150);
}

#[tokio::test]
async fn duplicate_voice_is_a_conflict() {
    let test = setup();

    let response = test
        .app
        .clone()
        .oneshot(post_json(
            "/v1/voices",
            &json!({"agent_name": "da", "instruct": "Another voice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("already exists"));
    assert_eq!(test.speech.design_calls(), 0);
}

#[tokio::test]
async fn invalid_voice_requests_are_rejected() {
    let test = setup();

    for (body, expected) in [
        (
            json!({"agent_name": "bad-name", "instruct": "x"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"agent_name": "../escape", "instruct": "x"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"agent_name": " nova ", "instruct": "x"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"agent_name": "ok_name", "instruct": "  "}),
            StatusCode::BAD_REQUEST,
        ),
        (json!({"agent_name": "ok_name"}), StatusCode::UNPROCESSABLE_ENTITY),
    ] {
        let response = test
            .app
            .clone()
            .oneshot(post_json("/v1/voices", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "body: {}", body);
    }
    assert_eq!(test.speech.design_calls(), 0);
    assert!(!test.dir.path().join("nova.wav").exists());
}

#[tokio::test]
async fn reload_picks_up_manifest_edits() {
    let test = setup();

    std::fs::write(test.dir.path().join("carol.wav"), wav_bytes(&[3; 8], 24_000)).unwrap();
    std::fs::write(
        test.dir.path().join(MANIFEST_FILE),
        r#"{"default_voice": "carol", "voices": {
            "da": {"file": "da.wav", "description": "Default assistant"},
            "carol": {"file": "carol.wav", "description": "New default"}
        }}"#,
    )
    .unwrap();

    let response = test
        .app
        .clone()
        .oneshot(post_json("/v1/voices/reload", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["voices_loaded"], 2);
    assert_eq!(json["message"], "Voice configuration reloaded successfully");

    let listed = body_json(test.app.clone().oneshot(get("/v1/voices")).await.unwrap()).await;
    assert_eq!(listed["default_voice"], "carol");
    assert_eq!(listed["total"], 2);
}

#[tokio::test]
async fn reload_with_broken_manifest_fails_and_keeps_voices() {
    let test = setup();
    std::fs::write(test.dir.path().join(MANIFEST_FILE), "{broken").unwrap();

    let response = test
        .app
        .clone()
        .oneshot(post_json("/v1/voices/reload", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to reload voices"));

    let listed = body_json(test.app.clone().oneshot(get("/v1/voices")).await.unwrap()).await;
    assert_eq!(listed["total"], 2);
}
