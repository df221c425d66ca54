//! Voice management endpoints.

use crate::api::{wav_response, ApiError, ApiJson};
use crate::AppState;
use axum::{extract::Extension, response::Response, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use voicegate_types::{CreateVoiceRequest, VoiceListResponse};

/// Handler for `GET /v1/voices`.
pub async fn list_voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<VoiceListResponse> {
    let voices = state.engine.list_voices();
    Json(VoiceListResponse {
        total: voices.len(),
        default_voice: state.engine.registry().default_voice(),
        voices,
    })
}

/// Handler for `POST /v1/voices`.
///
/// Designs a voice from `instruct`, registers it under `agent_name` and
/// returns the reference recording.
pub async fn create_voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateVoiceRequest>,
) -> Result<Response, ApiError> {
    let agent = request.agent_name.as_str();
    tracing::info!(agent, "voice creation requested");

    let audio = state.engine.create_voice(agent, &request.instruct).await?;

    Ok(wav_response(audio, &format!("{}.wav", agent), agent))
}

/// Handler for `POST /v1/voices/reload`.
pub async fn reload_voices_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let loaded = state.engine.reload().await.map_err(|e| {
        tracing::error!("voice reload failed: {}", e);
        ApiError::InternalServerError(format!("Failed to reload voices: {}", e))
    })?;

    Ok(Json(json!({
        "status": "success",
        "voices_loaded": loaded,
        "message": "Voice configuration reloaded successfully",
    })))
}
