//! Shared API plumbing: error mapping, request extractors, info routes.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, FromRequest, Request},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use voicegate_types::AudioFormat;
use voicegate_voice::VoiceError;

/// Custom response header naming the voice that produced the audio.
pub const AGENT_VOICE_HEADER: HeaderName = HeaderName::from_static("x-agent-voice");

/// API error type mapping to HTTP status codes.
///
/// Every variant renders as `{"detail": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable request: {0}")]
    Unprocessable(String),
    #[error("upstream model failure: {0}")]
    BadGateway(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidInput(msg) => ApiError::BadRequest(msg),
            VoiceError::UnknownVoice(name) => {
                ApiError::NotFound(format!("Voice '{}' not found", name))
            }
            VoiceError::ReferenceMissing { voice, .. } => {
                ApiError::NotFound(format!("Reference audio for voice '{}' not found", voice))
            }
            VoiceError::VoiceExists(name) => ApiError::Conflict(format!(
                "Voice for agent '{}' already exists. Delete it first to recreate.",
                name
            )),
            e @ (VoiceError::Tts(_) | VoiceError::Stt(_)) => {
                tracing::error!("model runtime failed: {}", e);
                ApiError::BadGateway(e.to_string())
            }
            e => {
                tracing::error!("voice engine error: {}", e);
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

/// JSON body extractor whose rejections render as 422 `{"detail"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(status = %rejection.status(), "rejected request body");
    ApiError::Unprocessable(rejection.body_text())
}

/// Builds a WAV download response with the voice header set.
pub(crate) fn wav_response(audio: Vec<u8>, filename: &str, voice: &str) -> Response {
    let format = AudioFormat::Wav;
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
            (AGENT_VOICE_HEADER, voice.to_string()),
        ],
        audio,
    )
        .into_response()
}

/// Handler for `GET /`.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": "voicegate",
        "description": "OpenAI-compatible text-to-speech and speech-to-text gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "tts": "/v1/audio/speech",
            "stt": "/v1/audio/transcriptions",
            "voices": "/v1/voices",
            "health": "/health",
        },
    }))
}

/// Handler for `GET /health`.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let status = state.engine.status();
    Json(json!({
        "status": "healthy",
        "host": state.config.server.host.to_string(),
        "port": state.config.server.port,
        "models": {
            "tts_base": status.tts_base,
            "tts_voice_design": status.tts_voice_design,
            "stt": status.stt,
        },
        "voices_loaded": status.voices_loaded,
        "auth_enabled": state.config.server.api_key().is_some(),
    }))
}
