//! OpenAI-compatible text-to-speech endpoint.

use crate::api::{wav_response, ApiError, ApiJson};
use crate::AppState;
use axum::{extract::Extension, response::Response};
use std::sync::Arc;
use voicegate_types::{
    AudioFormat, SpeechRequest, MAX_SPEECH_INPUT_CHARS, MAX_SPEECH_SPEED, MIN_SPEECH_SPEED,
};

fn validate(request: &SpeechRequest) -> Result<AudioFormat, ApiError> {
    if request.input.chars().count() > MAX_SPEECH_INPUT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Input text exceeds {} character limit",
            MAX_SPEECH_INPUT_CHARS
        )));
    }
    if request.input.trim().is_empty() {
        return Err(ApiError::BadRequest("Input text is empty".to_string()));
    }
    if let Some(speed) = request.speed {
        if !(MIN_SPEECH_SPEED..=MAX_SPEECH_SPEED).contains(&speed) {
            return Err(ApiError::BadRequest(format!(
                "speed must be between {} and {}",
                MIN_SPEECH_SPEED, MAX_SPEECH_SPEED
            )));
        }
    }
    match request.response_format.as_deref() {
        None => Ok(AudioFormat::Wav),
        Some(format) => format.parse::<AudioFormat>().map_err(|e| {
            ApiError::BadRequest(format!("{}; only wav is supported", e))
        }),
    }
}

/// Handler for `POST /v1/audio/speech`.
///
/// The `agent` field selects a cloned voice; without it the OpenAI `voice`
/// is used when it names a registered voice, else the default voice.
/// `model` and `speed` are accepted for compatibility and do not change the
/// output.
pub async fn speech_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiJson(request): ApiJson<SpeechRequest>,
) -> Result<Response, ApiError> {
    let format = validate(&request)?;

    let voice = state
        .engine
        .resolve_voice(request.agent.as_deref(), Some(&request.voice))?;

    let audio = state.engine.generate_speech(&request.input, &voice).await?;

    tracing::info!(
        voice = %voice,
        model = %request.model,
        bytes = audio.len(),
        "speech request served"
    );
    Ok(wav_response(
        audio,
        &format!("speech.{}", format.extension()),
        &voice,
    ))
}
