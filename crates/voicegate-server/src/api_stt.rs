//! OpenAI-compatible speech-to-text endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Extension, Multipart,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use voicegate_types::{TranscriptionFormat, TranscriptionResponse, VerboseTranscriptionResponse};
use voicegate_voice::MAX_STT_INPUT_BYTES;

/// Multipart fields of a transcription request.
#[derive(Debug, Default)]
struct TranscriptionForm {
    file: Option<Vec<u8>>,
    file_name: Option<String>,
    model: Option<String>,
    language: Option<String>,
    prompt: Option<String>,
    response_format: Option<String>,
    temperature: Option<f32>,
}

/// `size` is `None` when the upload was cut off before its length was known.
fn file_too_large(size: Option<usize>) -> ApiError {
    ApiError::BadRequest(match size {
        Some(size) => format!(
            "file too large: {} bytes (max {})",
            size, MAX_STT_INPUT_BYTES
        ),
        None => format!("file too large (max {} bytes)", MAX_STT_INPUT_BYTES),
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    // The body limit trips mid-stream, before the field length is known.
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_too_large(None);
    }
    ApiError::Unprocessable(format!("multipart error: {}", e))
}

async fn read_form(multipart: &mut Multipart) -> Result<TranscriptionForm, ApiError> {
    let mut form = TranscriptionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() > MAX_STT_INPUT_BYTES {
                    return Err(file_too_large(Some(data.len())));
                }
                form.file = Some(data.to_vec());
            }
            "model" => form.model = Some(field.text().await.map_err(multipart_error)?),
            "language" => form.language = Some(field.text().await.map_err(multipart_error)?),
            "prompt" => form.prompt = Some(field.text().await.map_err(multipart_error)?),
            "response_format" => {
                form.response_format = Some(field.text().await.map_err(multipart_error)?)
            }
            "temperature" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let parsed = raw.trim().parse::<f32>().map_err(|_| {
                    ApiError::Unprocessable(format!("temperature must be a number, got {:?}", raw))
                })?;
                form.temperature = Some(parsed);
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// Handler for `POST /v1/audio/transcriptions`.
///
/// `model` and `prompt` are accepted for compatibility and ignored.
pub async fn transcription_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart =
        multipart.map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))?;
    let form = read_form(&mut multipart).await?;

    let format = match form.response_format.as_deref() {
        None | Some("") => TranscriptionFormat::default(),
        Some(raw) => raw.parse::<TranscriptionFormat>().map_err(|e| {
            ApiError::BadRequest(format!("{}; expected json, text or verbose_json", e))
        })?,
    };

    let audio = form
        .file
        .ok_or_else(|| ApiError::Unprocessable("missing required field: file".to_string()))?;
    if audio.is_empty() {
        return Err(ApiError::BadRequest("Empty audio file".to_string()));
    }

    tracing::info!(
        file = form.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = audio.len(),
        model = form.model.as_deref().unwrap_or("whisper-1"),
        language = form.language.as_deref().unwrap_or("auto"),
        has_prompt = form.prompt.is_some(),
        %format,
        "transcription request"
    );

    let transcript = state
        .engine
        .transcribe(&audio, form.language.as_deref())
        .await?;

    let response = match format {
        TranscriptionFormat::Text => transcript.text.into_response(),
        TranscriptionFormat::Json => Json(TranscriptionResponse {
            text: transcript.text,
        })
        .into_response(),
        TranscriptionFormat::VerboseJson => Json(VerboseTranscriptionResponse::from_transcript(
            transcript,
            form.temperature,
        ))
        .into_response(),
    };
    Ok(response)
}
