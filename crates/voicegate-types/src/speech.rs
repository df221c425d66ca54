//! OpenAI-compatible speech and transcription types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum characters of text accepted by the speech endpoint.
pub const MAX_SPEECH_INPUT_CHARS: usize = 4096;

/// Accepted range for the `speed` field.
pub const MIN_SPEECH_SPEED: f32 = 0.25;
pub const MAX_SPEECH_SPEED: f32 = 4.0;

/// Request body of `POST /v1/audio/speech`.
///
/// `agent` is an extension to the OpenAI contract and takes precedence over
/// `voice` when selecting the cloned voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default = "default_speech_model")]
    pub model: String,
    pub input: String,
    #[serde(default = "default_openai_voice")]
    pub voice: String,
    #[serde(default)]
    pub response_format: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub agent: Option<String>,
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_openai_voice() -> String {
    "alloy".to_string()
}

/// Returned when a format string is not one the gateway can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported response format: {0}")]
pub struct UnsupportedFormat(pub String);

/// Audio container produced by the speech endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Wav,
}

impl AudioFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
        }
    }
}

impl FromStr for AudioFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

/// Shape of a transcription response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptionFormat {
    #[default]
    Json,
    Text,
    VerboseJson,
}

impl FromStr for TranscriptionFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "verbose_json" => Ok(Self::VerboseJson),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TranscriptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::VerboseJson => "verbose_json",
        })
    }
}

/// Result of a transcription as reported by the STT runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    /// Audio duration in seconds.
    #[serde(default)]
    pub duration: f64,
}

/// `{"text": ...}` body for the `json` format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Body for the `verbose_json` format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerboseTranscriptionResponse {
    pub task: String,
    pub language: Option<String>,
    pub duration: f64,
    pub text: String,
    pub segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    pub id: u32,
    pub seek: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub tokens: Vec<u32>,
    pub temperature: f32,
    pub avg_logprob: f64,
    pub compression_ratio: f64,
    pub no_speech_prob: f64,
}

impl VerboseTranscriptionResponse {
    /// Wraps a transcript as a single segment spanning the whole clip.
    ///
    /// The runtime returns joined text only, so segment-level timing is not
    /// available.
    pub fn from_transcript(transcript: Transcript, temperature: Option<f32>) -> Self {
        let segment = TranscriptionSegment {
            id: 0,
            seek: 0,
            start: 0.0,
            end: transcript.duration,
            text: transcript.text.clone(),
            tokens: Vec::new(),
            temperature: temperature.unwrap_or(0.0),
            avg_logprob: 0.0,
            compression_ratio: 1.0,
            no_speech_prob: 0.0,
        };
        Self {
            task: "transcribe".to_string(),
            language: transcript.language,
            duration: transcript.duration,
            text: transcript.text,
            segments: vec![segment],
        }
    }
}
