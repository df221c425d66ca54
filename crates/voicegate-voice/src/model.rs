//! Seams between the gateway and the external model runtimes.
//!
//! The engine only talks to [`SpeechModel`] and [`Transcriber`] trait
//! objects. Production uses the subprocess runtimes in [`crate::tts`] and
//! [`crate::stt`]; tests substitute in-memory fakes.

use crate::error::VoiceError;
use std::fmt;
use std::path::Path;
use voicegate_types::Transcript;

/// A model-ready clone prompt computed from a reference recording.
///
/// The payload is opaque to the gateway: it is produced by the speech
/// runtime and handed back to it unchanged on every synthesis call.
#[derive(Clone, PartialEq, Eq)]
pub struct VoicePrompt {
    pub voice: String,
    pub data: Vec<u8>,
}

impl VoicePrompt {
    pub fn new(voice: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            voice: voice.into(),
            data,
        }
    }
}

impl fmt::Debug for VoicePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePrompt")
            .field("voice", &self.voice)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Decoding parameters forwarded to the transcription runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodingOptions {
    pub beam_size: u32,
    pub best_of: u32,
    pub vad_filter: bool,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            beam_size: 5,
            best_of: 5,
            vad_filter: true,
        }
    }
}

/// Per-request transcription options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscribeOptions {
    /// Language hint; `None` lets the runtime auto-detect.
    pub language: Option<String>,
    pub decoding: DecodingOptions,
}

/// Voice cloning and voice design model.
///
/// The underlying model is stateful and not safe for concurrent use; callers
/// serialize access (see [`crate::engine::VoiceEngine`]).
#[async_trait::async_trait]
pub trait SpeechModel: Send + Sync {
    /// Builds a clone prompt from a reference recording and its transcript.
    async fn create_voice_clone_prompt(
        &self,
        voice: &str,
        ref_audio: &Path,
        ref_text: &str,
    ) -> Result<VoicePrompt, VoiceError>;

    /// Synthesizes `text` in the voice captured by `prompt`. Returns WAV bytes.
    async fn generate_voice_clone(
        &self,
        text: &str,
        language: &str,
        prompt: &VoicePrompt,
    ) -> Result<Vec<u8>, VoiceError>;

    /// Synthesizes `text` in a new voice described by `instruct`. Returns WAV bytes.
    async fn generate_voice_design(
        &self,
        text: &str,
        language: &str,
        instruct: &str,
    ) -> Result<Vec<u8>, VoiceError>;

    /// Whether the cloning model is available.
    fn base_model_ready(&self) -> bool {
        true
    }

    /// Whether the voice design model is available.
    fn design_model_ready(&self) -> bool {
        true
    }
}

/// Speech-to-text model.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<Transcript, VoiceError>;

    fn is_ready(&self) -> bool {
        true
    }
}

/// Checks for a RIFF/WAVE header.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}
