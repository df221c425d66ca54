//! Voice engine for the voicegate speech gateway.
//!
//! Owns the voice registry (`voices.json`), the per-voice clone prompt cache,
//! and the seams to the external model runtimes: a voice cloning / voice
//! design speech model and a speech-to-text transcriber.
//!
//! The speech model is not safe for concurrent use. [`VoiceEngine`] serializes
//! every call into it and guarantees that a voice's clone prompt is built at
//! most once, however many requests ask for it concurrently.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod prompt_cache;
pub mod registry;
mod runtime;
pub mod stt;
pub mod tts;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{SttRuntimeConfig, TtsRuntimeConfig};
pub use engine::{EngineOptions, EngineStatus, VoiceEngine};
pub use error::VoiceError;
pub use model::{
    is_wav, DecodingOptions, SpeechModel, TranscribeOptions, Transcriber, VoicePrompt,
};
pub use prompt_cache::PromptCache;
pub use registry::{VoiceRegistry, MANIFEST_FILE};
pub use stt::{SttService, MAX_STT_INPUT_BYTES};
pub use tts::TtsService;
