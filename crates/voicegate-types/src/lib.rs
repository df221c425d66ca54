//! Shared types for the voicegate workspace.
//!
//! Wire-level request/response bodies and the voice manifest format. Both the
//! engine crate and the HTTP server depend on these, and integration tests use
//! them to decode responses.

pub mod speech;
pub mod voice;

pub use speech::{
    AudioFormat, SpeechRequest, Transcript, TranscriptionFormat, TranscriptionResponse,
    TranscriptionSegment, UnsupportedFormat, VerboseTranscriptionResponse,
    MAX_SPEECH_INPUT_CHARS, MAX_SPEECH_SPEED, MIN_SPEECH_SPEED,
};
pub use voice::{
    description_from_instruct, is_valid_agent_name, reference_text, CreateVoiceRequest,
    VoiceEntry, VoiceListResponse, VoiceManifest, VoiceSummary, DEFAULT_VOICE_NAME,
};
