use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("Voice not found: {0}")]
    UnknownVoice(String),

    #[error("Reference audio for voice '{voice}' not found: {}", .path.display())]
    ReferenceMissing { voice: String, path: PathBuf },

    #[error("Voice already exists: {0}")]
    VoiceExists(String),

    #[error("Invalid voice manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceError {
    /// Whether the error originated in an external model runtime.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Tts(_) | Self::Stt(_))
    }
}
