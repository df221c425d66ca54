use crate::model::DecodingOptions;
use serde::Deserialize;
use std::path::PathBuf;

fn default_tts_binary() -> PathBuf {
    PathBuf::from("qwen-tts")
}

fn default_language() -> String {
    "English".to_string()
}

fn default_stt_binary() -> PathBuf {
    PathBuf::from("whisper-transcribe")
}

fn default_stt_model_name() -> String {
    "base".to_string()
}

fn default_stt_device() -> String {
    "cuda".to_string()
}

fn default_stt_compute_type() -> String {
    "float16".to_string()
}

fn default_beam_size() -> u32 {
    5
}

fn default_best_of() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

/// Settings for the speech (voice cloning and voice design) runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct TtsRuntimeConfig {
    /// Executable wrapping the TTS models.
    #[serde(default = "default_tts_binary")]
    pub runtime_binary: PathBuf,
    /// Base model used for voice cloning. Required.
    #[serde(default)]
    pub base_model_path: PathBuf,
    /// VoiceDesign model used to create new voices. Required.
    #[serde(default)]
    pub voice_design_model_path: PathBuf,
    /// Language passed to every synthesis call.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TtsRuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_binary: default_tts_binary(),
            base_model_path: PathBuf::new(),
            voice_design_model_path: PathBuf::new(),
            language: default_language(),
        }
    }
}

/// Settings for the transcription runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct SttRuntimeConfig {
    #[serde(default = "default_stt_binary")]
    pub runtime_binary: PathBuf,
    /// Whisper model size (tiny, base, small, medium, large).
    #[serde(default = "default_stt_model_name")]
    pub model_name: String,
    #[serde(default = "default_stt_device")]
    pub device: String,
    #[serde(default = "default_stt_compute_type")]
    pub compute_type: String,
    #[serde(default = "default_beam_size")]
    pub beam_size: u32,
    #[serde(default = "default_best_of")]
    pub best_of: u32,
    /// Skip non-speech regions before decoding.
    #[serde(default = "default_true")]
    pub vad_filter: bool,
}

impl Default for SttRuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_binary: default_stt_binary(),
            model_name: default_stt_model_name(),
            device: default_stt_device(),
            compute_type: default_stt_compute_type(),
            beam_size: default_beam_size(),
            best_of: default_best_of(),
            vad_filter: true,
        }
    }
}

impl SttRuntimeConfig {
    pub fn decoding(&self) -> DecodingOptions {
        DecodingOptions {
            beam_size: self.beam_size,
            best_of: self.best_of,
            vad_filter: self.vad_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stt_defaults_match_runtime_defaults() {
        let config = SttRuntimeConfig::default();
        assert_eq!(config.beam_size, 5);
        assert_eq!(config.best_of, 5);
        assert!(config.vad_filter);
        assert_eq!(config.model_name, "base");
        assert_eq!(config.decoding(), DecodingOptions::default());
    }

    #[test]
    fn tts_defaults_leave_model_paths_unset() {
        let config = TtsRuntimeConfig::default();
        assert!(config.base_model_path.as_os_str().is_empty());
        assert!(config.voice_design_model_path.as_os_str().is_empty());
        assert_eq!(config.language, "English");
    }
}
