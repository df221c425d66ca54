use crate::config::TtsRuntimeConfig;
use crate::error::VoiceError;
use crate::model::{is_wav, SpeechModel, VoicePrompt};
use crate::runtime;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Maximum text input size for TTS (64 KiB). The HTTP layer enforces a much
/// lower character limit; this guards direct library callers.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Maximum size of a voice design instruction.
const MAX_INSTRUCT_BYTES: usize = 4 * 1024;

/// Timeout for a synthesis call.
const TTS_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for building a clone prompt from reference audio.
const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Speech model backed by an external runtime executable.
///
/// The executable exposes three subcommands:
///
/// - `prompt --model <base> --ref-audio <wav> --ref-text <text>` writes an
///   opaque clone prompt to stdout.
/// - `clone --model <base> --language <lang> --text <text>` reads a clone
///   prompt from stdin and writes WAV to stdout.
/// - `design --model <design> --language <lang> --instruct <desc> --text <text>`
///   writes WAV to stdout.
#[derive(Debug, Clone)]
pub struct TtsService {
    binary: PathBuf,
    base_model: PathBuf,
    design_model: PathBuf,
}

impl TtsService {
    pub fn new(
        binary: impl Into<PathBuf>,
        base_model: impl Into<PathBuf>,
        design_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            base_model: base_model.into(),
            design_model: design_model.into(),
        }
    }

    pub fn from_config(config: &TtsRuntimeConfig) -> Self {
        Self::new(
            &config.runtime_binary,
            &config.base_model_path,
            &config.voice_design_model_path,
        )
    }

    fn check_text(text: &str) -> Result<(), VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::InvalidInput(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        Ok(())
    }

    fn require_model<'a>(&self, path: &'a Path, what: &str) -> Result<&'a Path, VoiceError> {
        if path.as_os_str().is_empty() {
            return Err(VoiceError::Config(format!(
                "{} model path is not configured",
                what
            )));
        }
        Ok(path)
    }

    async fn synthesize(
        &self,
        command: Command,
        input: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, VoiceError> {
        let wav = runtime::run(command, "TTS runtime", input, TTS_TIMEOUT)
            .await
            .map_err(VoiceError::Tts)?;

        if !is_wav(&wav) {
            return Err(VoiceError::Tts(format!(
                "TTS runtime returned {} bytes that are not WAV audio",
                wav.len()
            )));
        }
        tracing::debug!(bytes = wav.len(), "synthesized audio");
        Ok(wav)
    }
}

#[async_trait::async_trait]
impl SpeechModel for TtsService {
    async fn create_voice_clone_prompt(
        &self,
        voice: &str,
        ref_audio: &Path,
        ref_text: &str,
    ) -> Result<VoicePrompt, VoiceError> {
        let model = self.require_model(&self.base_model, "Base")?;

        let mut command = Command::new(&self.binary);
        command
            .arg("prompt")
            .arg("--model")
            .arg(model)
            .arg("--ref-audio")
            .arg(ref_audio)
            .arg("--ref-text")
            .arg(ref_text);

        let data = runtime::run(command, "TTS runtime", None, PROMPT_TIMEOUT)
            .await
            .map_err(VoiceError::Tts)?;

        if data.is_empty() {
            return Err(VoiceError::Tts(format!(
                "TTS runtime returned an empty prompt for voice '{}'",
                voice
            )));
        }
        Ok(VoicePrompt::new(voice, data))
    }

    async fn generate_voice_clone(
        &self,
        text: &str,
        language: &str,
        prompt: &VoicePrompt,
    ) -> Result<Vec<u8>, VoiceError> {
        Self::check_text(text)?;
        let model = self.require_model(&self.base_model, "Base")?;

        let mut command = Command::new(&self.binary);
        command
            .arg("clone")
            .arg("--model")
            .arg(model)
            .arg("--language")
            .arg(language)
            .arg("--text")
            .arg(text);

        self.synthesize(command, Some(prompt.data.clone())).await
    }

    async fn generate_voice_design(
        &self,
        text: &str,
        language: &str,
        instruct: &str,
    ) -> Result<Vec<u8>, VoiceError> {
        Self::check_text(text)?;
        if instruct.len() > MAX_INSTRUCT_BYTES {
            return Err(VoiceError::InvalidInput(format!(
                "instruction exceeds maximum size: {} bytes (limit: {} bytes)",
                instruct.len(),
                MAX_INSTRUCT_BYTES
            )));
        }
        let model = self.require_model(&self.design_model, "VoiceDesign")?;

        let mut command = Command::new(&self.binary);
        command
            .arg("design")
            .arg("--model")
            .arg(model)
            .arg("--language")
            .arg(language)
            .arg("--instruct")
            .arg(instruct)
            .arg("--text")
            .arg(text);

        self.synthesize(command, None).await
    }

    fn base_model_ready(&self) -> bool {
        !self.base_model.as_os_str().is_empty() && self.base_model.exists()
    }

    fn design_model_ready(&self) -> bool {
        !self.design_model.as_os_str().is_empty() && self.design_model.exists()
    }
}
