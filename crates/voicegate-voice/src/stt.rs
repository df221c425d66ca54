use crate::config::SttRuntimeConfig;
use crate::error::VoiceError;
use crate::model::{TranscribeOptions, Transcriber};
use crate::runtime;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use voicegate_types::Transcript;

/// Maximum audio input size for STT (25 MiB), matching the OpenAI upload limit.
pub const MAX_STT_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcriber backed by an external whisper runtime.
///
/// Audio bytes in any container the runtime can decode are written to stdin.
/// With `--output-json` the runtime prints a single JSON object
/// `{"text": ..., "language": ..., "duration": ...}` to stdout.
#[derive(Debug, Clone)]
pub struct SttService {
    binary_path: PathBuf,
    model_name: String,
    device: String,
    compute_type: String,
}

impl SttService {
    pub fn new(
        binary_path: impl Into<PathBuf>,
        model_name: impl Into<String>,
        device: impl Into<String>,
        compute_type: impl Into<String>,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_name: model_name.into(),
            device: device.into(),
            compute_type: compute_type.into(),
        }
    }

    pub fn from_config(config: &SttRuntimeConfig) -> Self {
        Self::new(
            &config.runtime_binary,
            &config.model_name,
            &config.device,
            &config.compute_type,
        )
    }

    fn command(&self, options: &TranscribeOptions) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--model")
            .arg(&self.model_name)
            .arg("--device")
            .arg(&self.device)
            .arg("--compute-type")
            .arg(&self.compute_type)
            .arg("--beam-size")
            .arg(options.decoding.beam_size.to_string())
            .arg("--best-of")
            .arg(options.decoding.best_of.to_string());

        if options.decoding.vad_filter {
            command.arg("--vad-filter");
        }
        if let Some(language) = &options.language {
            command.arg("--language").arg(language);
        }
        command.arg("--output-json");
        command
    }
}

#[async_trait::async_trait]
impl Transcriber for SttService {
    async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<Transcript, VoiceError> {
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::InvalidInput(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let stdout = runtime::run(
            self.command(options),
            "STT runtime",
            Some(audio.to_vec()),
            STT_TIMEOUT,
        )
        .await
        .map_err(VoiceError::Stt)?;

        let mut transcript: Transcript = serde_json::from_slice(&stdout)
            .map_err(|e| VoiceError::Stt(format!("STT runtime returned invalid JSON: {}", e)))?;
        transcript.text = transcript.text.trim().to_string();
        Ok(transcript)
    }

    fn is_ready(&self) -> bool {
        !self.binary_path.as_os_str().is_empty()
    }
}
