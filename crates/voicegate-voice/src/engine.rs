//! Coordinates the registry, the prompt cache and the model runtimes.

use crate::error::VoiceError;
use crate::model::{DecodingOptions, SpeechModel, TranscribeOptions, Transcriber, VoicePrompt};
use crate::prompt_cache::PromptCache;
use crate::registry::VoiceRegistry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use voicegate_types::{
    description_from_instruct, is_valid_agent_name, reference_text, Transcript, VoiceEntry,
    VoiceSummary,
};

/// Engine settings that are not owned by a runtime.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Language passed to the speech model.
    pub language: String,
    pub decoding: DecodingOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            decoding: DecodingOptions::default(),
        }
    }
}

/// Snapshot reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub tts_base: bool,
    pub tts_voice_design: bool,
    pub stt: bool,
    pub voices_registered: usize,
    pub voices_loaded: usize,
}

/// Voice engine shared by all request handlers.
///
/// The speech model is stateful and must not run two calls at once, so every
/// call into it (prompt building, cloning, design) holds `model_guard`.
/// Transcription uses an independent runtime and is not serialized.
pub struct VoiceEngine {
    registry: VoiceRegistry,
    prompts: PromptCache,
    speech: Arc<dyn SpeechModel>,
    transcriber: Arc<dyn Transcriber>,
    model_guard: Mutex<()>,
    options: EngineOptions,
}

impl VoiceEngine {
    pub fn new(
        registry: VoiceRegistry,
        speech: Arc<dyn SpeechModel>,
        transcriber: Arc<dyn Transcriber>,
        options: EngineOptions,
    ) -> Self {
        Self {
            registry,
            prompts: PromptCache::new(),
            speech,
            transcriber,
            model_guard: Mutex::new(()),
            options,
        }
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    pub fn prompts(&self) -> &PromptCache {
        &self.prompts
    }

    /// Warms the prompt cache for every registered voice.
    ///
    /// Voices whose reference audio is missing or whose prompt fails to build
    /// are logged and skipped. Returns the number of cached prompts.
    pub async fn precompute_prompts(&self) -> usize {
        let started = Instant::now();
        for name in self.registry.voices().into_keys() {
            match self.prompt_for(&name).await {
                Ok(_) => tracing::info!(voice = %name, "voice prompt cached"),
                Err(VoiceError::ReferenceMissing { path, .. }) => {
                    tracing::warn!(voice = %name, path = %path.display(), "voice file not found");
                }
                Err(e) => tracing::error!(voice = %name, "failed to create voice prompt: {}", e),
            }
        }
        let cached = self.prompts.len();
        tracing::info!(
            cached,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "voice prompts precomputed"
        );
        cached
    }

    /// Returns the clone prompt for `voice`, building it on first use.
    pub async fn prompt_for(&self, voice: &str) -> Result<Arc<VoicePrompt>, VoiceError> {
        let path = self
            .registry
            .voice_file_path(voice)
            .ok_or_else(|| VoiceError::UnknownVoice(voice.to_string()))?;

        self.prompts
            .get_or_compute(voice, || async {
                if !path.exists() {
                    return Err(VoiceError::ReferenceMissing {
                        voice: voice.to_string(),
                        path: path.clone(),
                    });
                }
                let _guard = self.model_guard.lock().await;
                tracing::debug!(voice, "building voice clone prompt");
                self.speech
                    .create_voice_clone_prompt(voice, &path, &reference_text(voice))
                    .await
            })
            .await
    }

    /// Picks the voice for a speech request.
    ///
    /// An explicit `agent` must be registered. Otherwise the OpenAI `voice`
    /// field is used when it names a registered voice, and the manifest
    /// default when it does not.
    pub fn resolve_voice(
        &self,
        agent: Option<&str>,
        voice: Option<&str>,
    ) -> Result<String, VoiceError> {
        if let Some(agent) = agent.map(str::trim).filter(|a| !a.is_empty()) {
            return if self.registry.contains(agent) {
                Ok(agent.to_string())
            } else {
                Err(VoiceError::UnknownVoice(agent.to_string()))
            };
        }

        if let Some(voice) = voice.filter(|v| self.registry.contains(v)) {
            return Ok(voice.to_string());
        }

        let default = self.registry.default_voice();
        if self.registry.contains(&default) {
            Ok(default)
        } else {
            Err(VoiceError::UnknownVoice(default))
        }
    }

    /// Synthesizes `text` in a registered voice. Returns WAV bytes.
    pub async fn generate_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>, VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::InvalidInput("input text is empty".to_string()));
        }

        let prompt = self.prompt_for(voice).await?;

        let _guard = self.model_guard.lock().await;
        let started = Instant::now();
        tracing::info!(voice, text_length = text.chars().count(), "generating speech");
        let wav = self
            .speech
            .generate_voice_clone(text, &self.options.language, &prompt)
            .await?;
        tracing::debug!(
            voice,
            bytes = wav.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "speech generated"
        );
        Ok(wav)
    }

    /// Designs a new voice from a description and registers it.
    ///
    /// The design model speaks the agent's reference text; the recording is
    /// saved as `<agent>.wav`, added to the manifest, and its clone prompt is
    /// cached. Returns the recording.
    pub async fn create_voice(&self, agent: &str, instruct: &str) -> Result<Vec<u8>, VoiceError> {
        if !is_valid_agent_name(agent) {
            return Err(VoiceError::InvalidInput(
                "agent name must be alphanumeric (underscores allowed)".to_string(),
            ));
        }
        if instruct.trim().is_empty() {
            return Err(VoiceError::InvalidInput(
                "voice instruction is empty".to_string(),
            ));
        }

        // Checked under the guard so two creations of one name cannot race.
        let _guard = self.model_guard.lock().await;
        if self.registry.contains(agent) {
            return Err(VoiceError::VoiceExists(agent.to_string()));
        }

        tracing::info!(voice = agent, "creating voice");
        let ref_text = reference_text(agent);
        let wav = self
            .speech
            .generate_voice_design(&ref_text, &self.options.language, instruct)
            .await?;

        let file = format!("{}.wav", agent);
        let path = self.registry.directory().join(&file);
        tokio::fs::create_dir_all(self.registry.directory()).await?;
        tokio::fs::write(&path, &wav).await?;

        self.registry
            .add_voice(
                agent,
                VoiceEntry {
                    file,
                    description: description_from_instruct(instruct),
                    instruct: Some(instruct.to_string()),
                },
            )
            .await?;

        let prompt = self
            .speech
            .create_voice_clone_prompt(agent, &path, &ref_text)
            .await?;
        self.prompts.insert(agent, prompt);

        tracing::info!(voice = agent, bytes = wav.len(), "created voice");
        Ok(wav)
    }

    /// Re-reads the manifest, drops every cached prompt and rebuilds them.
    ///
    /// Returns the number of voices with a cached prompt afterwards.
    pub async fn reload(&self) -> Result<usize, VoiceError> {
        self.registry.reload()?;
        self.prompts.invalidate_all();
        Ok(self.precompute_prompts().await)
    }

    /// Transcribes uploaded audio with the configured decoding options.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        language: Option<&str>,
    ) -> Result<Transcript, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::InvalidInput("empty audio file".to_string()));
        }

        let options = TranscribeOptions {
            language: language
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            decoding: self.options.decoding,
        };

        let started = Instant::now();
        tracing::info!(
            bytes = audio.len(),
            language = options.language.as_deref().unwrap_or("auto"),
            "transcribing audio"
        );
        let transcript = self.transcriber.transcribe(audio, &options).await?;
        tracing::debug!(
            chars = transcript.text.chars().count(),
            language = transcript.language.as_deref().unwrap_or("unknown"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transcription complete"
        );
        Ok(transcript)
    }

    /// Registered voices with their prompt state, sorted by name.
    pub fn list_voices(&self) -> Vec<VoiceSummary> {
        self.registry
            .voices()
            .into_iter()
            .map(|(name, entry)| VoiceSummary {
                has_prompt: self.prompts.contains(&name),
                name,
                file: entry.file,
                description: entry.description,
            })
            .collect()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            tts_base: self.speech.base_model_ready(),
            tts_voice_design: self.speech.design_model_ready(),
            stt: self.transcriber.is_ready(),
            voices_registered: self.registry.len(),
            voices_loaded: self.prompts.len(),
        }
    }
}

impl std::fmt::Debug for VoiceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceEngine")
            .field("registry", &self.registry)
            .field("prompts", &self.prompts.keys())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
