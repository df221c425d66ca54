//! In-memory model fakes for tests.
//!
//! Enabled by the `test-utils` feature. The fakes record every call so tests
//! can assert how often the engine reached the model and with what options.

use crate::error::VoiceError;
use crate::model::{SpeechModel, TranscribeOptions, Transcriber, VoicePrompt};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use voicegate_types::Transcript;

/// Builds a minimal, valid 16-bit mono WAV file containing `samples`.
pub fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Speech model fake.
///
/// Prompts encode the voice name; cloned audio is a WAV file whose samples
/// encode the prompt length. Optionally sleeps inside each call so tests can
/// observe overlapping invocations.
#[derive(Debug, Default)]
pub struct FakeSpeechModel {
    pub prompt_calls: AtomicUsize,
    pub clone_calls: AtomicUsize,
    pub design_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    fail_prompts: AtomicBool,
    fail_synthesis: AtomicBool,
    delay: Option<Duration>,
    pub last_language: Mutex<Option<String>>,
    pub last_ref_text: Mutex<Option<String>>,
}

impl FakeSpeechModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call take `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn fail_prompts(&self, fail: bool) {
        self.fail_prompts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_synthesis(&self, fail: bool) {
        self.fail_synthesis.store(fail, Ordering::SeqCst);
    }

    pub fn prompt_calls(&self) -> usize {
        self.prompt_calls.load(Ordering::SeqCst)
    }

    pub fn clone_calls(&self) -> usize {
        self.clone_calls.load(Ordering::SeqCst)
    }

    pub fn design_calls(&self) -> usize {
        self.design_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SpeechModel for FakeSpeechModel {
    async fn create_voice_clone_prompt(
        &self,
        voice: &str,
        ref_audio: &Path,
        ref_text: &str,
    ) -> Result<VoicePrompt, VoiceError> {
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        *self
            .last_ref_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ref_text.to_string());
        let result = if self.fail_prompts.load(Ordering::SeqCst) {
            Err(VoiceError::Tts(format!(
                "prompt failed for {}",
                ref_audio.display()
            )))
        } else {
            Ok(VoicePrompt::new(voice, voice.as_bytes().to_vec()))
        };
        self.exit();
        result
    }

    async fn generate_voice_clone(
        &self,
        _text: &str,
        language: &str,
        prompt: &VoicePrompt,
    ) -> Result<Vec<u8>, VoiceError> {
        self.clone_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        *self
            .last_language
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(language.to_string());
        let result = if self.fail_synthesis.load(Ordering::SeqCst) {
            Err(VoiceError::Tts("synthesis failed".to_string()))
        } else {
            Ok(wav_bytes(&[prompt.data.len() as i16; 8], 24_000))
        };
        self.exit();
        result
    }

    async fn generate_voice_design(
        &self,
        _text: &str,
        language: &str,
        _instruct: &str,
    ) -> Result<Vec<u8>, VoiceError> {
        self.design_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        *self
            .last_language
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(language.to_string());
        let result = if self.fail_synthesis.load(Ordering::SeqCst) {
            Err(VoiceError::Tts("design failed".to_string()))
        } else {
            Ok(wav_bytes(&[1, 2, 3, 4], 24_000))
        };
        self.exit();
        result
    }
}

/// Transcriber fake returning a fixed transcript.
#[derive(Debug)]
pub struct FakeTranscriber {
    transcript: Transcript,
    pub calls: AtomicUsize,
    pub last_options: Mutex<Option<TranscribeOptions>>,
    fail: AtomicBool,
}

impl FakeTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            transcript: Transcript {
                text: text.to_string(),
                language: Some("en".to_string()),
                duration: 1.5,
            },
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<TranscribeOptions> {
        self.last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<Transcript, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(VoiceError::Stt("transcription failed".to_string()));
        }
        Ok(self.transcript.clone())
    }
}
