//! In-memory cache of voice clone prompts.
//!
//! Building a clone prompt runs the speech model over the reference
//! recording, which is slow and occupies the model. Each voice gets one slot;
//! concurrent requests for an uncached voice share a single computation.

use crate::error::VoiceError;
use crate::model::VoicePrompt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<VoicePrompt>>>;

/// Voice name -> clone prompt, populated on first use.
///
/// Uses `std::sync::Mutex` intentionally: the lock only guards slot lookup
/// and replacement and is never held across `.await`. Waiting for an
/// in-flight computation happens on the slot's `OnceCell`.
#[derive(Debug, Default)]
pub struct PromptCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // A panic while holding the lock cannot leave a slot half-written,
        // so the poisoned map is still consistent.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached prompt for `voice`, computing it on a miss.
    ///
    /// At most one `compute` runs per voice at a time; concurrent callers
    /// wait for it and receive the same `Arc`. A failed computation leaves
    /// the slot empty so the next caller retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        voice: &str,
        compute: F,
    ) -> Result<Arc<VoicePrompt>, VoiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VoicePrompt, VoiceError>>,
    {
        let slot = self.lock().entry(voice.to_string()).or_default().clone();

        let prompt = slot
            .get_or_try_init(|| async { compute().await.map(Arc::new) })
            .await?;
        Ok(prompt.clone())
    }

    /// Returns the cached prompt without computing.
    pub fn get(&self, voice: &str) -> Option<Arc<VoicePrompt>> {
        self.lock().get(voice).and_then(|slot| slot.get().cloned())
    }

    /// Stores `prompt` for `voice`, replacing any cached or in-flight entry.
    pub fn insert(&self, voice: &str, prompt: VoicePrompt) -> Arc<VoicePrompt> {
        let prompt = Arc::new(prompt);
        self.lock().insert(
            voice.to_string(),
            Arc::new(OnceCell::new_with(Some(prompt.clone()))),
        );
        prompt
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.get(voice).is_some()
    }

    /// Drops every slot. In-flight computations finish for their current
    /// waiters but are not visible to later lookups.
    pub fn invalidate_all(&self) {
        let mut slots = self.lock();
        let dropped = slots.len();
        slots.clear();
        tracing::debug!(dropped, "voice prompt cache invalidated");
    }

    /// Number of voices with a ready prompt.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of voices with a ready prompt, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(voice, _)| voice.clone())
            .collect();
        keys.sort();
        keys
    }
}
