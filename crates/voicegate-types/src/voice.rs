//! Voice manifest definitions.
//!
//! The manifest (`voices.json`) maps agent names to a reference recording and
//! a short description. The recording is what the speech model clones from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Voice used when the manifest does not name one.
pub const DEFAULT_VOICE_NAME: &str = "da";

/// Maximum length of an agent name accepted for voice creation.
pub const MAX_AGENT_NAME_LEN: usize = 64;

/// Descriptions derived from a design instruction are cut to this many chars.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

/// A single entry in the voice manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// Reference audio file, relative to the voices directory.
    pub file: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Instruction the voice was designed from, if it was created through the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruct: Option<String>,
}

/// The on-disk voice manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceManifest {
    #[serde(default = "default_voice_name")]
    pub default_voice: String,
    #[serde(default)]
    pub voices: BTreeMap<String, VoiceEntry>,
}

fn default_voice_name() -> String {
    DEFAULT_VOICE_NAME.to_string()
}

impl Default for VoiceManifest {
    fn default() -> Self {
        Self {
            default_voice: default_voice_name(),
            voices: BTreeMap::new(),
        }
    }
}

/// A voice as reported by `GET /v1/voices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSummary {
    pub name: String,
    pub file: String,
    pub description: String,
    /// Whether a clone prompt for this voice is currently cached.
    pub has_prompt: bool,
}

/// Response body of `GET /v1/voices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceListResponse {
    pub voices: Vec<VoiceSummary>,
    pub default_voice: String,
    pub total: usize,
}

/// Request body of `POST /v1/voices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVoiceRequest {
    pub agent_name: String,
    pub instruct: String,
}

/// Returns the transcript spoken in every reference recording.
///
/// The recording for `agent` says exactly this sentence, so the clone prompt
/// pairs the audio with it.
pub fn reference_text(agent: &str) -> String {
    format!(
        "Hello there! I'm {}, your AI assistant. What are we doing?",
        capitalize(agent)
    )
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Checks that `name` is usable as an agent name and voice file stem.
pub fn is_valid_agent_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_AGENT_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Derives a manifest description from a design instruction.
pub fn description_from_instruct(instruct: &str) -> String {
    instruct.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_text_capitalizes_agent() {
        let text = reference_text("analysis");
        assert_eq!(
            text,
            "Hello there! I'm Analysis, your AI assistant. What are we doing?"
        );
        assert!(reference_text("DA").contains("I'm Da,"));
    }

    #[test]
    fn agent_name_validation() {
        assert!(is_valid_agent_name("analysis"));
        assert!(is_valid_agent_name("code_review2"));
        assert!(!is_valid_agent_name(""));
        assert!(!is_valid_agent_name("../etc"));
        assert!(!is_valid_agent_name("has space"));
        assert!(!is_valid_agent_name(&"a".repeat(MAX_AGENT_NAME_LEN + 1)));
    }

    #[test]
    fn manifest_defaults_when_fields_missing() {
        let manifest: VoiceManifest = serde_json::from_str("{}").unwrap();
        assert_eq!(manifest.default_voice, DEFAULT_VOICE_NAME);
        assert!(manifest.voices.is_empty());

        let manifest: VoiceManifest = serde_json::from_str(
            r#"{"voices": {"analysis": {"file": "analysis.wav"}}}"#,
        )
        .unwrap();
        let entry = &manifest.voices["analysis"];
        assert_eq!(entry.description, "");
        assert_eq!(entry.instruct, None);
    }

    #[test]
    fn description_is_truncated_on_char_boundary() {
        let long = "é".repeat(150);
        assert_eq!(description_from_instruct(&long).chars().count(), 100);
        assert_eq!(description_from_instruct("short"), "short");
    }
}
