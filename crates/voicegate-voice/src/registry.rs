//! Voice registry backed by `voices.json`.

use crate::error::VoiceError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;
use voicegate_types::{VoiceEntry, VoiceManifest};

/// File name of the manifest inside the voices directory.
pub const MANIFEST_FILE: &str = "voices.json";

/// Maps agent names to reference recordings.
///
/// Uses `std::sync::RwLock` intentionally: every acquisition is a short
/// clone or swap of the manifest that never spans an `.await`. File writes
/// happen outside it, serialized by `persist_lock`.
#[derive(Debug)]
pub struct VoiceRegistry {
    directory: PathBuf,
    manifest: RwLock<VoiceManifest>,
    persist_lock: Mutex<()>,
}

impl VoiceRegistry {
    /// Loads the manifest from `<directory>/voices.json`.
    ///
    /// A missing manifest is not an error: the registry starts empty with the
    /// default voice name.
    pub fn load(directory: impl Into<PathBuf>) -> Result<Self, VoiceError> {
        let directory = directory.into();
        let manifest = read_manifest(&directory.join(MANIFEST_FILE))?;
        tracing::info!(
            path = %directory.display(),
            voices = manifest.voices.len(),
            default_voice = %manifest.default_voice,
            "loaded voice manifest"
        );
        Ok(Self {
            directory,
            manifest: RwLock::new(manifest),
            persist_lock: Mutex::new(()),
        })
    }

    /// Re-reads the manifest from disk. On error the current manifest is kept.
    pub fn reload(&self) -> Result<usize, VoiceError> {
        let manifest = read_manifest(&self.manifest_path())?;
        let count = manifest.voices.len();
        *self.manifest.write().unwrap_or_else(PoisonError::into_inner) = manifest;
        tracing::info!(voices = count, "reloaded voice manifest");
        Ok(count)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.directory.join(MANIFEST_FILE)
    }

    /// Snapshot of the whole manifest.
    pub fn manifest(&self) -> VoiceManifest {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn voices(&self) -> BTreeMap<String, VoiceEntry> {
        self.manifest().voices
    }

    pub fn default_voice(&self) -> String {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_voice
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<VoiceEntry> {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .voices
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .voices
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .voices
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute path of the reference recording for `name`.
    pub fn voice_file_path(&self, name: &str) -> Option<PathBuf> {
        self.get(name).map(|entry| self.directory.join(entry.file))
    }

    /// Adds or replaces a voice and persists the manifest.
    ///
    /// The in-memory manifest only changes once the file has been written.
    pub async fn add_voice(&self, name: &str, entry: VoiceEntry) -> Result<(), VoiceError> {
        let _persist = self.persist_lock.lock().await;

        let mut updated = self.manifest();
        updated.voices.insert(name.to_string(), entry.clone());
        write_manifest(&self.manifest_path(), &updated).await?;

        self.manifest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .voices
            .insert(name.to_string(), entry);
        tracing::info!(voice = name, "registered voice");
        Ok(())
    }
}

fn read_manifest(path: &Path) -> Result<VoiceManifest, VoiceError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "voice manifest not found, starting empty");
            return Ok(VoiceManifest::default());
        }
        Err(e) => return Err(VoiceError::Io(e)),
    };
    serde_json::from_str(&contents).map_err(|source| VoiceError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes through a temporary file so a crash never leaves a truncated manifest.
async fn write_manifest(path: &Path, manifest: &VoiceManifest) -> Result<(), VoiceError> {
    let json = serde_json::to_string_pretty(manifest).map_err(|source| VoiceError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
