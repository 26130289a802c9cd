//! Persistent custom voices
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<name>/meta.json   voice metadata
//! <root>/<name>/prompt.pt   embedding (clone prompt or design description)
//! ```
//!
//! Metadata is read for every voice at startup; embeddings stay on disk until
//! a generation request needs them. A voice directory is assembled in a hidden
//! staging directory and renamed into place in one step, so a voice is either
//! fully present on disk or absent.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::ReferenceAudio;
use crate::core::error::{Result, TtsError};
use crate::engine::{GenerationMode, GenerationRequest, ModelVariant, SpeechBackend, VoicePrompt};
use crate::text::Language;
use crate::voice::presets::{is_native, native_names};

pub const META_FILE: &str = "meta.json";
pub const EMBEDDING_FILE: &str = "prompt.pt";
const STAGING_PREFIX: &str = ".staging-";
const META_VERSION: &str = "1.0";
const NAME_MIN_LEN: usize = 3;
const NAME_MAX_LEN: usize = 50;

/// Sentence synthesized once to check a voice description is usable
const DESIGN_CHECK_TEXT: &str = "Test de voix.";

/// How a custom voice was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSource {
    Clone,
    Design,
}

impl VoiceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Design => "design",
        }
    }
}

impl std::str::FromStr for VoiceSource {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clone" => Ok(Self::Clone),
            "design" => Ok(Self::Design),
            _ => Err(TtsError::validation("source", "source must be 'clone' or 'design'")),
        }
    }
}

/// Contents of `meta.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceMeta {
    pub name: String,
    pub source: VoiceSource,
    pub model: ModelVariant,
    #[serde(default)]
    pub description: String,
    /// Language code the voice was created with
    pub language: String,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    META_VERSION.to_string()
}

/// Loaded embedding
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEmbedding {
    /// Clone prompt for the base model of the recorded variant
    Clone(Arc<VoicePrompt>),
    /// Description replayed verbatim on every design generation
    Design {
        voice_description: String,
        /// Full language name
        language: String,
    },
}

/// On-disk form of [`VoiceEmbedding`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StoredEmbedding {
    Clone { prompt: String },
    Design { voice_description: String, language: String },
}

impl From<&VoiceEmbedding> for StoredEmbedding {
    fn from(embedding: &VoiceEmbedding) -> Self {
        match embedding {
            VoiceEmbedding::Clone(prompt) => StoredEmbedding::Clone {
                prompt: BASE64.encode(prompt.as_bytes()),
            },
            VoiceEmbedding::Design { voice_description, language } => StoredEmbedding::Design {
                voice_description: voice_description.clone(),
                language: language.clone(),
            },
        }
    }
}

impl StoredEmbedding {
    fn into_embedding(self) -> Result<VoiceEmbedding> {
        match self {
            StoredEmbedding::Clone { prompt } => {
                let data = BASE64
                    .decode(prompt)
                    .map_err(|e| TtsError::internal(format!("corrupt clone prompt: {}", e)))?;
                Ok(VoiceEmbedding::Clone(Arc::new(VoicePrompt::new(data))))
            }
            StoredEmbedding::Design { voice_description, language } => {
                Ok(VoiceEmbedding::Design { voice_description, language })
            }
        }
    }
}

/// In-memory embedding state
#[derive(Debug, Clone)]
enum EmbeddingState {
    /// Not read from disk yet
    Unloaded,
    Loaded(Arc<VoiceEmbedding>),
    /// Read attempted and failed; not retried for the process lifetime
    LoadFailed,
}

#[derive(Debug, Clone)]
struct VoiceRecord {
    meta: VoiceMeta,
    embedding: EmbeddingState,
}

/// Metadata plus on-disk and in-memory embedding status
#[derive(Debug, Clone)]
pub struct VoiceDetails {
    pub meta: VoiceMeta,
    pub file_size_bytes: u64,
    pub loaded_in_memory: bool,
}

/// Source-specific inputs for a new voice
#[derive(Debug, Clone, Copy)]
pub enum VoiceOrigin<'a> {
    Clone {
        reference: &'a ReferenceAudio,
        reference_text: &'a str,
    },
    Design {
        voice_description: &'a str,
    },
}

/// A materialize request
#[derive(Debug, Clone, Copy)]
pub struct CreateVoice<'a> {
    pub name: &'a str,
    pub model: ModelVariant,
    pub description: &'a str,
    pub language: Language,
    pub origin: VoiceOrigin<'a>,
}

/// Name rules: 3-50 chars of `[A-Za-z0-9_-]`, not a native voice
pub fn validate_name(name: &str) -> bool {
    (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !is_native(name)
}

/// [`validate_name`] as a validation error carrying the rules
pub fn check_name(name: &str) -> Result<()> {
    if validate_name(name) {
        return Ok(());
    }
    Err(TtsError::validation(
        "name",
        format!(
            "invalid name: {}-{} chars of letters, digits, '-' or '_', and not a native voice ({})",
            NAME_MIN_LEN,
            NAME_MAX_LEN,
            native_names().join(", ")
        ),
    ))
}

/// Cut to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Releases a name reservation when creation ends, successful or not
struct Reservation<'a> {
    names: &'a Mutex<HashSet<String>>,
    name: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

/// Removes a staging directory unless disarmed
struct StagingDir {
    path: PathBuf,
    armed: bool,
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to remove staging directory {:?}: {}", self.path, e);
            }
        }
    }
}

/// Disk-backed custom voice index
pub struct CustomVoiceStore {
    root: PathBuf,
    description_limit: usize,
    voices: RwLock<HashMap<String, VoiceRecord>>,
    reservations: Mutex<HashSet<String>>,
}

impl CustomVoiceStore {
    /// Open the store, creating the root if needed, and scan it
    pub fn open(root: impl Into<PathBuf>, description_limit: usize) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TtsError::Io {
            message: format!("cannot create custom voices directory: {}", e),
            path: Some(root.clone()),
        })?;

        let voices = Self::scan(&root)?;
        info!("Loaded {} custom voice(s) from {:?}", voices.len(), root);

        Ok(Self {
            root,
            description_limit,
            voices: RwLock::new(voices),
            reservations: Mutex::new(HashSet::new()),
        })
    }

    fn scan(root: &Path) -> Result<HashMap<String, VoiceRecord>> {
        let mut voices = HashMap::new();

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            let dir_name = entry.file_name().to_string_lossy().into_owned();

            if dir_name.starts_with(STAGING_PREFIX) {
                warn!("Removing leftover staging directory {:?}", path);
                if let Err(e) = fs::remove_dir_all(&path) {
                    warn!("Failed to remove {:?}: {}", path, e);
                }
                continue;
            }
            if dir_name.starts_with('.') || !path.is_dir() {
                continue;
            }
            if !validate_name(&dir_name) {
                warn!("Ignoring custom voice directory with invalid name {:?}", dir_name);
                continue;
            }

            let meta_path = path.join(META_FILE);
            if !meta_path.exists() {
                debug!("Skipping {:?}: no {}", path, META_FILE);
                continue;
            }

            match Self::read_meta(&meta_path) {
                Ok(mut meta) => {
                    // Directory name is authoritative
                    meta.name = dir_name.clone();
                    voices.insert(
                        dir_name,
                        VoiceRecord {
                            meta,
                            embedding: EmbeddingState::Unloaded,
                        },
                    );
                }
                Err(e) => warn!("Failed to load custom voice {:?}: {}", dir_name, e),
            }
        }

        Ok(voices)
    }

    fn read_meta(path: &Path) -> Result<VoiceMeta> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn read_embedding(path: &Path) -> Result<VoiceEmbedding> {
        let content = fs::read(path)?;
        let stored: StoredEmbedding = serde_json::from_slice(&content)?;
        stored.into_embedding()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn voice_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn reserve(&self, name: &str) -> Result<Reservation<'_>> {
        let mut reserved = self.reservations.lock().unwrap_or_else(PoisonError::into_inner);
        let exists = self
            .voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name);

        if exists || reserved.contains(name) {
            return Err(TtsError::validation(
                "name",
                format!("a custom voice named '{}' already exists", name),
            ));
        }

        reserved.insert(name.to_string());
        Ok(Reservation {
            names: &self.reservations,
            name: name.to_string(),
        })
    }

    /// Materialize a custom voice
    ///
    /// Makes exactly one backend call, then persists and indexes the voice.
    /// On any failure nothing is left on disk or in the index.
    pub async fn create(
        &self,
        backend: &dyn SpeechBackend,
        request: CreateVoice<'_>,
    ) -> Result<VoiceMeta> {
        check_name(request.name)?;

        match request.origin {
            VoiceOrigin::Clone { reference_text, .. } if reference_text.trim().is_empty() => {
                return Err(TtsError::validation(
                    "reference_text",
                    "reference_text is required for source=clone",
                ));
            }
            VoiceOrigin::Design { voice_description } if voice_description.trim().is_empty() => {
                return Err(TtsError::validation(
                    "voice_description",
                    "voice_description is required for source=design",
                ));
            }
            _ => {}
        }

        let _reservation = self.reserve(request.name)?;

        let (source, embedding) = match request.origin {
            VoiceOrigin::Clone { reference, reference_text } => {
                let prompt = backend
                    .create_voice_clone_prompt(request.model, reference, reference_text)
                    .await?;
                (VoiceSource::Clone, VoiceEmbedding::Clone(Arc::new(prompt)))
            }
            VoiceOrigin::Design { voice_description } => {
                backend
                    .generate(&GenerationRequest {
                        text: DESIGN_CHECK_TEXT,
                        language: request.language.name(),
                        mode: GenerationMode::Design { instruct: voice_description },
                    })
                    .await?;
                (
                    VoiceSource::Design,
                    VoiceEmbedding::Design {
                        voice_description: voice_description.to_string(),
                        language: request.language.name().to_string(),
                    },
                )
            }
        };

        let meta = VoiceMeta {
            name: request.name.to_string(),
            source,
            model: request.model,
            description: truncate_chars(request.description, self.description_limit).to_string(),
            language: request.language.code().to_string(),
            created_at: Utc::now(),
            version: META_VERSION.to_string(),
        };

        self.persist(&meta, &embedding)?;

        self.voices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                meta.name.clone(),
                VoiceRecord {
                    meta: meta.clone(),
                    embedding: EmbeddingState::Loaded(Arc::new(embedding)),
                },
            );

        info!("Created custom voice '{}' ({}, {})", meta.name, meta.source.as_str(), meta.model);
        Ok(meta)
    }

    /// Write into a staging directory, then rename it into place
    fn persist(&self, meta: &VoiceMeta, embedding: &VoiceEmbedding) -> Result<()> {
        let staging = StagingDir {
            path: self
                .root
                .join(format!("{}{}-{}", STAGING_PREFIX, meta.name, Uuid::new_v4().simple())),
            armed: true,
        };
        let target = self.voice_dir(&meta.name);
        let io_err = |path: &Path, e: std::io::Error| TtsError::Io {
            message: e.to_string(),
            path: Some(path.to_path_buf()),
        };

        fs::create_dir_all(&staging.path).map_err(|e| io_err(&staging.path, e))?;

        let meta_path = staging.path.join(META_FILE);
        fs::write(&meta_path, serde_json::to_vec_pretty(meta)?).map_err(|e| io_err(&meta_path, e))?;

        let tmp_path = staging.path.join(format!("{}.tmp", EMBEDDING_FILE));
        let embedding_path = staging.path.join(EMBEDDING_FILE);
        fs::write(&tmp_path, serde_json::to_vec(&StoredEmbedding::from(embedding))?)
            .map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &embedding_path).map_err(|e| io_err(&embedding_path, e))?;

        // The name is reserved and unindexed, so a directory here is debris
        // from an interrupted create or delete
        if target.is_dir() {
            warn!("Replacing unindexed voice directory {:?}", target);
            fs::remove_dir_all(&target).map_err(|e| io_err(&target, e))?;
        } else if target.exists() {
            return Err(TtsError::Io {
                message: format!("'{}' already exists in the voices directory", meta.name),
                path: Some(target),
            });
        }
        fs::rename(&staging.path, &target).map_err(|e| io_err(&target, e))?;

        let mut staging = staging;
        staging.armed = false;
        Ok(())
    }

    /// Embedding for `name`, loading it from disk on first use
    ///
    /// `None` for unknown voices and for voices whose artifact is missing or
    /// unreadable; the failure is logged.
    pub fn get_embedding(&self, name: &str) -> Option<Arc<VoiceEmbedding>> {
        {
            let voices = self.voices.read().unwrap_or_else(PoisonError::into_inner);
            match &voices.get(name)?.embedding {
                EmbeddingState::Loaded(embedding) => return Some(Arc::clone(embedding)),
                EmbeddingState::LoadFailed => return None,
                EmbeddingState::Unloaded => {}
            }
        }

        // Read without holding the index lock
        let path = self.voice_dir(name).join(EMBEDDING_FILE);
        let loaded = Self::read_embedding(&path);

        let mut voices = self.voices.write().unwrap_or_else(PoisonError::into_inner);
        let record = voices.get_mut(name)?;

        // Another request may have settled it in the meantime
        match &record.embedding {
            EmbeddingState::Loaded(embedding) => return Some(Arc::clone(embedding)),
            EmbeddingState::LoadFailed => return None,
            EmbeddingState::Unloaded => {}
        }

        match loaded {
            Ok(embedding) => {
                debug!("Loaded embedding for custom voice '{}'", name);
                let embedding = Arc::new(embedding);
                record.embedding = EmbeddingState::Loaded(Arc::clone(&embedding));
                Some(embedding)
            }
            Err(e) => {
                warn!("Failed to load embedding for custom voice '{}' from {:?}: {}", name, path, e);
                record.embedding = EmbeddingState::LoadFailed;
                None
            }
        }
    }

    /// Delete a custom voice from disk and memory
    ///
    /// Native voices are refused; unknown names return `false`.
    pub fn delete(&self, name: &str) -> Result<bool> {
        if is_native(name) {
            return Err(TtsError::Forbidden {
                message: format!("cannot delete native voice '{}'", name),
            });
        }

        let mut voices = self.voices.write().unwrap_or_else(PoisonError::into_inner);
        if !voices.contains_key(name) {
            return Ok(false);
        }

        let dir = self.voice_dir(name);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| TtsError::Io {
                message: format!("failed to remove voice directory: {}", e),
                path: Some(dir.clone()),
            })?;
        }
        voices.remove(name);

        info!("Deleted custom voice '{}'", name);
        Ok(true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn meta(&self, name: &str) -> Option<VoiceMeta> {
        self.voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|r| r.meta.clone())
    }

    /// All metadata, sorted by name
    pub fn list(&self) -> Vec<VoiceMeta> {
        let voices = self.voices.read().unwrap_or_else(PoisonError::into_inner);
        let mut metas: Vec<VoiceMeta> = voices.values().map(|r| r.meta.clone()).collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        metas
    }

    /// Custom voice names, sorted
    pub fn names(&self) -> Vec<String> {
        let voices = self.voices.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = voices.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn details(&self, name: &str) -> Option<VoiceDetails> {
        let (meta, loaded_in_memory) = {
            let voices = self.voices.read().unwrap_or_else(PoisonError::into_inner);
            let record = voices.get(name)?;
            (
                record.meta.clone(),
                matches!(record.embedding, EmbeddingState::Loaded(_)),
            )
        };

        let file_size_bytes = fs::metadata(self.voice_dir(name).join(EMBEDDING_FILE))
            .map(|m| m.len())
            .unwrap_or(0);

        Some(VoiceDetails {
            meta,
            file_size_bytes,
            loaded_in_memory,
        })
    }

    pub fn len(&self) -> usize {
        self.voices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Voices whose embedding is resident
    pub fn loaded_count(&self) -> usize {
        self.voices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|r| matches!(r.embedding, EmbeddingState::Loaded(_)))
            .count()
    }
}
