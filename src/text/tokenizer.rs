//! Text Tokenization
//!
//! Wrapper around HuggingFace tokenizers for the Qwen3-TTS text vocabulary.
//! Loads the checkpoint's `tokenizer.json`.

use std::path::{Path, PathBuf};

use tokenizers::Tokenizer;
use tracing::info;

use crate::core::error::{BackendOperation, Result, TtsError};

fn tokenization_error(message: impl Into<String>) -> TtsError {
    TtsError::backend(BackendOperation::Tokenization, message)
}

/// HuggingFace tokenizers-based text tokenizer
pub struct TextTokenizer {
    tokenizer: Tokenizer,
    path: PathBuf,
}

impl TextTokenizer {
    /// Load tokenizer from a tokenizer.json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(TtsError::Config {
                message: format!("Tokenizer model not found: {:?}", path),
                path: Some(path.to_path_buf()),
            });
        }

        let tokenizer = Tokenizer::from_file(path).map_err(|e| TtsError::Config {
            message: format!("Failed to load tokenizer from {:?}: {}", path, e),
            path: Some(path.to_path_buf()),
        })?;

        info!(
            "Loaded tokenizer from {:?} ({} tokens)",
            path,
            tokenizer.get_vocab_size(true)
        );

        Ok(Self {
            tokenizer,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode text to token IDs
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        if text.is_empty() {
            return Ok(vec![]);
        }

        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| tokenization_error(format!("Tokenization failed: {}", e)))?;

        Ok(encoding.get_ids().to_vec())
    }

    /// Decode token IDs back to text
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| tokenization_error(format!("Decoding failed: {}", e)))
    }

    /// Get vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}
