//! Structured error handling for the voice API
//!
//! Every fallible operation in the crate returns [`TtsError`]. The variants map
//! one-to-one onto the HTTP failure classes the server exposes: validation,
//! not-found, capability mismatch, forbidden and downstream model failures.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Malformed or missing request fields
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Unknown prompt id, voice name or custom voice
    #[error("{kind} '{name}' not found")]
    NotFound {
        kind: ResourceKind,
        name: String,
        /// Valid alternatives, sorted
        available: Vec<String>,
    },

    /// Request is well formed but cannot be served on the requested path
    #[error("Capability mismatch: {message}")]
    CapabilityMismatch { message: String },

    /// Operation is never allowed on this resource
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The model backend failed; message passed through from the backend
    #[error("Model backend error ({operation}): {message}")]
    Backend {
        operation: BackendOperation,
        message: String,
    },

    /// Audio decoding / encoding errors
    #[error("Audio processing error ({operation}): {message}")]
    Audio {
        message: String,
        operation: AudioOperation,
    },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        location: Option<String>,
    },
}

/// Resource kinds used in not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Prompt,
    Voice,
    CustomVoice,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Prompt => write!(f, "Prompt"),
            ResourceKind::Voice => write!(f, "Voice"),
            ResourceKind::CustomVoice => write!(f, "Custom voice"),
        }
    }
}

/// Backend call types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOperation {
    Generation,
    PromptCreation,
    ModelLoading,
    Tokenization,
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendOperation::Generation => write!(f, "generation"),
            BackendOperation::PromptCreation => write!(f, "prompt creation"),
            BackendOperation::ModelLoading => write!(f, "model loading"),
            BackendOperation::Tokenization => write!(f, "tokenization"),
        }
    }
}

/// Audio operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOperation {
    Loading,
    Encoding,
    Archiving,
}

impl fmt::Display for AudioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOperation::Loading => write!(f, "loading"),
            AudioOperation::Encoding => write!(f, "encoding"),
            AudioOperation::Archiving => write!(f, "archiving"),
        }
    }
}

impl TtsError {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a backend error
    pub fn backend(operation: BackendOperation, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            location: None,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config_error",
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::CapabilityMismatch { .. } => "capability_mismatch",
            Self::Forbidden { .. } => "forbidden",
            Self::Backend { .. } => "backend_error",
            Self::Audio { .. } => "audio_error",
            Self::Io { .. } => "io_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::CapabilityMismatch { .. }
                | Self::Forbidden { .. }
        )
    }
}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add a simple message context
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| TtsError::Internal {
            message: format!("{}: {}", msg.into(), e),
            location: None,
        })
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        TtsError::Internal {
            message: format!("JSON serialization failed: {}", err),
            location: None,
        }
    }
}
