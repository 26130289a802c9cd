//! Server Configuration
//!
//! Loaded from YAML; every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TtsError};
use crate::engine::BackendConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Persistent storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Model backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Path to the model's tokenizer.json; tokenizer routes fail without it
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    /// Request limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom voices directory
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            voices_dir: default_voices_dir(),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Shortest accepted reference clip (seconds)
    #[serde(default = "default_min_ref_secs")]
    pub min_reference_secs: f64,

    /// Longest accepted reference clip (seconds)
    #[serde(default = "default_max_ref_secs")]
    pub max_reference_secs: f64,

    /// Texts per batch request
    #[serde(default = "default_max_batch")]
    pub max_batch_texts: usize,

    /// Custom voice descriptions are cut to this many characters
    #[serde(default = "default_description_chars")]
    pub max_description_chars: usize,

    /// Characters per synthesized text
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Request body size (bytes), uploads included
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_reference_secs: default_min_ref_secs(),
            max_reference_secs: default_max_ref_secs(),
            max_batch_texts: default_max_batch(),
            max_description_chars: default_description_chars(),
            max_text_chars: default_max_text_chars(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable access log
    #[serde(default = "default_true")]
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            access_log: true,
        }
    }
}

/// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8060
}

fn default_true() -> bool {
    true
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("custom_voices")
}

fn default_min_ref_secs() -> f64 {
    1.0
}

fn default_max_ref_secs() -> f64 {
    30.0
}

fn default_max_batch() -> usize {
    100
}

fn default_description_chars() -> usize {
    200
}

fn default_max_text_chars() -> usize {
    10_000
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Config {
            message: format!("cannot read config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| TtsError::Config {
            message: format!("invalid config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TtsError::Config {
            message: format!("cannot serialize config: {}", e),
            path: None,
        })
    }

    /// Reject inconsistent limits
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.min_reference_secs <= 0.0 || limits.min_reference_secs > limits.max_reference_secs {
            return Err(TtsError::Config {
                message: format!(
                    "reference duration bounds [{}, {}] are invalid",
                    limits.min_reference_secs, limits.max_reference_secs
                ),
                path: None,
            });
        }
        if limits.max_batch_texts == 0 || limits.max_text_chars == 0 {
            return Err(TtsError::Config {
                message: "batch and text limits must be positive".to_string(),
                path: None,
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage: StorageConfig::default(),
            backend: BackendConfig::default(),
            tokenizer_path: None,
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
