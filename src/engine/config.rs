//! Backend configuration
//!
//! Selects which [`SpeechBackend`](super::SpeechBackend) the server talks to.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::offline::OfflineBackend;
use super::remote::RemoteBackend;
use super::traits::SpeechBackend;
use crate::core::error::Result;

/// Backend implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Model worker reached over HTTP
    #[default]
    Remote,
    /// Deterministic tones, no model required
    Offline,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Model worker base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Worker request timeout (seconds); generation can take tens of seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8061".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl BackendConfig {
    pub fn offline() -> Self {
        Self {
            kind: BackendKind::Offline,
            ..Default::default()
        }
    }

    /// Instantiate the configured backend
    pub fn build(&self) -> Result<Arc<dyn SpeechBackend>> {
        let backend: Arc<dyn SpeechBackend> = match self.kind {
            BackendKind::Remote => Arc::new(RemoteBackend::new(
                self.base_url.clone(),
                Duration::from_secs(self.timeout_secs),
            )?),
            BackendKind::Offline => Arc::new(OfflineBackend::new()),
        };
        info!("Using {} speech backend", backend.name());
        Ok(backend)
    }
}
