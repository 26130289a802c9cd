//! # Qwen3 Voice API
//!
//! Local HTTP service in front of the Qwen3-TTS model family.
//!
//! ## Features
//!
//! - **Preset voices**: nine native speakers, with optional style instructions
//! - **Voice design**: a voice described in natural language
//! - **Voice cloning**: from a reference clip, or from a cached clone prompt
//! - **Custom voices**: cloned or designed voices persisted on disk and usable
//!   by name on every preset route
//! - **Batch generation**: up to 100 texts per request, returned as a ZIP
//!
//! ## Running the server
//!
//! ```rust,ignore
//! use qwen3_voice_api::server::{ServerConfig, TtsServer};
//!
//! let config = ServerConfig::load("server.yaml")?;
//! TtsServer::new(config)?.run().await?;
//! ```
//!
//! ## Embedding the router
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use qwen3_voice_api::engine::OfflineBackend;
//! use qwen3_voice_api::server::{create_router, ServerConfig, ServerState};
//!
//! let state = ServerState::with_backend(ServerConfig::default(), Arc::new(OfflineBackend::new()))?;
//! let app = create_router(Arc::new(state));
//! ```

pub mod audio;
pub mod core;
pub mod engine;
pub mod server;
pub mod text;
pub mod voice;

pub use core::error::{Result, ResultExt, TtsError};
pub use engine::{BackendConfig, ModelKind, ModelVariant, SpeechBackend, VoicePrompt};
pub use server::{ServerConfig, TtsServer};
pub use text::Language;
pub use voice::{CustomVoiceStore, PromptCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name
pub const SERVICE_NAME: &str = "Qwen3 Voice API";
