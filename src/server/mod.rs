//! Voice Server Module
//!
//! HTTP surface of the Qwen3-TTS service:
//! - Preset, instructed, designed and cloned synthesis
//! - Volatile clone prompts and persistent custom voices
//! - Batch generation into ZIP archives
//! - Model status, preloading and tokenizer utilities

pub mod config;
pub mod form;
pub mod middleware;
pub mod routes;
pub mod server_core;
pub mod types;

pub use config::{LimitsConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use middleware::{MetricsState, MetricsSummary, ServerMetrics};
pub use server_core::{create_router, ServerState, TtsServer};
pub use types::ErrorResponse;
