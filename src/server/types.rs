//! API Types
//!
//! Request and response bodies for the HTTP API, and the HTTP mapping of
//! [`TtsError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::core::error::{AudioOperation, TtsError};
use crate::engine::ModelVariant;
use crate::text::LanguageEntry;
use crate::voice::{Gender, NativeVoice, PromptSummary, VoiceDetails, VoiceMeta, VoiceSource};

/// Default language code
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Used by design routes when no description is given
pub const DEFAULT_VOICE_INSTRUCT: &str = "Natural and clear voice";

pub(crate) fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

pub(crate) fn default_voice() -> String {
    crate::voice::DEFAULT_VOICE.to_string()
}

/// `POST /design`
#[derive(Debug, Clone, Deserialize)]
pub struct DesignRequest {
    pub text: String,
    #[serde(default)]
    pub voice_instruct: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// `POST /batch/preset`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPresetRequest {
    pub texts: Vec<String>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// `POST /batch/design`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchDesignRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub voice_instruct: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// `POST /tokenizer/encode`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizeRequest {
    pub text: String,
}

/// `POST /tokenizer/decode`
#[derive(Debug, Clone, Deserialize)]
pub struct DetokenizeRequest {
    pub tokens: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenizeResponse {
    pub text: String,
    pub tokens: Vec<u32>,
    pub count: usize,
}

/// `POST /models/preload` query; absent flags keep their defaults
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadQuery {
    #[serde(default)]
    pub design: bool,
    #[serde(default)]
    pub clone: bool,
    #[serde(default = "default_true")]
    pub preset: bool,
    #[serde(default)]
    pub clone_1_7b: bool,
    #[serde(default)]
    pub clone_0_6b: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct PreloadResponse {
    pub status: &'static str,
    pub loaded: Vec<String>,
    pub device: String,
}

/// Checkpoint serving each route family
#[derive(Debug, Clone, Serialize)]
pub struct ModelLineup {
    pub voice_design: &'static str,
    pub voice_clone: &'static str,
    pub preset_voice: &'static str,
    pub preset_instruct: &'static str,
}

impl Default for ModelLineup {
    fn default() -> Self {
        Self {
            voice_design: "1.7B-VoiceDesign",
            voice_clone: "1.7B-Base / 0.6B-Base",
            preset_voice: "0.6B-CustomVoice",
            preset_instruct: "1.7B-CustomVoice",
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub backend: String,
    pub device: String,
    /// Uptime (seconds)
    pub uptime: u64,
    pub models: ModelLineup,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageEntry>,
    pub count: usize,
    pub models: ModelLineup,
    pub device: String,
}

/// `POST /clone/prompt` result
#[derive(Debug, Clone, Serialize)]
pub struct PromptCreatedResponse {
    pub prompt_id: String,
    pub name: Option<String>,
    pub model: ModelVariant,
    pub created_at: DateTime<Utc>,
}

/// `POST /clone/prompt` with `x_vector_only`: the prompt is returned, not stored
#[derive(Debug, Clone, Serialize)]
pub struct PromptExportResponse {
    pub mode: &'static str,
    pub model: ModelVariant,
    pub duration_seconds: f64,
    /// Base64 encoded prompt
    pub x_vector: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptListResponse {
    pub prompts: Vec<PromptSummary>,
    pub count: usize,
    pub warning: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDeletedResponse {
    pub status: &'static str,
    pub prompt_id: String,
}

/// Voice kind in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceType {
    Native,
    Custom,
}

/// Entry of `GET /voices`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum VoiceEntry {
    Native(NativeVoiceEntry),
    Custom(CustomVoiceEntry),
}

#[derive(Debug, Clone, Serialize)]
pub struct NativeVoiceEntry {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub voice_type: VoiceType,
    pub gender: Gender,
    pub native_language: &'static str,
    pub description: &'static str,
}

impl From<&NativeVoice> for NativeVoiceEntry {
    fn from(voice: &NativeVoice) -> Self {
        Self {
            name: voice.name,
            voice_type: VoiceType::Native,
            gender: voice.gender,
            native_language: voice.native_language,
            description: voice.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomVoiceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub voice_type: VoiceType,
    pub source: VoiceSource,
    pub model: ModelVariant,
    pub description: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub version: String,
}

impl From<VoiceMeta> for CustomVoiceEntry {
    fn from(meta: VoiceMeta) -> Self {
        Self {
            name: meta.name,
            voice_type: VoiceType::Custom,
            source: meta.source,
            model: meta.model,
            description: meta.description,
            language: meta.language,
            created_at: meta.created_at,
            version: meta.version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceListResponse {
    pub voices: Vec<VoiceEntry>,
    pub count: usize,
    pub native_count: usize,
    pub custom_count: usize,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceCreatedResponse {
    pub status: &'static str,
    pub voice: CustomVoiceEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceDetailsResponse {
    #[serde(flatten)]
    pub voice: CustomVoiceEntry,
    pub file_size_bytes: u64,
    pub loaded_in_memory: bool,
}

impl From<VoiceDetails> for VoiceDetailsResponse {
    fn from(details: VoiceDetails) -> Self {
        Self {
            voice: details.meta.into(),
            file_size_bytes: details.file_size_bytes,
            loaded_in_memory: details.loaded_in_memory,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceDeletedResponse {
    pub status: &'static str,
    pub name: String,
}

/// `GET /models/status`
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatusResponse {
    pub backend: String,
    pub voice_design_loaded: bool,
    pub voice_clone_loaded: bool,
    pub preset_voice_loaded: bool,
    pub clone_1_7b_loaded: bool,
    pub clone_0_6b_loaded: bool,
    pub prompts_cached: usize,
    pub custom_voices_count: usize,
    pub custom_voices_loaded_in_memory: usize,
    pub device: String,
    pub custom_voices_dir: String,
    pub tokenizer_loaded: bool,
}

/// Argument of a documented MCP tool
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolParameter {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: &'static str,
    pub required: bool,
    pub description: &'static str,
    /// Value used in the generated call example
    pub example: &'static str,
}

/// MCP tool as listed by `GET /mcp/docs`
#[derive(Debug, Clone, Serialize)]
pub struct ToolEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub parameters: &'static [ToolParameter],
    /// JSON-RPC `tools/call` request for this tool
    pub call_example: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceCatalog {
    pub native: Vec<NativeVoiceEntry>,
    pub custom: Vec<CustomVoiceEntry>,
    pub native_count: usize,
    pub custom_count: usize,
}

/// `GET /mcp/docs`
#[derive(Debug, Clone, Serialize)]
pub struct McpDocsResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub device: String,
    pub tools: Vec<ToolEntry>,
    pub voices: VoiceCatalog,
    pub models: ModelStatusResponse,
}

/// Server statistics
#[derive(Debug, Clone, Serialize)]
pub struct ServerStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Average processing time (ms)
    pub avg_processing_time_ms: f64,
    pub success_rate: f64,
    /// Uptime (seconds)
    pub uptime: u64,
    /// Keyed by route template, e.g. `/voices/custom/:name`
    pub endpoints: BTreeMap<String, EndpointStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub requests: u64,
    pub avg_time_ms: f64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,

    /// Error message
    pub message: String,

    /// Details
    #[serde(default)]
    pub details: Option<String>,

    /// Valid alternatives for not-found errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

/// HTTP status for an error
pub fn status_for(err: &TtsError) -> StatusCode {
    match err {
        TtsError::Validation { .. } | TtsError::CapabilityMismatch { .. } => StatusCode::BAD_REQUEST,
        TtsError::NotFound { .. } => StatusCode::NOT_FOUND,
        TtsError::Forbidden { .. } => StatusCode::FORBIDDEN,
        // Undecodable uploads are the caller's problem
        TtsError::Audio { operation: AudioOperation::Loading, .. } => StatusCode::BAD_REQUEST,
        TtsError::Audio { .. }
        | TtsError::Backend { .. }
        | TtsError::Io { .. }
        | TtsError::Internal { .. }
        | TtsError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&TtsError> for ErrorResponse {
    fn from(err: &TtsError) -> Self {
        let (details, available) = match err {
            TtsError::Validation { field, .. } => (field.clone(), None),
            TtsError::NotFound { available, .. } => (None, Some(available.clone())),
            TtsError::Backend { operation, .. } => (Some(operation.to_string()), None),
            TtsError::Audio { operation, .. } => (Some(operation.to_string()), None),
            _ => (None, None),
        };

        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            details,
            available,
        }
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{BackendOperation, ResourceKind};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&TtsError::validation("text", "empty")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&TtsError::CapabilityMismatch { message: "x".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&TtsError::Forbidden { message: "x".into() }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&TtsError::backend(BackendOperation::Generation, "CUDA OOM")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&TtsError::Audio {
                message: "bad".into(),
                operation: AudioOperation::Loading
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_body_lists_alternatives() {
        let err = TtsError::NotFound {
            kind: ResourceKind::Voice,
            name: "Unknown123".into(),
            available: vec!["Aiden".into(), "Dylan".into()],
        };
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["code"], "not_found");
        assert_eq!(body["available"][1], "Dylan");
    }

    #[test]
    fn test_backend_message_passed_through() {
        let err = TtsError::backend(BackendOperation::Generation, "/models/x.bin missing");
        let body = ErrorResponse::from(&err);
        assert!(body.message.contains("/models/x.bin missing"));
        assert!(body.available.is_none());
    }

    #[test]
    fn test_preload_query_defaults() {
        let query: PreloadQuery = serde_json::from_str("{}").unwrap();
        assert!(query.preset);
        assert!(!query.design);
    }
}
