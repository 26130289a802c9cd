//! Clone Prompt Routes

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ResourceKind, Result, TtsError};
use crate::server::form::FormData;
use crate::server::routes::{model_field, reference_field};
use crate::server::server_core::ServerState;
use crate::server::types::{
    PromptCreatedResponse, PromptDeletedResponse, PromptExportResponse, PromptListResponse,
};

const VOLATILE_WARNING: &str =
    "Prompts live in memory and are lost on restart; use /voices/custom to keep a voice";

/// `POST /clone/prompt`
pub async fn create_prompt(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<Response> {
    let form = FormData::from_multipart(multipart).await?;
    let variant = model_field(&form)?;
    let reference_text = form
        .non_blank("reference_text")
        .ok_or_else(|| TtsError::validation("reference_text", "reference_text is required"))?;
    let x_vector_only = form.flag("x_vector_only")?;
    let reference = reference_field(&state, &form)?
        .ok_or_else(|| TtsError::validation("reference_audio", "reference_audio is required"))?;

    let prompt = state
        .backend
        .create_voice_clone_prompt(variant, &reference, reference_text)
        .await?;

    if x_vector_only {
        return Ok(Json(PromptExportResponse {
            mode: "x_vector_only",
            model: variant,
            duration_seconds: reference.duration_secs(),
            x_vector: BASE64.encode(prompt.as_bytes()),
        })
        .into_response());
    }

    let label = form.non_blank("name").map(|n| n.trim().to_string());
    let entry = state.prompts.create(prompt, variant, label);
    info!("Cached clone prompt {} ({})", entry.id, variant);

    Ok(Json(PromptCreatedResponse {
        prompt_id: entry.id,
        name: entry.label,
        model: entry.model_variant,
        created_at: entry.created_at,
    })
    .into_response())
}

/// `GET /clone/prompts`
pub async fn list_prompts(State(state): State<Arc<ServerState>>) -> Json<PromptListResponse> {
    let prompts = state.prompts.list();
    Json(PromptListResponse {
        count: prompts.len(),
        prompts,
        warning: VOLATILE_WARNING,
    })
}

/// `DELETE /clone/prompts/:prompt_id`
pub async fn delete_prompt(
    State(state): State<Arc<ServerState>>,
    Path(prompt_id): Path<String>,
) -> Result<Json<PromptDeletedResponse>> {
    if !state.prompts.delete(&prompt_id) {
        return Err(TtsError::NotFound {
            kind: ResourceKind::Prompt,
            name: prompt_id,
            available: Vec::new(),
        });
    }

    info!("Deleted clone prompt {}", prompt_id);
    Ok(Json(PromptDeletedResponse {
        status: "deleted",
        prompt_id,
    }))
}
