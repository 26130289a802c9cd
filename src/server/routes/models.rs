//! Model Status Routes

use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::core::error::Result;
use crate::engine::{ModelKind, ModelVariant};
use crate::server::server_core::ServerState;
use crate::server::types::{ModelStatusResponse, PreloadQuery, PreloadResponse};

/// Resident checkpoints and voice counts
pub(crate) fn model_status(state: &ServerState) -> ModelStatusResponse {
    let loaded = state.backend.loaded_models();
    let has = |kind: ModelKind| loaded.contains(&kind);

    ModelStatusResponse {
        backend: state.backend.name().to_string(),
        voice_design_loaded: has(ModelKind::VoiceDesign),
        voice_clone_loaded: loaded.iter().any(|k| matches!(k, ModelKind::CloneBase(_))),
        preset_voice_loaded: has(ModelKind::PresetVoice),
        clone_1_7b_loaded: has(ModelKind::CloneBase(ModelVariant::Large)),
        clone_0_6b_loaded: has(ModelKind::CloneBase(ModelVariant::Small)),
        prompts_cached: state.prompts.len(),
        custom_voices_count: state.voices.len(),
        custom_voices_loaded_in_memory: state.voices.loaded_count(),
        device: state.backend.device(),
        custom_voices_dir: state.voices.root().display().to_string(),
        tokenizer_loaded: state.tokenizer.is_some(),
    }
}

/// `GET /models/status`
pub async fn status(State(state): State<Arc<ServerState>>) -> Json<ModelStatusResponse> {
    Json(model_status(&state))
}

/// Checkpoints selected by the query flags, without repeats
fn requested(query: &PreloadQuery) -> Vec<ModelKind> {
    let mut kinds = Vec::new();
    let mut add = |selected: bool, kind: ModelKind| {
        if selected && !kinds.contains(&kind) {
            kinds.push(kind);
        }
    };
    add(query.design, ModelKind::VoiceDesign);
    add(query.clone || query.clone_1_7b, ModelKind::CloneBase(ModelVariant::Large));
    add(query.clone_0_6b, ModelKind::CloneBase(ModelVariant::Small));
    add(query.preset, ModelKind::PresetVoice);
    kinds
}

/// `POST /models/preload`
pub async fn preload(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PreloadQuery>,
) -> Result<Json<PreloadResponse>> {
    let mut loaded = Vec::new();
    for kind in requested(&query) {
        state.backend.preload(kind).await?;
        info!("Preloaded {}", kind);
        loaded.push(kind.checkpoint().to_string());
    }

    Ok(Json(PreloadResponse {
        status: "success",
        loaded,
        device: state.backend.device(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_defaults_to_preset() {
        let query: PreloadQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(requested(&query), vec![ModelKind::PresetVoice]);
    }

    #[test]
    fn test_clone_flags_deduplicated() {
        let query: PreloadQuery =
            serde_json::from_str(r#"{"clone": true, "clone_1_7b": true, "clone_0_6b": true, "preset": false}"#)
                .unwrap();
        assert_eq!(
            requested(&query),
            vec![
                ModelKind::CloneBase(ModelVariant::Large),
                ModelKind::CloneBase(ModelVariant::Small)
            ]
        );
    }
}
