//! Batch Synthesis Routes
//!
//! Texts are generated one after another and packed into a ZIP of
//! `001.wav`, `002.wav`, ... in request order.

use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::audio::AudioArchive;
use crate::core::error::{ResourceKind, Result, TtsError};
use crate::engine::GenerationMode;
use crate::server::form::FormData;
use crate::server::routes::{render, zip_response};
use crate::server::server_core::ServerState;
use crate::server::types::{
    BatchDesignRequest, BatchPresetRequest, DEFAULT_LANGUAGE, DEFAULT_VOICE_INSTRUCT,
};
use crate::text::resolve_language;
use crate::voice::{resolve_voice, RequestPath};

/// Count and per-text checks shared by every batch route
fn check_batch(state: &ServerState, texts: &[String]) -> Result<()> {
    if texts.is_empty() {
        return Err(TtsError::validation("texts", "no texts provided"));
    }
    let max = state.config.limits.max_batch_texts;
    if texts.len() > max {
        return Err(TtsError::validation(
            "texts",
            format!("too many texts: {} (max: {})", texts.len(), max),
        ));
    }

    let limit = state.config.limits.max_text_chars;
    for (i, text) in texts.iter().enumerate() {
        if text.trim().is_empty() {
            return Err(TtsError::validation("texts", format!("text {} is empty", i + 1)));
        }
        let chars = text.chars().count();
        if chars > limit {
            return Err(TtsError::validation(
                "texts",
                format!("text {} is too long: {} characters (max: {})", i + 1, chars, limit),
            ));
        }
    }
    Ok(())
}

/// Generate every text with the same mode; `auto` is detected per text
async fn render_all(
    state: &ServerState,
    texts: &[String],
    language: &str,
    mode: GenerationMode<'_>,
) -> Result<Vec<u8>> {
    let mut archive = AudioArchive::new();
    for text in texts {
        let language = resolve_language(language, text)?;
        let wav = render(state, text, language, mode.clone()).await?;
        archive.push_wav(&wav)?;
    }
    info!("Batch of {} files generated on {}", archive.len(), mode.model_kind());
    archive.finish()
}

/// `POST /batch/preset`
pub async fn batch_preset(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<BatchPresetRequest>,
) -> Result<Response> {
    check_batch(&state, &request.texts)?;
    let voice = request.voice.trim();
    let plan = resolve_voice(voice, RequestPath::Plain, &state.voices)?;

    let zip = render_all(&state, &request.texts, &request.language, plan.mode()).await?;
    Ok(zip_response(zip, &format!("batch_preset_{}.zip", voice.to_lowercase())))
}

/// `POST /batch/design`
pub async fn batch_design(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<BatchDesignRequest>,
) -> Result<Response> {
    check_batch(&state, &request.texts)?;
    let instruct = match request.voice_instruct.trim() {
        "" => DEFAULT_VOICE_INSTRUCT,
        instruct => instruct,
    };

    let zip = render_all(
        &state,
        &request.texts,
        &request.language,
        GenerationMode::Design { instruct },
    )
    .await?;
    Ok(zip_response(zip, "batch_design.zip"))
}

/// Newline separated texts, trimmed, blank lines dropped
fn split_lines(texts: &str) -> Vec<String> {
    texts
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `POST /batch/clone`: every text on one cached prompt
pub async fn batch_clone(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<Response> {
    let form = FormData::from_multipart(multipart).await?;
    let texts = split_lines(form.text_or("texts", ""));
    check_batch(&state, &texts)?;
    let prompt_id = form.required("prompt_id")?.trim();
    let language = form.text_or("language", DEFAULT_LANGUAGE);

    let entry = state.prompts.get(prompt_id).ok_or_else(|| TtsError::NotFound {
        kind: ResourceKind::Prompt,
        name: prompt_id.to_string(),
        available: Vec::new(),
    })?;
    let mode = GenerationMode::ClonePrompt {
        variant: entry.model_variant,
        prompt: entry.payload,
    };

    let zip = render_all(&state, &texts, language, mode).await?;
    Ok(zip_response(zip, "batch_clone.zip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(
            split_lines("  Bonjour \n\n  \nSalut\r\nCiao"),
            vec!["Bonjour", "Salut", "Ciao"]
        );
        assert!(split_lines("\n \n").is_empty());
    }
}
