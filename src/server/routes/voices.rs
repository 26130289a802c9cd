//! Voice Management Routes

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::core::error::{ResourceKind, Result, TtsError};
use crate::server::form::FormData;
use crate::server::routes::{model_field, reference_field};
use crate::server::server_core::ServerState;
use crate::server::types::{
    CustomVoiceEntry, NativeVoiceEntry, VoiceCreatedResponse, VoiceDeletedResponse,
    VoiceDetailsResponse, VoiceEntry, VoiceListResponse, DEFAULT_LANGUAGE,
};
use crate::text::resolve_language;
use crate::voice::{check_name, CreateVoice, VoiceOrigin, VoiceSource, NATIVE_VOICES};

const VOICES_NOTE: &str =
    "Native voices work on /preset and /preset/instruct; custom voices on /preset only";

/// `GET /voices`
pub async fn list_voices(State(state): State<Arc<ServerState>>) -> Json<VoiceListResponse> {
    let mut voices: Vec<VoiceEntry> = NATIVE_VOICES
        .iter()
        .map(|v| VoiceEntry::Native(NativeVoiceEntry::from(v)))
        .collect();
    let native_count = voices.len();

    voices.extend(
        state
            .voices
            .list()
            .into_iter()
            .map(|meta| VoiceEntry::Custom(CustomVoiceEntry::from(meta))),
    );
    let custom_count = voices.len() - native_count;

    Json(VoiceListResponse {
        count: voices.len(),
        voices,
        native_count,
        custom_count,
        note: VOICES_NOTE,
    })
}

/// `POST /voices/custom`
pub async fn create_voice(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<VoiceCreatedResponse>)> {
    let form = FormData::from_multipart(multipart).await?;
    let name = form.required("name")?.trim();
    check_name(name)?;
    let source: VoiceSource = form.required("source")?.trim().parse()?;
    let model = model_field(&form)?;
    let description = form.text_or("description", "");
    let reference_text = form.text_or("reference_text", "");
    let voice_description = form.text_or("voice_description", "");

    let language_hint = match source {
        VoiceSource::Clone => reference_text,
        VoiceSource::Design => voice_description,
    };
    let language = resolve_language(form.text_or("language", DEFAULT_LANGUAGE), language_hint)?;

    let reference = match source {
        VoiceSource::Clone => Some(reference_field(&state, &form)?.ok_or_else(|| {
            TtsError::validation("reference_audio", "reference_audio is required for source=clone")
        })?),
        VoiceSource::Design => None,
    };
    let origin = match &reference {
        Some(reference) => VoiceOrigin::Clone {
            reference,
            reference_text,
        },
        None => VoiceOrigin::Design { voice_description },
    };

    let meta = state
        .voices
        .create(
            state.backend.as_ref(),
            CreateVoice {
                name,
                model,
                description,
                language,
                origin,
            },
        )
        .await?;
    info!("Custom voice '{}' created ({})", meta.name, meta.source.as_str());

    Ok((
        StatusCode::CREATED,
        Json(VoiceCreatedResponse {
            status: "created",
            voice: meta.into(),
        }),
    ))
}

/// `GET /voices/custom/:name`
pub async fn get_voice(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<VoiceDetailsResponse>> {
    let details = state.voices.details(&name).ok_or_else(|| TtsError::NotFound {
        kind: ResourceKind::CustomVoice,
        available: state.voices.names(),
        name,
    })?;
    Ok(Json(details.into()))
}

/// `DELETE /voices/custom/:name`
pub async fn delete_voice(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<VoiceDeletedResponse>> {
    if !state.voices.delete(&name)? {
        return Err(TtsError::NotFound {
            kind: ResourceKind::CustomVoice,
            available: state.voices.names(),
            name,
        });
    }

    info!("Custom voice '{}' deleted", name);
    Ok(Json(VoiceDeletedResponse {
        status: "deleted",
        name,
    }))
}
