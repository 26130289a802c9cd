//! Tokenizer Routes

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::core::error::{BackendOperation, Result, TtsError};
use crate::server::server_core::ServerState;
use crate::server::types::{DetokenizeRequest, TokenizeRequest, TokenizeResponse};
use crate::text::TextTokenizer;

fn tokenizer(state: &ServerState) -> Result<&TextTokenizer> {
    state.tokenizer.as_ref().ok_or_else(|| {
        TtsError::backend(BackendOperation::Tokenization, "no tokenizer is configured")
    })
}

/// `POST /tokenizer/encode`
pub async fn encode(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<TokenizeRequest>,
) -> Result<Json<TokenizeResponse>> {
    let tokens = tokenizer(&state)?.encode(&request.text)?;
    Ok(Json(TokenizeResponse {
        count: tokens.len(),
        text: request.text,
        tokens,
    }))
}

/// `POST /tokenizer/decode`
pub async fn decode(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DetokenizeRequest>,
) -> Result<Json<TokenizeResponse>> {
    let text = tokenizer(&state)?.decode(&request.tokens)?;
    Ok(Json(TokenizeResponse {
        count: request.tokens.len(),
        text,
        tokens: request.tokens,
    }))
}
