use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{GatewayChatRequest, GatewayChatResponse};
use super::{ChatMessage, CompletionRequest, Provider};
use crate::{error::AppError, extractors::ApiJson, state::AppState};

pub fn gateway_routes() -> Router<AppState> {
    Router::new().route("/llm/chat", post(chat_completion))
}

#[instrument(skip(state, body))]
pub async fn chat_completion(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GatewayChatRequest>,
) -> Result<Json<GatewayChatResponse>, AppError> {
    if body.messages.is_empty() {
        return Err(AppError::invalid(
            "messages array is required and must not be empty",
        ));
    }
    let provider = body
        .provider
        .as_deref()
        .map(str::parse::<Provider>)
        .transpose()?;

    let completion = state
        .llm
        .complete(CompletionRequest {
            provider,
            model: body.model,
            messages: body.messages,
            max_tokens: body.max_tokens,
            temperature: body.temperature,
        })
        .await?;

    Ok(Json(GatewayChatResponse {
        message: ChatMessage::assistant(completion.text),
        finish_reason: completion.finish_reason,
        usage: completion.usage,
        id: completion.id,
    }))
}
