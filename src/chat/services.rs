use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::completion::detect_completion;
use super::dto::ChatTurnResponse;
use super::prompts::onboarding_extraction_prompt;
use super::repo_types::{ConversationSession, Phase};
use crate::{
    error::AppError,
    households::{self, HouseholdProfile},
    llm::{json::parse_json_reply, ChatMessage, CompletionRequest, LlmError},
    meal_plans::{pipeline, WeeklyConstraints},
    state::AppState,
};

const TURN_TEMPERATURE: f32 = 0.7;
const TURN_MAX_TOKENS: u32 = 500;
const EXTRACTION_TEMPERATURE: f32 = 0.1;
const EXTRACTION_MAX_TOKENS: u32 = 800;

/// Structured outcome of a completed phase.
#[derive(Debug)]
pub enum StructuredData {
    Profile(HouseholdProfile),
    Constraints(WeeklyConstraints),
}

/// Opens a session and returns it with the phase's fixed welcome text.
#[instrument(skip(state))]
pub async fn start_session(
    state: &AppState,
    phase: Phase,
    household_id: Option<Uuid>,
    user_id: Option<Uuid>,
) -> Result<(ConversationSession, &'static str), AppError> {
    if phase == Phase::WeeklyPlanning {
        let id = household_id
            .ok_or_else(|| AppError::invalid("household_id is required for weekly planning"))?;
        households::services::get_household(state, id).await?;
    }

    let session = ConversationSession::new(phase, household_id, user_id);
    state
        .store
        .insert_session(&session)
        .await
        .map_err(AppError::persistence)?;
    info!(session_id = %session.id, %phase, "chat session started");
    Ok((session, phase.welcome()))
}

pub async fn get_session(state: &AppState, id: Uuid) -> Result<ConversationSession, AppError> {
    state
        .store
        .get_session(id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Session not found"))
}

/// Second model call on a finished transcript, returning data that already
/// passed validation. Nothing is persisted here.
#[instrument(skip_all, fields(session_id = %session.id, phase = %session.phase))]
pub async fn extract_structured_data(
    state: &AppState,
    session: &ConversationSession,
) -> Result<StructuredData, AppError> {
    let transcript = session.transcript();
    match session.phase {
        Phase::Onboarding => {
            let request = CompletionRequest::new(vec![
                ChatMessage::system(onboarding_extraction_prompt()),
                ChatMessage::user(format!("Extract data from this conversation:\n\n{transcript}")),
            ])
            .temperature(EXTRACTION_TEMPERATURE)
            .max_tokens(EXTRACTION_MAX_TOKENS);

            let reply = state.llm.complete(request).await?;
            let value = parse_json_reply(&reply.text)?;
            households::services::profile_from_extraction(value, session.user_id)
                .map(StructuredData::Profile)
        }
        Phase::WeeklyPlanning => pipeline::parse_constraints(state, &transcript)
            .await
            .map(StructuredData::Constraints),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::persistence(anyhow::Error::new(e).context("encode extracted data")))
}

/// One user turn.
///
/// The user message is stored before the model is called, so a failed call
/// leaves a retryable history. When the reply carries the phase marker the
/// structured data is extracted and saved first; only then are the reply and
/// `completed = true` written back.
#[instrument(skip(state, user_message))]
pub async fn continue_session(
    state: &AppState,
    session_id: Uuid,
    phase: Phase,
    user_message: &str,
) -> Result<ChatTurnResponse, AppError> {
    let text = user_message.trim();
    if text.is_empty() {
        return Err(AppError::invalid("message must not be empty"));
    }

    let mut session = get_session(state, session_id).await?;
    if session.phase != phase {
        return Err(AppError::invalid(format!("session is not a {phase} session")));
    }
    if session.completed {
        return Err(AppError::invalid("this conversation is already complete"));
    }

    let mut stored = session.messages.len();
    if session.append_user(text) {
        state
            .store
            .update_session(&session, &session.messages[stored..])
            .await
            .map_err(AppError::persistence)?;
        stored = session.messages.len();
    } else {
        info!(%session_id, "retrying unanswered turn");
    }

    let request = CompletionRequest::new(session.llm_context(phase.system_prompt()))
        .temperature(TURN_TEMPERATURE)
        .max_tokens(TURN_MAX_TOKENS);
    let reply = state.llm.complete(request).await.map_err(|e| {
        warn!(%session_id, error = %e, "chat turn failed");
        AppError::from(e)
    })?;
    if reply.text.trim().is_empty() {
        warn!(%session_id, finish_reason = ?reply.finish_reason, "model returned an empty reply");
        return Err(LlmError::InvalidResponse("model returned an empty reply".into()).into());
    }

    let check = detect_completion(&reply.text, phase.marker());
    session.append_assistant(&check.cleaned_text);

    let mut extracted_data = None;
    if check.completed {
        info!(%session_id, turns = session.messages.len(), "completion marker detected");
        let data = extract_structured_data(state, &session).await.map_err(|e| {
            warn!(%session_id, error = %e, "structured extraction failed; session stays open");
            e
        })?;

        match data {
            StructuredData::Profile(profile) => {
                let saved = households::services::save_onboarding_profile(state, profile).await?;
                session.household_id = Some(saved.id);
                let value = to_json(&saved)?;
                session.extracted = Some(value.clone());
                extracted_data = Some(value);
            }
            StructuredData::Constraints(constraints) => {
                let value = to_json(&constraints)?;
                session.extracted = Some(value.clone());
                extracted_data = Some(value);
            }
        }
        session.completed = true;
    }

    state
        .store
        .update_session(&session, &session.messages[stored..])
        .await
        .map_err(AppError::persistence)?;
    if session.completed {
        info!(%session_id, household_id = ?session.household_id, "chat session completed");
    }

    Ok(ChatTurnResponse {
        session_id,
        message: check.cleaned_text,
        completed: session.completed,
        household_id: session.household_id,
        extracted_data,
    })
}
