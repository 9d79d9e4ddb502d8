use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    ChatTurnRequest, ChatTurnResponse, SessionView, StartOnboardingRequest, StartWeeklyPlanningRequest,
};
use super::repo_types::{ConversationSession, Phase};
use super::services;
use crate::{error::ChatFailure, extractors::{ApiJson, ApiPath}, state::AppState};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/onboarding/start", post(start_onboarding))
        .route("/chat/onboarding/:session_id", post(continue_onboarding))
        .route("/chat/weekly-planning/start", post(start_weekly_planning))
        .route("/chat/weekly-planning/:session_id", post(continue_weekly_planning))
        .route("/chat/sessions/:session_id", get(get_session))
}

fn welcome(session: ConversationSession, message: &str) -> ChatTurnResponse {
    ChatTurnResponse {
        session_id: session.id,
        message: message.to_string(),
        completed: false,
        household_id: session.household_id,
        extracted_data: None,
    }
}

#[instrument(skip(state, body))]
pub async fn start_onboarding(
    State(state): State<AppState>,
    body: Option<Json<StartOnboardingRequest>>,
) -> Result<Json<ChatTurnResponse>, ChatFailure> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (session, message) =
        services::start_session(&state, Phase::Onboarding, None, body.user_id).await?;
    Ok(Json(welcome(session, message)))
}

#[instrument(skip(state, body))]
pub async fn continue_onboarding(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, ChatFailure> {
    let out = services::continue_session(&state, session_id, Phase::Onboarding, &body.message).await?;
    Ok(Json(out))
}

#[instrument(skip(state, body))]
pub async fn start_weekly_planning(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<StartWeeklyPlanningRequest>,
) -> Result<Json<ChatTurnResponse>, ChatFailure> {
    let (session, message) =
        services::start_session(&state, Phase::WeeklyPlanning, body.household_id, None).await?;
    Ok(Json(welcome(session, message)))
}

#[instrument(skip(state, body))]
pub async fn continue_weekly_planning(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>, ChatFailure> {
    let out =
        services::continue_session(&state, session_id, Phase::WeeklyPlanning, &body.message).await?;
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<Json<SessionView>, ChatFailure> {
    let session = services::get_session(&state, session_id).await?;
    Ok(Json(SessionView::from(session)))
}
