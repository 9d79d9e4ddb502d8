use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{ConversationSession, SessionStatus};

#[derive(Debug, Default, Deserialize)]
pub struct StartOnboardingRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartWeeklyPlanningRequest {
    pub household_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub session_id: Uuid,
    pub message: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub household_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<serde_json::Value>,
}

/// Stored session plus its derived state-machine status.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: ConversationSession,
    pub status: SessionStatus,
}

impl From<ConversationSession> for SessionView {
    fn from(session: ConversationSession) -> Self {
        let status = session.status();
        Self { session, status }
    }
}
