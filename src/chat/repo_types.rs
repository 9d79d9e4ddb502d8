use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::llm::ChatMessage;

/// Which dialogue a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Onboarding,
    WeeklyPlanning,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Onboarding => "onboarding",
            Phase::WeeklyPlanning => "weekly_planning",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onboarding" => Ok(Phase::Onboarding),
            "weekly_planning" | "weekly-planning" => Ok(Phase::WeeklyPlanning),
            other => Err(format!("unknown session phase: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One turn of the transcript. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        match m.role {
            MessageRole::User => ChatMessage::user(m.content.clone()),
            MessageRole::Assistant => ChatMessage::assistant(m.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub phase: Phase,
    pub messages: Vec<Message>,
    pub completed: bool,
    pub household_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Structured result of the completed phase (profile or weekly constraints).
    pub extracted: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ConversationSession {
    pub fn new(phase: Phase, household_id: Option<Uuid>, user_id: Option<Uuid>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            phase,
            messages: Vec::new(),
            completed: false,
            household_id,
            user_id,
            extracted: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.completed {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    /// Appends a user turn. A retry of the last, still unanswered, turn is
    /// not appended twice; returns whether history changed.
    pub fn append_user(&mut self, content: &str) -> bool {
        if let Some(last) = self.messages.last() {
            if last.role == MessageRole::User && last.content == content {
                return false;
            }
        }
        self.push(MessageRole::User, content);
        true
    }

    pub fn append_assistant(&mut self, content: &str) {
        self.push(MessageRole::Assistant, content);
    }

    fn push(&mut self, role: MessageRole, content: &str) {
        self.messages.push(Message { role, content: content.to_string() });
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Transcript as "User: ..." / "Assistant: ..." lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| match m.role {
                MessageRole::User => format!("User: {}", m.content),
                MessageRole::Assistant => format!("Assistant: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// System prompt followed by the full history, oldest first.
    pub fn llm_context(&self, system_prompt: &str) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(system_prompt))
            .chain(self.messages.iter().map(ChatMessage::from))
            .collect()
    }
}

/// `chat_sessions` row as stored.
#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub session_type: String,
    pub messages: Json<Vec<Message>>,
    pub completed: bool,
    pub household_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub extracted: Option<Json<serde_json::Value>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<SessionRow> for ConversationSession {
    type Error = anyhow::Error;

    fn try_from(r: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            phase: r.session_type.parse().map_err(anyhow::Error::msg)?,
            messages: r.messages.0,
            completed: r.completed,
            household_id: r.household_id,
            user_id: r.user_id,
            extracted: r.extracted.map(|j| j.0),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;

    #[test]
    fn retry_of_unanswered_turn_is_not_duplicated() {
        let mut s = ConversationSession::new(Phase::Onboarding, None, None);
        assert!(s.append_user("We are a family of four"));
        assert!(!s.append_user("We are a family of four"));
        assert_eq!(s.messages.len(), 1);

        s.append_assistant("Great! What's your cooking skill?");
        assert!(s.append_user("We are a family of four"));
        assert_eq!(s.messages.len(), 3);
    }

    #[test]
    fn context_starts_with_system_prompt_and_keeps_order() {
        let mut s = ConversationSession::new(Phase::WeeklyPlanning, None, None);
        s.append_user("busy tuesday");
        s.append_assistant("got it");
        let ctx = s.llm_context("SYSTEM");
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx[0].role, ChatRole::System);
        assert_eq!(ctx[1].content, "busy tuesday");
        assert_eq!(ctx[2].role, ChatRole::Assistant);
    }

    #[test]
    fn transcript_labels_roles() {
        let mut s = ConversationSession::new(Phase::WeeklyPlanning, None, None);
        s.append_user("normal week");
        s.append_assistant("Perfect!");
        assert_eq!(s.transcript(), "User: normal week\nAssistant: Perfect!");
    }

    #[test]
    fn phase_round_trips_through_storage_name() {
        assert_eq!("weekly_planning".parse::<Phase>().unwrap(), Phase::WeeklyPlanning);
        assert_eq!(Phase::Onboarding.as_str(), "onboarding");
        assert!("dinner".parse::<Phase>().is_err());
    }
}
