use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    ProviderNotConfigured(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    Extraction(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Persistence(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Wraps a failed store call; keeps the full context chain in the message.
    pub fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::ProviderNotConfigured(_) | AppError::Provider(_) => "provider_error",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::Extraction(_) => "extraction_error",
            AppError::NotFound(_) => "not_found",
            AppError::Persistence(_) => "persistence_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::ProviderNotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Provider(_) | AppError::Extraction(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the same request may succeed when sent again unchanged.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnavailable(_)
                | AppError::Provider(_)
                | AppError::Extraction(_)
                | AppError::Persistence(_)
        )
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured(_) => AppError::ProviderNotConfigured(err.to_string()),
            LlmError::UnsupportedProvider(_) | LlmError::EmptyMessages => {
                AppError::InvalidRequest(err.to_string())
            }
            LlmError::Timeout | LlmError::Transport(_) => {
                AppError::UpstreamUnavailable(err.to_string())
            }
            LlmError::Api { .. } | LlmError::InvalidResponse(_) => {
                AppError::Provider(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
            "retryable": self.retryable(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Error shape for chat routes: the failure reads like an assistant turn
/// asking the user to try again.
#[derive(Debug)]
pub struct ChatFailure(pub AppError);

impl From<AppError> for ChatFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub const CHAT_RETRY_MESSAGE: &str =
    "Sorry, I had trouble processing that just now. Please try sending your message again.";

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        let err = self.0;
        let message = match &err {
            AppError::InvalidRequest(msg) | AppError::NotFound(msg) => msg.clone(),
            _ => CHAT_RETRY_MESSAGE.to_string(),
        };
        let body = json!({
            "error": err.code(),
            "message": message,
            "detail": err.to_string(),
            "retryable": err.retryable(),
        });
        (err.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    #[test]
    fn llm_errors_map_onto_taxonomy() {
        let e: AppError = LlmError::NotConfigured(Provider::Anthropic).into();
        assert_eq!(e.code(), "provider_error");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: AppError = LlmError::Timeout.into();
        assert_eq!(e.code(), "upstream_unavailable");
        assert!(e.retryable());

        let e: AppError = LlmError::UnsupportedProvider("mistral".into()).into();
        assert_eq!(e.code(), "invalid_request");
        assert!(!e.retryable());
    }

    #[test]
    fn extraction_is_distinct_from_provider_error() {
        let e = AppError::extraction("not json");
        assert_eq!(e.code(), "extraction_error");
        assert_ne!(e.code(), AppError::Provider("x".into()).code());
    }

    #[test]
    fn persistence_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("insert meal plan");
        let e = AppError::persistence(err);
        let msg = e.to_string();
        assert!(msg.contains("insert meal plan"));
        assert!(msg.contains("connection reset"));
    }
}
