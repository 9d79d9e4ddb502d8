pub mod completion;
mod dto;
pub mod handlers;
pub mod prompts;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{ConversationSession, Phase};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::chat_routes())
}
