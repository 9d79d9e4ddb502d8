mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::HouseholdProfile;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::household_routes())
}
