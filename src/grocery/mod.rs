pub mod builder;
pub mod categories;
pub mod combiner;
mod dto;
pub mod handlers;
pub mod parser;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::GroceryList;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::grocery_routes())
}
