pub mod calendar;
pub mod constraints;
mod dto;
pub mod handlers;
pub mod pipeline;
pub mod recipes;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use constraints::WeeklyConstraints;
pub use repo_types::{Day, DayEntry, MealPlan};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::meal_plan_routes())
}
