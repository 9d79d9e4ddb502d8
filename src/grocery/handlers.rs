use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::GenerateGroceryListRequest;
use super::repo_types::GroceryList;
use super::services;
use crate::{error::AppError, extractors::{ApiJson, ApiPath}, state::AppState};

pub fn grocery_routes() -> Router<AppState> {
    Router::new()
        .route("/grocery-lists/generate", post(generate))
        .route("/grocery-lists/meal-plan/:meal_plan_id", get(latest_for_meal_plan))
}

#[instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateGroceryListRequest>,
) -> Result<Json<GroceryList>, AppError> {
    let meal_plan_id = body
        .meal_plan_id
        .ok_or_else(|| AppError::invalid("meal_plan_id is required"))?;
    services::generate_grocery_list(&state, meal_plan_id).await.map(Json)
}

#[instrument(skip(state))]
pub async fn latest_for_meal_plan(
    State(state): State<AppState>,
    ApiPath(meal_plan_id): ApiPath<Uuid>,
) -> Result<Json<GroceryList>, AppError> {
    services::latest_for_meal_plan(&state, meal_plan_id).await.map(Json)
}
