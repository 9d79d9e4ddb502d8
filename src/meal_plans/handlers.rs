use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{GenerateMealPlanRequest, GeneratedMealPlan};
use super::repo_types::{Day, MealPlan, Recipe};
use super::services;
use crate::{error::AppError, extractors::{ApiJson, ApiPath}, state::AppState};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans/generate", post(generate))
        .route("/meal-plans/:id", get(get_plan).delete(delete_plan))
        .route("/meal-plans/:id/days/:day", put(set_day).delete(clear_day))
        .route("/meal-plans/:id/days/:day/recipe", post(develop_day_recipe))
        .route("/meal-plans/household/:household_id", get(list_for_household))
}

fn parse_day(raw: &str) -> Result<Day, AppError> {
    raw.parse().map_err(AppError::invalid)
}

#[instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateMealPlanRequest>,
) -> Result<Json<GeneratedMealPlan>, AppError> {
    let household_id = body
        .household_id
        .ok_or_else(|| AppError::invalid("household_id is required"))?;
    services::generate_meal_plan(&state, household_id, body.session_id)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MealPlan>, AppError> {
    services::get_meal_plan(&state, id).await.map(Json)
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_meal_plan(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_for_household(
    State(state): State<AppState>,
    ApiPath(household_id): ApiPath<Uuid>,
) -> Result<Json<Vec<MealPlan>>, AppError> {
    services::list_for_household(&state, household_id).await.map(Json)
}

#[instrument(skip(state, recipe))]
pub async fn set_day(
    State(state): State<AppState>,
    ApiPath((id, day)): ApiPath<(Uuid, String)>,
    ApiJson(recipe): ApiJson<Recipe>,
) -> Result<Json<MealPlan>, AppError> {
    let day = parse_day(&day)?;
    services::set_day_recipe(&state, id, day, recipe).await.map(Json)
}

#[instrument(skip(state))]
pub async fn develop_day_recipe(
    State(state): State<AppState>,
    ApiPath((id, day)): ApiPath<(Uuid, String)>,
) -> Result<Json<MealPlan>, AppError> {
    let day = parse_day(&day)?;
    services::develop_day_recipe(&state, id, day).await.map(Json)
}

#[instrument(skip(state))]
pub async fn clear_day(
    State(state): State<AppState>,
    ApiPath((id, day)): ApiPath<(Uuid, String)>,
) -> Result<Json<MealPlan>, AppError> {
    let day = parse_day(&day)?;
    services::clear_day(&state, id, day).await.map(Json)
}
