use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::UpdateHouseholdRequest;
use super::repo_types::HouseholdProfile;
use super::services;
use crate::{error::AppError, extractors::{ApiJson, ApiPath}, state::AppState};

pub fn household_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/:id",
            get(get_household).put(update_household).delete(delete_household),
        )
        .route("/households/by-user/:user_id", get(get_household_by_user))
}

#[instrument(skip(state))]
pub async fn get_household(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<HouseholdProfile>, AppError> {
    services::get_household(&state, id).await.map(Json)
}

#[instrument(skip(state, body))]
pub async fn update_household(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateHouseholdRequest>,
) -> Result<Json<HouseholdProfile>, AppError> {
    services::update_household(&state, id, body).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_household_by_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<HouseholdProfile>, AppError> {
    services::household_for_user(&state, user_id).await.map(Json)
}

#[instrument(skip(state))]
pub async fn delete_household(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_household(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
