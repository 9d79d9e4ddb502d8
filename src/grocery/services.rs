use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::builder::build_items;
use super::repo_types::GroceryList;
use crate::{error::AppError, meal_plans, state::AppState};

/// Builds the list for a plan and stores it as a new row. Earlier lists for
/// the same plan are kept; readers take the newest.
#[instrument(skip(state))]
pub async fn generate_grocery_list(
    state: &AppState,
    meal_plan_id: Uuid,
) -> Result<GroceryList, AppError> {
    let plan = meal_plans::services::get_meal_plan(state, meal_plan_id).await?;

    let list = GroceryList {
        id: Uuid::new_v4(),
        meal_plan_id,
        items: build_items(&plan.meals),
        total_estimated_cost: None,
        created_at: OffsetDateTime::now_utc(),
    };
    state
        .store
        .insert_grocery_list(&list)
        .await
        .map_err(AppError::persistence)?;

    let count: usize = list.items.values().map(Vec::len).sum();
    info!(grocery_list_id = %list.id, %meal_plan_id, items = count, "grocery list generated");
    Ok(list)
}

pub async fn latest_for_meal_plan(
    state: &AppState,
    meal_plan_id: Uuid,
) -> Result<GroceryList, AppError> {
    state
        .store
        .latest_grocery_list(meal_plan_id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Grocery list not found"))
}
