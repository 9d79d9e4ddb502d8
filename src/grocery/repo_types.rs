use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::builder::GroceryItems;

/// Categorised shopping list derived from one meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub items: GroceryItems,
    /// Not estimated yet; always null.
    pub total_estimated_cost: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct GroceryListRow {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub items: Json<GroceryItems>,
    pub total_estimated_cost: Option<f64>,
    pub created_at: OffsetDateTime,
}

impl From<GroceryListRow> for GroceryList {
    fn from(r: GroceryListRow) -> Self {
        Self {
            id: r.id,
            meal_plan_id: r.meal_plan_id,
            items: r.items.0,
            total_estimated_cost: r.total_estimated_cost,
            created_at: r.created_at,
        }
    }
}
