use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::MealPlan;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateMealPlanRequest {
    pub household_id: Option<Uuid>,
    /// Completed weekly-planning session; without one every day is planned
    /// as a normal dinner.
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedMealPlan {
    pub meal_plan: MealPlan,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
