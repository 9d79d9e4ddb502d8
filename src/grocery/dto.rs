use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct GenerateGroceryListRequest {
    pub meal_plan_id: Option<Uuid>,
}
