use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{GroceryList, GroceryListRow};

pub async fn insert_grocery_list(db: &PgPool, list: &GroceryList) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO grocery_lists (id, meal_plan_id, items, total_estimated_cost, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(list.id)
    .bind(list.meal_plan_id)
    .bind(Json(&list.items))
    .bind(list.total_estimated_cost)
    .bind(list.created_at)
    .execute(db)
    .await
    .context("insert grocery list")?;
    Ok(())
}

/// Most recently generated list for a plan.
pub async fn latest_for_meal_plan(
    db: &PgPool,
    meal_plan_id: Uuid,
) -> anyhow::Result<Option<GroceryList>> {
    let row = sqlx::query_as::<_, GroceryListRow>(
        r#"
        SELECT id, meal_plan_id, items, total_estimated_cost, created_at
          FROM grocery_lists
         WHERE meal_plan_id = $1
         ORDER BY created_at DESC
         LIMIT 1
        "#,
    )
    .bind(meal_plan_id)
    .fetch_optional(db)
    .await
    .context("get latest grocery list")?;
    Ok(row.map(GroceryList::from))
}
