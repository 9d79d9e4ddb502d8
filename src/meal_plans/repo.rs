use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{MealPlan, MealPlanRow};

const COLUMNS: &str = "id, household_id, week_start_date, meals, weekly_context, created_at";

pub async fn insert_meal_plan(db: &PgPool, plan: &MealPlan) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meal_plans (id, household_id, week_start_date, meals, weekly_context, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(plan.id)
    .bind(plan.household_id)
    .bind(plan.week_start_date)
    .bind(Json(&plan.meals))
    .bind(plan.weekly_context.as_deref())
    .bind(plan.created_at)
    .execute(db)
    .await
    .context("insert meal plan")?;
    Ok(())
}

pub async fn get_meal_plan(db: &PgPool, id: Uuid) -> anyhow::Result<Option<MealPlan>> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        "SELECT {COLUMNS} FROM meal_plans WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get meal plan")?;
    Ok(row.map(MealPlan::from))
}

/// Newest first.
pub async fn list_by_household(
    db: &PgPool,
    household_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<MealPlan>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
        "SELECT {COLUMNS} FROM meal_plans WHERE household_id = $1 \
         ORDER BY created_at DESC LIMIT $2"
    ))
    .bind(household_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("list meal plans")?;
    Ok(rows.into_iter().map(MealPlan::from).collect())
}

/// Manual day edits only ever touch the meals column.
pub async fn update_meals(db: &PgPool, plan: &MealPlan) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE meal_plans SET meals = $2 WHERE id = $1")
        .bind(plan.id)
        .bind(Json(&plan.meals))
        .execute(db)
        .await
        .context("update meal plan days")?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_meal_plan(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_plans WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete meal plan")?;
    Ok(res.rows_affected() > 0)
}
