use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{HouseholdProfile, HouseholdRow};

const COLUMNS: &str = "id, user_id, members, cooking_skill, max_cooking_time, \
     favorite_cuisines, dislikes, kitchen_equipment, created_at, updated_at";

/// Insert a new household profile.
pub async fn insert_household(db: &PgPool, p: &HouseholdProfile) -> anyhow::Result<()> {
    let max_cooking_time = i32::try_from(p.max_cooking_time).context("max_cooking_time out of range")?;
    sqlx::query(
        r#"
        INSERT INTO household_profiles
            (id, user_id, members, cooking_skill, max_cooking_time,
             favorite_cuisines, dislikes, kitchen_equipment, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(p.id)
    .bind(p.user_id)
    .bind(Json(&p.members))
    .bind(p.cooking_skill.as_str())
    .bind(max_cooking_time)
    .bind(&p.favorite_cuisines)
    .bind(&p.dislikes)
    .bind(&p.kitchen_equipment)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(db)
    .await
    .context("insert household profile")?;
    Ok(())
}

pub async fn get_household(db: &PgPool, id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
    let row = sqlx::query_as::<_, HouseholdRow>(&format!(
        "SELECT {COLUMNS} FROM household_profiles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get household profile")?;
    row.map(HouseholdProfile::try_from).transpose()
}

/// Most recently created profile linked to a user.
pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
    let row = sqlx::query_as::<_, HouseholdRow>(&format!(
        "SELECT {COLUMNS} FROM household_profiles \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find household by user")?;
    row.map(HouseholdProfile::try_from).transpose()
}

/// Overwrite every mutable column. Last writer wins.
pub async fn update_household(db: &PgPool, p: &HouseholdProfile) -> anyhow::Result<bool> {
    let max_cooking_time = i32::try_from(p.max_cooking_time).context("max_cooking_time out of range")?;
    let res = sqlx::query(
        r#"
        UPDATE household_profiles
           SET user_id = $2, members = $3, cooking_skill = $4, max_cooking_time = $5,
               favorite_cuisines = $6, dislikes = $7, kitchen_equipment = $8, updated_at = $9
         WHERE id = $1
        "#,
    )
    .bind(p.id)
    .bind(p.user_id)
    .bind(Json(&p.members))
    .bind(p.cooking_skill.as_str())
    .bind(max_cooking_time)
    .bind(&p.favorite_cuisines)
    .bind(&p.dislikes)
    .bind(&p.kitchen_equipment)
    .bind(p.updated_at)
    .execute(db)
    .await
    .context("update household profile")?;
    Ok(res.rows_affected() > 0)
}

/// Meal plans (and their grocery lists) go with the household; sessions keep
/// their history with the link cleared.
pub async fn delete_household(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM household_profiles WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete household profile")?;
    Ok(res.rows_affected() > 0)
}
