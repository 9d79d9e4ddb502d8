use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::calendar;
use super::constraints::WeeklyConstraints;
use super::dto::GeneratedMealPlan;
use super::pipeline;
use super::recipes;
use super::repo_types::{Day, DayEntry, MealPlan, Recipe};
use crate::{
    chat::{ConversationSession, Phase},
    error::AppError,
    households,
    state::AppState,
};

pub const HOUSEHOLD_PLAN_LIMIT: i64 = 10;

/// Constraints for a finished weekly conversation: the ones extracted when
/// the session completed, or a fresh Stage A run when none were stored.
async fn constraints_for(
    state: &AppState,
    session: &ConversationSession,
) -> Result<WeeklyConstraints, AppError> {
    if let Some(stored) = session.extracted.clone() {
        match WeeklyConstraints::from_stored(stored) {
            Ok(c) => return Ok(c),
            Err(e) => warn!(session_id = %session.id, error = %e, "stored constraints unreadable; re-parsing"),
        }
    }
    pipeline::parse_constraints(state, &session.transcript()).await
}

async fn weekly_session(
    state: &AppState,
    session_id: Uuid,
    household_id: Uuid,
) -> Result<ConversationSession, AppError> {
    let session = state
        .store
        .get_session(session_id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Session not found"))?;

    if session.phase != Phase::WeeklyPlanning {
        return Err(AppError::invalid("session is not a weekly planning session"));
    }
    if session.household_id.is_some_and(|h| h != household_id) {
        return Err(AppError::invalid("session belongs to a different household"));
    }
    if !session.completed {
        return Err(AppError::invalid("weekly planning conversation is not finished yet"));
    }
    Ok(session)
}

/// Runs Stage A/B/C and stores the result as a new plan. Earlier plans for
/// the household are left untouched.
#[instrument(skip(state))]
pub async fn generate_meal_plan(
    state: &AppState,
    household_id: Uuid,
    session_id: Option<Uuid>,
) -> Result<GeneratedMealPlan, AppError> {
    let profile = households::services::get_household(state, household_id).await?;

    let (constraints, weekly_context) = match session_id {
        Some(id) => {
            let session = weekly_session(state, id, household_id).await?;
            (constraints_for(state, &session).await?, Some(session.transcript()))
        }
        None => (WeeklyConstraints::default(), None),
    };

    let draft = pipeline::generate_menu(state, &profile, &constraints).await?;
    let now = OffsetDateTime::now_utc();
    let week_start = calendar::week_start(now.date());

    let plan = MealPlan {
        id: Uuid::new_v4(),
        household_id,
        week_start_date: week_start,
        meals: pipeline::assemble_week(week_start, draft.titles),
        weekly_context,
        created_at: now,
    };
    state
        .store
        .insert_meal_plan(&plan)
        .await
        .map_err(AppError::persistence)?;
    info!(meal_plan_id = %plan.id, %household_id, week_start = %week_start, "meal plan generated");

    Ok(GeneratedMealPlan { meal_plan: plan, warnings: draft.warnings })
}

pub async fn get_meal_plan(state: &AppState, id: Uuid) -> Result<MealPlan, AppError> {
    state
        .store
        .get_meal_plan(id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Meal plan not found"))
}

pub async fn list_for_household(
    state: &AppState,
    household_id: Uuid,
) -> Result<Vec<MealPlan>, AppError> {
    state
        .store
        .list_meal_plans(household_id, HOUSEHOLD_PLAN_LIMIT)
        .await
        .map_err(AppError::persistence)
}

pub async fn delete_meal_plan(state: &AppState, id: Uuid) -> Result<(), AppError> {
    let deleted = state
        .store
        .delete_meal_plan(id)
        .await
        .map_err(AppError::persistence)?;
    if !deleted {
        return Err(AppError::not_found("Meal plan not found"));
    }
    info!(meal_plan_id = %id, "meal plan deleted");
    Ok(())
}

async fn save_days(state: &AppState, plan: &MealPlan) -> Result<(), AppError> {
    let updated = state
        .store
        .update_meal_plan(plan)
        .await
        .map_err(AppError::persistence)?;
    if !updated {
        return Err(AppError::not_found("Meal plan not found"));
    }
    Ok(())
}

/// Attaches a full recipe to a day, replacing whatever was planned.
#[instrument(skip(state, recipe))]
pub async fn set_day_recipe(
    state: &AppState,
    id: Uuid,
    day: Day,
    recipe: Recipe,
) -> Result<MealPlan, AppError> {
    if recipe.name.trim().is_empty() {
        return Err(AppError::invalid("recipe needs a name"));
    }
    let mut plan = get_meal_plan(state, id).await?;
    let date = calendar::date_for(plan.week_start_date, day);
    plan.meals.insert(day, DayEntry::CookedMeal { date: Some(date), recipe });
    save_days(state, &plan).await?;
    Ok(plan)
}

/// Develops the full recipe for a planned dinner and stores it on that day.
/// A day that already has a recipe is redeveloped from its name.
#[instrument(skip(state))]
pub async fn develop_day_recipe(state: &AppState, id: Uuid, day: Day) -> Result<MealPlan, AppError> {
    let mut plan = get_meal_plan(state, id).await?;
    let title = match plan.meals.get(&day) {
        Some(DayEntry::SimpleTitle { name, .. }) => name.clone(),
        Some(DayEntry::CookedMeal { recipe, .. }) => recipe.name.clone(),
        Some(DayEntry::NoCooking { name, .. }) => {
            return Err(AppError::invalid(format!("{day} is planned as \"{name}\"; nothing to cook")))
        }
        None => return Err(AppError::invalid(format!("nothing is planned for {day}"))),
    };

    let profile = households::services::get_household(state, plan.household_id).await?;
    let recipe = recipes::develop_recipe(state, &profile, &title).await?;
    let date = calendar::date_for(plan.week_start_date, day);
    plan.meals.insert(day, DayEntry::CookedMeal { date: Some(date), recipe });
    save_days(state, &plan).await?;
    info!(meal_plan_id = %id, %day, "day recipe stored");
    Ok(plan)
}

/// Removes a day's entry. Clearing an empty day is a no-op.
#[instrument(skip(state))]
pub async fn clear_day(state: &AppState, id: Uuid, day: Day) -> Result<MealPlan, AppError> {
    let mut plan = get_meal_plan(state, id).await?;
    if plan.meals.remove(&day).is_some() {
        save_days(state, &plan).await?;
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::households::services::{profile_from_extraction, save_onboarding_profile};
    use crate::llm::ScriptedGateway;
    use crate::meal_plans::repo_types::EntryKind;
    use serde_json::json;
    use std::sync::Arc;

    const MENU: &str = r#"{"sunday": "Roast Chicken", "monday": "Beef Tacos", "tuesday": "Pasta Primavera",
        "wednesday": "Salmon Bowls", "thursday": "Veggie Curry", "friday": "Pizza", "saturday": "Chili"}"#;

    async fn household(state: &AppState) -> Uuid {
        let p = profile_from_extraction(
            json!({"members": [{"name": "Ana"}], "cooking_skill": "advanced"}),
            None,
        )
        .unwrap();
        save_onboarding_profile(state, p).await.unwrap().id
    }

    #[tokio::test]
    async fn generate_without_session_persists_dated_plan() {
        let llm = Arc::new(ScriptedGateway::new([MENU]));
        let state = AppState::with_script(llm);
        let household_id = household(&state).await;

        let out = generate_meal_plan(&state, household_id, None).await.unwrap();
        assert_eq!(out.meal_plan.meals.len(), 7);
        assert_eq!(out.meal_plan.week_start_date.weekday(), time::Weekday::Sunday);
        assert!(out.meal_plan.meals.values().all(|e| e.kind() == EntryKind::SimpleTitle));

        let stored = get_meal_plan(&state, out.meal_plan.id).await.unwrap();
        assert_eq!(stored, out.meal_plan);
    }

    #[tokio::test]
    async fn regeneration_creates_a_new_plan() {
        let llm = Arc::new(ScriptedGateway::new([MENU, MENU]));
        let state = AppState::with_script(llm);
        let household_id = household(&state).await;

        let first = generate_meal_plan(&state, household_id, None).await.unwrap();
        let second = generate_meal_plan(&state, household_id, None).await.unwrap();
        assert_ne!(first.meal_plan.id, second.meal_plan.id);

        let plans = list_for_household(&state, household_id).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, second.meal_plan.id);
    }

    #[tokio::test]
    async fn unfinished_session_is_rejected() {
        let state = AppState::fake();
        let household_id = household(&state).await;
        let session = ConversationSession::new(Phase::WeeklyPlanning, Some(household_id), None);
        state.store.insert_session(&session).await.unwrap();

        let err = generate_meal_plan(&state, household_id, Some(session.id)).await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[tokio::test]
    async fn stored_constraints_are_reused() {
        let llm = Arc::new(ScriptedGateway::new([MENU]));
        let state = AppState::with_script(llm.clone());
        let household_id = household(&state).await;

        let mut session = ConversationSession::new(Phase::WeeklyPlanning, Some(household_id), None);
        session.append_user("eating out friday");
        session.completed = true;
        session.extracted = Some(json!({"friday": {"portions": "none", "complexity": "normal", "notes": "dinner out"}}));
        state.store.insert_session(&session).await.unwrap();

        let out = generate_meal_plan(&state, household_id, Some(session.id)).await.unwrap();
        assert_eq!(llm.requests().len(), 1);
        assert_eq!(out.meal_plan.meals[&Day::Friday].name(), "Dining Out");
        assert_eq!(out.meal_plan.weekly_context.as_deref(), Some("User: eating out friday"));
    }

    #[tokio::test]
    async fn manual_day_edits() {
        let llm = Arc::new(ScriptedGateway::new([MENU]));
        let state = AppState::with_script(llm);
        let household_id = household(&state).await;
        let plan = generate_meal_plan(&state, household_id, None).await.unwrap().meal_plan;

        let recipe: Recipe = serde_json::from_value(json!({
            "name": "Beef Tacos", "ingredients": ["1 lb ground beef", "8 tortillas"]
        }))
        .unwrap();
        let edited = set_day_recipe(&state, plan.id, Day::Monday, recipe).await.unwrap();
        assert_eq!(edited.meals[&Day::Monday].kind(), EntryKind::CookedMeal);
        assert_eq!(
            edited.meals[&Day::Monday].date(),
            Some(calendar::date_for(plan.week_start_date, Day::Monday))
        );

        let cleared = clear_day(&state, plan.id, Day::Tuesday).await.unwrap();
        assert!(!cleared.meals.contains_key(&Day::Tuesday));
        let stored = get_meal_plan(&state, plan.id).await.unwrap();
        assert_eq!(stored.meals.len(), 6);
        assert_eq!(stored.meals[&Day::Monday].kind(), EntryKind::CookedMeal);
    }

    #[tokio::test]
    async fn developed_recipe_feeds_the_grocery_list() {
        use crate::grocery::{categories::Category, services::generate_grocery_list};

        let recipe = r#"```json
{"name": "Beef Tacos", "prep_time": 10, "cook_time": "15 minutes", "servings": 2,
 "ingredients": ["1 lb ground beef", "8 tortillas", "1 onion"],
 "instructions": ["Brown the beef", "Warm the tortillas"]}
```"#;
        let llm = Arc::new(ScriptedGateway::new([MENU, recipe]));
        let state = AppState::with_script(llm.clone());
        let household_id = household(&state).await;
        let plan = generate_meal_plan(&state, household_id, None).await.unwrap().meal_plan;

        let empty = generate_grocery_list(&state, plan.id).await.unwrap();
        assert!(empty.items.values().all(Vec::is_empty));

        let developed = develop_day_recipe(&state, plan.id, Day::Monday).await.unwrap();
        let monday = &developed.meals[&Day::Monday];
        assert_eq!(monday.kind(), EntryKind::CookedMeal);
        assert_eq!(monday.name(), "Beef Tacos");
        assert_eq!(monday.recipe().unwrap().cook_time, Some(15));
        assert_eq!(monday.date(), Some(calendar::date_for(plan.week_start_date, Day::Monday)));

        let sent = &llm.requests()[1];
        assert_eq!(sent.temperature, Some(0.3));
        assert!(sent.messages[1].content.contains("Dinner: Beef Tacos"));

        let list = generate_grocery_list(&state, plan.id).await.unwrap();
        assert_eq!(list.items[&Category::Meat], vec!["1 lb ground beef"]);
        assert_eq!(list.items[&Category::Bakery], vec!["8 tortillas"]);
        assert_eq!(list.items[&Category::Produce], vec!["onion"]);
    }

    #[tokio::test]
    async fn develop_rejects_no_cooking_days_and_bad_json() {
        let llm = Arc::new(ScriptedGateway::new([MENU, "Sure! Here is a recipe for you."]));
        let state = AppState::with_script(llm);
        let household_id = household(&state).await;
        let mut plan = generate_meal_plan(&state, household_id, None).await.unwrap().meal_plan;

        plan.meals.insert(Day::Friday, DayEntry::from_title("Dining Out", None));
        state.store.update_meal_plan(&plan).await.unwrap();
        let err = develop_day_recipe(&state, plan.id, Day::Friday).await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");

        let err = develop_day_recipe(&state, plan.id, Day::Sunday).await.unwrap_err();
        assert_eq!(err.code(), "extraction_error");
        let stored = get_meal_plan(&state, plan.id).await.unwrap();
        assert_eq!(stored.meals[&Day::Sunday].kind(), EntryKind::SimpleTitle);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let llm = Arc::new(ScriptedGateway::new([MENU]));
        let state = AppState::with_script(llm);
        let household_id = household(&state).await;
        let plan = generate_meal_plan(&state, household_id, None).await.unwrap().meal_plan;

        delete_meal_plan(&state, plan.id).await.unwrap();
        let err = delete_meal_plan(&state, plan.id).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
