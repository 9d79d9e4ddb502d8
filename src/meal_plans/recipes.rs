//! Turns a planned dinner title into a full recipe for the household.

use tracing::{info, instrument};

use super::pipeline::describe_household;
use super::repo_types::Recipe;
use crate::{
    error::AppError,
    households::HouseholdProfile,
    llm::{json::parse_json_reply, ChatMessage, CompletionRequest},
    state::AppState,
};

const RECIPE_TEMPERATURE: f32 = 0.3;
const RECIPE_MAX_TOKENS: u32 = 1500;

const RECIPE_PROMPT: &str = r#"You are a professional recipe developer writing practical recipes that real families cook.

Write the recipe for the requested dinner, adapted to the household:
- respect every dietary restriction and dislike
- stay within the maximum cooking time and the household's skill level
- only use the kitchen equipment listed, plus basic pots, pans and an oven
- scale to the number of people in the household

Write every ingredient as "quantity unit item", e.g. "2 cups basmati rice", "1 lb chicken breast", "1 onion".

Return ONLY valid JSON in exactly this shape:
{
  "name": "Recipe name",
  "description": "One sentence about the dish",
  "prep_time": 15,
  "cook_time": 30,
  "servings": 4,
  "difficulty": "beginner|intermediate|advanced",
  "cuisine": "Cuisine",
  "ingredients": ["1 lb chicken breast", "2 cups basmati rice"],
  "instructions": ["Step one", "Step two"],
  "equipment": ["Large skillet"],
  "dietary_tags": ["gluten-free"],
  "tips": ["Storage or substitution advice"],
  "nutrition": {"calories": 350, "protein": "25g", "carbs": "40g", "fat": "10g"}
}"#;

/// Validates a recipe reply. The planned title is kept when the model
/// leaves the name out.
pub fn recipe_from_reply(mut value: serde_json::Value, title: &str) -> Result<Recipe, AppError> {
    if let Some(obj) = value.as_object_mut() {
        let named = obj
            .get("name")
            .and_then(|v| v.as_str())
            .is_some_and(|n| !n.trim().is_empty());
        if !named {
            obj.insert("name".into(), title.into());
        }
    }
    let mut recipe: Recipe = serde_json::from_value(value)
        .map_err(|e| AppError::extraction(format!("recipe does not match schema: {e}")))?;
    recipe.ingredients.retain(|line| !line.trim().is_empty());
    if recipe.ingredients.is_empty() {
        return Err(AppError::extraction("recipe has no ingredients"));
    }
    Ok(recipe)
}

#[instrument(skip(state, profile), fields(household_id = %profile.id))]
pub async fn develop_recipe(
    state: &AppState,
    profile: &HouseholdProfile,
    title: &str,
) -> Result<Recipe, AppError> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(RECIPE_PROMPT),
        ChatMessage::user(format!(
            "Dinner: {title}\n\nHousehold profile:\n{}",
            describe_household(profile)
        )),
    ])
    .temperature(RECIPE_TEMPERATURE)
    .max_tokens(RECIPE_MAX_TOKENS);

    let reply = state.llm.complete(request).await?;
    let recipe = recipe_from_reply(parse_json_reply(&reply.text)?, title)?;
    info!(name = %recipe.name, ingredients = recipe.ingredients.len(), "recipe developed");
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_name_falls_back_to_title() {
        let r = recipe_from_reply(
            json!({"ingredients": ["1 lb ground beef", "", "8 tortillas"], "prep_time": "10 minutes"}),
            "Beef Tacos",
        )
        .unwrap();
        assert_eq!(r.name, "Beef Tacos");
        assert_eq!(r.ingredients, vec!["1 lb ground beef", "8 tortillas"]);
        assert_eq!(r.prep_time, Some(10));
    }

    #[test]
    fn recipe_without_ingredients_is_an_extraction_error() {
        let err = recipe_from_reply(json!({"name": "Air"}), "Air").unwrap_err();
        assert_eq!(err.code(), "extraction_error");
        let err = recipe_from_reply(json!(["not", "an", "object"]), "X").unwrap_err();
        assert_eq!(err.code(), "extraction_error");
    }
}
