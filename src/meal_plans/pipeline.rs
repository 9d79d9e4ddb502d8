//! Three-stage meal-plan generation.
//!
//! Stage A turns the weekly-planning transcript into per-day constraints,
//! Stage B asks for one dinner title per day under those constraints, and
//! Stage C pins the titles onto the dates of the current week.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use time::Date;
use tracing::{info, instrument, warn};

use super::calendar;
use super::constraints::{Portions, WeeklyConstraints};
use super::repo_types::{is_no_cooking_title, Day, DayEntry, DINING_OUT, NO_COOKING_PLANNED};
use crate::{
    error::AppError,
    households::HouseholdProfile,
    llm::{json::parse_json_reply, ChatMessage, CompletionRequest},
    state::AppState,
};

const CONSTRAINTS_PROMPT: &str = r#"You are an administrative agent that turns a weekly planning conversation into structured meal planning constraints.

For each day of the week decide:
- portions: "normal", "extra" (guests, leftovers), "none" (no dinner at home) or "reduced"
- complexity: "simple" (busy day), "normal" or "complex"
- notes: any specific request for that day, otherwise ""

Days not mentioned get {"portions": "normal", "complexity": "normal", "notes": ""}.

Return ONLY valid JSON in exactly this shape:
{
  "sunday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "monday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "tuesday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "wednesday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "thursday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "friday": {"portions": "normal", "complexity": "normal", "notes": ""},
  "saturday": {"portions": "normal", "complexity": "normal", "notes": ""}
}"#;

const MENU_PROMPT: &str = r#"You are a culinary expert creating balanced, varied weekly dinner menus.

Given a household profile and per-day constraints, pick one descriptive dinner title per day:
- vary proteins, cooking methods and cuisines; never repeat a meal within the week
- busy days ("simple") get quick meals; respect skill level and maximum cooking time
- respect every dietary restriction and dislike; keep children in mind
- a day with portions "none" gets exactly "Dining Out" if the household eats out that night, otherwise exactly "No Cooking Planned"

Title style: "Roasted Salmon with Steamed Broccoli and Rice Pilaf".

Return ONLY valid JSON mapping every day to a title:
{"sunday": "...", "monday": "...", "tuesday": "...", "wednesday": "...", "thursday": "...", "friday": "...", "saturday": "..."}"#;

/// Menu titles for a week plus anything worth flagging to the caller.
#[derive(Debug, Clone)]
pub struct MenuDraft {
    pub titles: BTreeMap<Day, String>,
    pub warnings: Vec<String>,
}

/// Stage A. An empty transcript yields the all-default week without a call.
#[instrument(skip(state, transcript), fields(chars = transcript.len()))]
pub async fn parse_constraints(
    state: &AppState,
    transcript: &str,
) -> Result<WeeklyConstraints, AppError> {
    if transcript.trim().is_empty() {
        return Ok(WeeklyConstraints::default());
    }

    let request = CompletionRequest::new(vec![
        ChatMessage::system(CONSTRAINTS_PROMPT),
        ChatMessage::user(format!(
            "Parse this weekly planning conversation into constraints:\n\n{transcript}"
        )),
    ])
    .temperature(0.1)
    .max_tokens(800);

    let reply = state.llm.complete(request).await?;
    let value = parse_json_reply(&reply.text)?;
    WeeklyConstraints::from_extraction(&value)
}

/// Stage B, with one regeneration when the model repeats a dinner.
#[instrument(skip_all, fields(household_id = %profile.id))]
pub async fn generate_menu(
    state: &AppState,
    profile: &HouseholdProfile,
    constraints: &WeeklyConstraints,
) -> Result<MenuDraft, AppError> {
    let context = menu_context(profile, constraints)?;

    let mut titles = request_titles(state, &context, None, constraints).await?;
    let mut repeated = duplicate_titles(&titles);
    if !repeated.is_empty() {
        info!(?repeated, "menu repeats a dinner; regenerating once");
        titles = request_titles(state, &context, Some(&repeated), constraints).await?;
        repeated = duplicate_titles(&titles);
    }

    let warnings = repeated
        .into_iter()
        .map(|t| format!("\"{t}\" appears more than once this week"))
        .collect::<Vec<_>>();
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "menu still has repeated dinners after regeneration");
    }
    Ok(MenuDraft { titles, warnings })
}

async fn request_titles(
    state: &AppState,
    context: &str,
    avoid: Option<&[String]>,
    constraints: &WeeklyConstraints,
) -> Result<BTreeMap<Day, String>, AppError> {
    let mut user = context.to_string();
    if let Some(avoid) = avoid {
        user.push_str(&format!(
            "\n\nYour previous menu repeated these dinners: {}. Do not repeat any meal within the week.",
            avoid.join(", ")
        ));
    }

    let request = CompletionRequest::new(vec![ChatMessage::system(MENU_PROMPT), ChatMessage::user(user)])
        .temperature(0.3)
        .max_tokens(1000);
    let reply = state.llm.complete(request).await?;
    let value = parse_json_reply(&reply.text)?;
    titles_from_reply(&value, constraints)
}

fn menu_context(
    profile: &HouseholdProfile,
    constraints: &WeeklyConstraints,
) -> Result<String, AppError> {
    let constraints_json = serde_json::to_string_pretty(constraints)
        .map_err(|e| AppError::extraction(format!("cannot encode constraints: {e}")))?;
    Ok(format!(
        "Household profile:\n{}\n\nWeekly constraints:\n{constraints_json}",
        describe_household(profile)
    ))
}

/// Plain-text household summary for the menu prompt.
pub fn describe_household(profile: &HouseholdProfile) -> String {
    let mut lines = Vec::new();

    let adults = profile.members.iter().filter(|m| m.is_adult).count();
    let children: Vec<String> = profile
        .members
        .iter()
        .filter(|m| m.is_child())
        .map(|m| match m.age {
            Some(age) => format!("{} ({age})", m.name),
            None => m.name.clone(),
        })
        .collect();
    lines.push(format!("- people: {} ({adults} adults)", profile.members.len()));
    if !children.is_empty() {
        lines.push(format!("- children: {}", children.join(", ")));
    }

    let restrictions: Vec<String> = profile
        .members
        .iter()
        .filter(|m| !m.dietary_restrictions.is_empty())
        .map(|m| {
            let tags: Vec<String> = m.dietary_restrictions.iter().cloned().map(String::from).collect();
            format!("{}: {}", m.name, tags.join(", "))
        })
        .collect();
    if !restrictions.is_empty() {
        lines.push(format!("- dietary restrictions: {}", restrictions.join("; ")));
    }

    lines.push(format!("- cooking skill: {}", profile.cooking_skill));
    lines.push(format!("- max cooking time: {} minutes", profile.max_cooking_time));
    for (label, list) in [
        ("favorite cuisines", &profile.favorite_cuisines),
        ("dislikes", &profile.dislikes),
        ("kitchen equipment", &profile.kitchen_equipment),
    ] {
        if !list.is_empty() {
            lines.push(format!("- {label}: {}", list.join(", ")));
        }
    }
    lines.join("\n")
}

fn eats_out(notes: &str) -> bool {
    lazy_static! {
        static ref EATING_OUT: Regex =
            Regex::new(r"(?i)\b(out|restaurant|restaurants|dining|takeout|take-out|party)\b").unwrap();
    }
    EATING_OUT.is_match(notes)
}

/// Validates a Stage B reply: every day must have a title, and a day that
/// needs no dinner always ends up with one of the two sentinels.
pub fn titles_from_reply(
    value: &serde_json::Value,
    constraints: &WeeklyConstraints,
) -> Result<BTreeMap<Day, String>, AppError> {
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::extraction("menu must be a JSON object"))?;

    let mut titles = BTreeMap::new();
    for (key, raw) in obj {
        let Ok(day) = key.parse::<Day>() else { continue };
        let title = match raw {
            serde_json::Value::String(s) => s.trim().to_string(),
            other => other
                .get("title")
                .or_else(|| other.get("name"))
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        };
        if !title.is_empty() {
            titles.insert(day, title);
        }
    }

    if let Some(missing) = Day::ALL.into_iter().find(|d| !titles.contains_key(d)) {
        return Err(AppError::extraction(format!("menu has no title for {missing}")));
    }

    for (day, constraint) in constraints.iter() {
        if constraint.portions != Portions::NoMeal {
            continue;
        }
        if let Some(title) = titles.get_mut(&day) {
            if !is_no_cooking_title(title) {
                let forced = if eats_out(&constraint.notes) { DINING_OUT } else { NO_COOKING_PLANNED };
                info!(%day, replaced = %title, "day needs no dinner; replacing cooking title");
                *title = forced.to_string();
            }
        }
    }
    Ok(titles)
}

/// Cooking titles used on more than one day, compared case-insensitively.
pub fn duplicate_titles(titles: &BTreeMap<Day, String>) -> Vec<String> {
    let mut seen: BTreeMap<String, (&str, usize)> = BTreeMap::new();
    for title in titles.values().filter(|t| !is_no_cooking_title(t)) {
        seen.entry(title.to_lowercase()).or_insert((title.as_str(), 0)).1 += 1;
    }
    seen.into_values()
        .filter(|(_, n)| *n > 1)
        .map(|(t, _)| t.to_string())
        .collect()
}

/// Stage C: dates each title and classifies it.
pub fn assemble_week(week_start: Date, titles: BTreeMap<Day, String>) -> BTreeMap<Day, DayEntry> {
    titles
        .into_iter()
        .map(|(day, title)| {
            let date = calendar::date_for(week_start, day);
            (day, DayEntry::from_title(title, Some(date)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::households::services::profile_from_extraction;
    use crate::llm::ScriptedGateway;
    use crate::meal_plans::constraints::Complexity;
    use crate::meal_plans::repo_types::EntryKind;
    use serde_json::json;
    use std::sync::Arc;
    use time::macros::date;

    fn profile() -> HouseholdProfile {
        profile_from_extraction(
            json!({
                "members": [
                    {"name": "Sam", "age": null, "dietary_restrictions": ["vegetarian"]},
                    {"name": "Leo", "age": 7}
                ],
                "cooking_skill": "beginner",
                "favorite_cuisines": ["Italian"]
            }),
            None,
        )
        .unwrap()
    }

    fn week(titles: [&str; 7]) -> String {
        let obj: serde_json::Map<String, serde_json::Value> = Day::ALL
            .into_iter()
            .zip(titles)
            .map(|(d, t)| (d.to_string(), json!(t)))
            .collect();
        serde_json::Value::Object(obj).to_string()
    }

    const BUSY_WEEK: &str = r#"```json
{
  "tuesday": {"portions": "normal", "complexity": "simple", "notes": "busy day"},
  "friday": {"portions": "none", "complexity": "normal", "notes": "eating out"}
}
```"#;

    #[tokio::test]
    async fn busy_tuesday_and_eating_out_friday() {
        let llm = Arc::new(ScriptedGateway::new([
            BUSY_WEEK.to_string(),
            week([
                "Veggie Lasagna",
                "Mushroom Risotto",
                "Quick Bean Tacos",
                "Caprese Pasta Bake",
                "Black Bean Burgers",
                "Margherita Pizza",
                "Vegetable Stir-Fry with Rice",
            ]),
        ]));
        let state = AppState::with_script(llm.clone());

        let constraints = parse_constraints(
            &state,
            "User: We're busy Tuesday and eating out Friday\nAssistant: Got it!",
        )
        .await
        .unwrap();
        assert_eq!(constraints.get(Day::Tuesday).complexity, Complexity::Simple);
        assert_eq!(constraints.get(Day::Friday).portions, Portions::NoMeal);
        assert_eq!(constraints.get(Day::Monday).portions, Portions::Normal);

        let draft = generate_menu(&state, &profile(), &constraints).await.unwrap();
        assert_eq!(draft.titles[&Day::Friday], "Dining Out");
        assert!(draft.warnings.is_empty());

        let requests = llm.requests();
        assert_eq!(requests[0].temperature, Some(0.1));
        assert_eq!(requests[1].max_tokens, Some(1000));
        assert!(requests[1].messages[1].content.contains("vegetarian"));
    }

    #[tokio::test]
    async fn empty_transcript_skips_the_model() {
        let llm = Arc::new(ScriptedGateway::default());
        let state = AppState::with_script(llm.clone());
        let c = parse_constraints(&state, "   ").await.unwrap();
        assert_eq!(c, WeeklyConstraints::default());
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn repeated_dinner_triggers_one_regeneration() {
        let repeated = week([
            "Chicken Curry",
            "chicken curry",
            "Fish Tacos",
            "Beef Stew",
            "Pasta Bake",
            "Pizza Night",
            "Chicken Curry",
        ]);
        let llm = Arc::new(ScriptedGateway::new([repeated.clone(), repeated]));
        let state = AppState::with_script(llm.clone());

        let draft = generate_menu(&state, &profile(), &WeeklyConstraints::default())
            .await
            .unwrap();
        assert_eq!(llm.requests().len(), 2);
        assert!(llm.requests()[1].messages[1].content.contains("Do not repeat"));
        assert_eq!(draft.warnings.len(), 1);
        assert!(draft.warnings[0].contains("Chicken Curry"));
    }

    #[test]
    fn missing_day_in_menu_is_extraction_error() {
        let value = json!({"monday": "Tacos"});
        let err = titles_from_reply(&value, &WeeklyConstraints::default()).unwrap_err();
        assert_eq!(err.code(), "extraction_error");
    }

    #[test]
    fn no_meal_day_without_eating_out_gets_no_cooking() {
        let mut c = WeeklyConstraints::default();
        c.set(
            Day::Wednesday,
            crate::meal_plans::constraints::DayConstraint {
                portions: Portions::NoMeal,
                complexity: Complexity::Normal,
                notes: "travelling".into(),
            },
        );
        let value: serde_json::Value =
            serde_json::from_str(&week(["A", "B", "C", "Grilled Salmon", "E", "F", "G"])).unwrap();
        let titles = titles_from_reply(&value, &c).unwrap();
        assert_eq!(titles[&Day::Wednesday], NO_COOKING_PLANNED);
    }

    #[test]
    fn sentinel_duplicates_are_not_flagged() {
        let titles: BTreeMap<Day, String> = Day::ALL
            .into_iter()
            .map(|d| (d, if d == Day::Sunday { "Roast".to_string() } else { DINING_OUT.to_string() }))
            .collect();
        assert!(duplicate_titles(&titles).is_empty());
    }

    #[test]
    fn week_is_dated_from_sunday_and_classified() {
        let titles: BTreeMap<Day, String> = Day::ALL
            .into_iter()
            .map(|d| (d, if d == Day::Friday { DINING_OUT.to_string() } else { format!("Meal {d}") }))
            .collect();
        let meals = assemble_week(date!(2024 - 06 - 09), titles);
        assert_eq!(meals.len(), 7);
        assert_eq!(meals[&Day::Friday].kind(), EntryKind::NoCooking);
        assert_eq!(meals[&Day::Friday].date(), Some(date!(2024 - 06 - 14)));
        assert_eq!(meals[&Day::Sunday].kind(), EntryKind::SimpleTitle);
        assert_eq!(meals[&Day::Sunday].date(), Some(date!(2024 - 06 - 09)));
    }
}
