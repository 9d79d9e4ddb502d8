use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(day_date, Date, "[year]-[month]-[day]");

pub const DINING_OUT: &str = "Dining Out";
pub const NO_COOKING_PLANNED: &str = "No Cooking Planned";

/// Whether a menu title is one of the two non-cooking sentinels.
pub fn is_no_cooking_title(title: &str) -> bool {
    title == DINING_OUT || title == NO_COOKING_PLANNED
}

/// Day of the planning week. Ordering follows the week, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    #[serde(alias = "Sunday")]
    Sunday,
    #[serde(alias = "Monday")]
    Monday,
    #[serde(alias = "Tuesday")]
    Tuesday,
    #[serde(alias = "Wednesday")]
    Wednesday,
    #[serde(alias = "Thursday")]
    Thursday,
    #[serde(alias = "Friday")]
    Friday,
    #[serde(alias = "Saturday")]
    Saturday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Sunday => "sunday",
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
        }
    }

    /// Days after the week start.
    pub fn offset(&self) -> i64 {
        *self as i64
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Day::ALL
            .into_iter()
            .find(|d| d.as_str() == key)
            .ok_or_else(|| format!("unknown day: {s:?}"))
    }
}

/// Accepts `25`, `"25"` or `"25 minutes"`.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Minutes {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Minutes>::deserialize(deserializer)? {
        Some(Minutes::Number(n)) if n >= 0.0 => Some(n.round() as u32),
        Some(Minutes::Text(s)) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub prep_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub cook_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub servings: Option<u32>,
    /// Free-text lines, "quantity unit item".
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    NoCooking,
    SimpleTitle,
    CookedMeal,
}

/// What is planned for one day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayEntry {
    NoCooking { name: String, date: Option<Date> },
    SimpleTitle { name: String, date: Option<Date> },
    CookedMeal { date: Option<Date>, recipe: Recipe },
}

impl DayEntry {
    /// Classifies a menu title: the two sentinels mean no cooking.
    pub fn from_title(name: impl Into<String>, date: Option<Date>) -> Self {
        let name = name.into();
        if is_no_cooking_title(&name) {
            DayEntry::NoCooking { name, date }
        } else {
            DayEntry::SimpleTitle { name, date }
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            DayEntry::NoCooking { .. } => EntryKind::NoCooking,
            DayEntry::SimpleTitle { .. } => EntryKind::SimpleTitle,
            DayEntry::CookedMeal { .. } => EntryKind::CookedMeal,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DayEntry::NoCooking { name, .. } | DayEntry::SimpleTitle { name, .. } => name,
            DayEntry::CookedMeal { recipe, .. } => &recipe.name,
        }
    }

    pub fn date(&self) -> Option<Date> {
        match self {
            DayEntry::NoCooking { date, .. }
            | DayEntry::SimpleTitle { date, .. }
            | DayEntry::CookedMeal { date, .. } => *date,
        }
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        match self {
            DayEntry::CookedMeal { recipe, .. } => Some(recipe),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct WireEntry<'a> {
    #[serde(rename = "type")]
    kind: EntryKind,
    name: &'a str,
    #[serde(with = "day_date::option", skip_serializing_if = "Option::is_none")]
    date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipe: Option<&'a Recipe>,
}

impl Serialize for DayEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEntry {
            kind: self.kind(),
            name: self.name(),
            date: self.date(),
            recipe: self.recipe(),
        }
        .serialize(serializer)
    }
}

/// Every shape a stored day value has taken: a `{name, type, recipe}`
/// wrapper, a `{name, type, date}` title, or a bare recipe.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Wrapped {
        #[serde(default, with = "day_date::option")]
        date: Option<Date>,
        recipe: Recipe,
    },
    Titled {
        #[serde(rename = "type")]
        kind: String,
        name: String,
        #[serde(default, with = "day_date::option")]
        date: Option<Date>,
    },
    Bare(Recipe),
}

impl<'de> Deserialize<'de> for DayEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredEntry::deserialize(deserializer)? {
            StoredEntry::Wrapped { date, recipe } => DayEntry::CookedMeal { date, recipe },
            StoredEntry::Titled { kind, name, date } => {
                if kind == "no_cooking" || is_no_cooking_title(&name) {
                    DayEntry::NoCooking { name, date }
                } else {
                    DayEntry::SimpleTitle { name, date }
                }
            }
            StoredEntry::Bare(recipe) => DayEntry::CookedMeal { date: None, recipe },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: Uuid,
    pub household_id: Uuid,
    #[serde(with = "day_date")]
    pub week_start_date: Date,
    pub meals: BTreeMap<Day, DayEntry>,
    /// Weekly-planning transcript the plan was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_context: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct MealPlanRow {
    pub id: Uuid,
    pub household_id: Uuid,
    pub week_start_date: Date,
    pub meals: Json<BTreeMap<Day, DayEntry>>,
    pub weekly_context: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<MealPlanRow> for MealPlan {
    fn from(r: MealPlanRow) -> Self {
        Self {
            id: r.id,
            household_id: r.household_id,
            week_start_date: r.week_start_date,
            meals: r.meals.0,
            weekly_context: r.weekly_context,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn days_order_from_sunday_and_parse_any_case() {
        assert!(Day::Sunday < Day::Saturday);
        assert_eq!(Day::Wednesday.offset(), 3);
        assert_eq!(" Friday ".parse::<Day>().unwrap(), Day::Friday);
        assert!("funday".parse::<Day>().is_err());
    }

    #[test]
    fn title_entry_serialises_with_type_tag() {
        let e = DayEntry::from_title(DINING_OUT, Some(date!(2024 - 06 - 14)));
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({"type": "no_cooking", "name": "Dining Out", "date": "2024-06-14"})
        );
    }

    #[test]
    fn legacy_shapes_resolve_to_variants() {
        let wrapped: DayEntry = serde_json::from_value(json!({
            "name": "Tacos", "type": "cooked_meal",
            "recipe": {"name": "Tacos", "ingredients": ["1 lb ground beef"], "prep_time": "10 minutes"}
        }))
        .unwrap();
        assert_eq!(wrapped.kind(), EntryKind::CookedMeal);
        assert_eq!(wrapped.recipe().unwrap().prep_time, Some(10));

        let titled: DayEntry = serde_json::from_value(json!({
            "name": "Herb Roasted Chicken", "type": "simple_title", "date": "2024-06-10"
        }))
        .unwrap();
        assert_eq!(titled.kind(), EntryKind::SimpleTitle);
        assert_eq!(titled.date(), Some(date!(2024 - 06 - 10)));

        let skipped: DayEntry =
            serde_json::from_value(json!({"name": "No Cooking Planned", "type": "simple_title"})).unwrap();
        assert_eq!(skipped.kind(), EntryKind::NoCooking);

        let bare: DayEntry = serde_json::from_value(json!({
            "name": "Pasta Primavera", "ingredients": ["2 cups flour"], "servings": 4
        }))
        .unwrap();
        assert_eq!(bare.kind(), EntryKind::CookedMeal);
        assert_eq!(bare.name(), "Pasta Primavera");
    }

    #[test]
    fn cooked_meal_round_trips_through_wire_shape() {
        let e = DayEntry::CookedMeal {
            date: Some(date!(2024 - 06 - 09)),
            recipe: serde_json::from_value(json!({"name": "Chili", "ingredients": ["1 can beans"]})).unwrap(),
        };
        let wire = serde_json::to_value(&e).unwrap();
        assert_eq!(wire["type"], "cooked_meal");
        assert_eq!(wire["name"], "Chili");
        let back: DayEntry = serde_json::from_value(wire).unwrap();
        assert_eq!(back, e);
    }
}
