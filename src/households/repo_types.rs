use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Age at which a household member counts as an adult.
pub const ADULT_AGE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CookingSkill {
    Beginner,
    Intermediate,
    Advanced,
}

impl CookingSkill {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookingSkill::Beginner => "beginner",
            CookingSkill::Intermediate => "intermediate",
            CookingSkill::Advanced => "advanced",
        }
    }
}

impl fmt::Display for CookingSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CookingSkill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(CookingSkill::Beginner),
            "intermediate" => Ok(CookingSkill::Intermediate),
            "advanced" => Ok(CookingSkill::Advanced),
            other => Err(format!("unknown cooking skill: {other:?}")),
        }
    }
}

impl TryFrom<String> for CookingSkill {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Dietary tag. Known tags are normalised ("Gluten-Free" -> `gluten_free`);
/// anything else is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    NutFree,
    Kosher,
    Halal,
    Other(String),
}

impl From<String> for DietaryRestriction {
    fn from(value: String) -> Self {
        let key = value.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "vegetarian" => DietaryRestriction::Vegetarian,
            "vegan" => DietaryRestriction::Vegan,
            "gluten_free" | "no_gluten" => DietaryRestriction::GlutenFree,
            "dairy_free" | "no_dairy" | "lactose_free" => DietaryRestriction::DairyFree,
            "nut_free" | "no_nuts" | "nut_allergy" => DietaryRestriction::NutFree,
            "kosher" => DietaryRestriction::Kosher,
            "halal" => DietaryRestriction::Halal,
            _ => DietaryRestriction::Other(value.trim().to_string()),
        }
    }
}

impl From<DietaryRestriction> for String {
    fn from(value: DietaryRestriction) -> Self {
        match value {
            DietaryRestriction::Vegetarian => "vegetarian".into(),
            DietaryRestriction::Vegan => "vegan".into(),
            DietaryRestriction::GlutenFree => "gluten_free".into(),
            DietaryRestriction::DairyFree => "dairy_free".into(),
            DietaryRestriction::NutFree => "nut_free".into(),
            DietaryRestriction::Kosher => "kosher".into(),
            DietaryRestriction::Halal => "halal".into(),
            DietaryRestriction::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default = "default_true")]
    pub is_adult: bool,
    #[serde(default)]
    pub dietary_restrictions: Vec<DietaryRestriction>,
}

fn default_true() -> bool {
    true
}

impl Member {
    /// Recomputes `is_adult` from age (no age means adult) and drops repeated tags.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.is_adult = self.age.map_or(true, |age| age >= ADULT_AGE);
        let mut seen = Vec::with_capacity(self.dietary_restrictions.len());
        for tag in self.dietary_restrictions.drain(..) {
            if !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        self.dietary_restrictions = seen;
        self
    }

    pub fn is_child(&self) -> bool {
        !self.is_adult
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub members: Vec<Member>,
    pub cooking_skill: CookingSkill,
    pub max_cooking_time: u32,
    pub favorite_cuisines: Vec<String>,
    pub dislikes: Vec<String>,
    pub kitchen_equipment: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// `household_profiles` row as stored.
#[derive(Debug, FromRow)]
pub struct HouseholdRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub members: Json<Vec<Member>>,
    pub cooking_skill: String,
    pub max_cooking_time: i32,
    pub favorite_cuisines: Vec<String>,
    pub dislikes: Vec<String>,
    pub kitchen_equipment: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<HouseholdRow> for HouseholdProfile {
    type Error = anyhow::Error;

    fn try_from(r: HouseholdRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            members: r.members.0,
            cooking_skill: r.cooking_skill.parse().map_err(anyhow::Error::msg)?,
            max_cooking_time: u32::try_from(r.max_cooking_time).unwrap_or(0),
            favorite_cuisines: r.favorite_cuisines,
            dislikes: r.dislikes,
            kitchen_equipment: r.kitchen_equipment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
