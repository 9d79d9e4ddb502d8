use serde::Deserialize;

use super::repo_types::{CookingSkill, Member};

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHouseholdRequest {
    pub members: Option<Vec<Member>>,
    pub cooking_skill: Option<CookingSkill>,
    pub max_cooking_time: Option<u32>,
    pub favorite_cuisines: Option<Vec<String>>,
    pub dislikes: Option<Vec<String>>,
    pub kitchen_equipment: Option<Vec<String>>,
}

/// Shape the onboarding extraction prompt asks the model to return.
#[derive(Debug, Deserialize)]
pub struct ExtractedProfile {
    #[serde(default)]
    pub members: Vec<Member>,
    pub cooking_skill: CookingSkill,
    pub max_cooking_time: Option<u32>,
    pub favorite_cuisines: Option<Vec<String>>,
    pub dislikes: Option<Vec<String>>,
    pub kitchen_equipment: Option<Vec<String>>,
}
