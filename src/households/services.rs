use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{ExtractedProfile, UpdateHouseholdRequest};
use super::repo_types::{HouseholdProfile, Member};
use crate::{error::AppError, state::AppState};

pub const DEFAULT_MAX_COOKING_TIME: u32 = 45;
/// Upper bound on `max_cooking_time`, in minutes.
pub const MAX_COOKING_TIME_LIMIT: u32 = 24 * 60;

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(&item)) {
            out.push(item);
        }
    }
    out
}

fn validate_members(members: Vec<Member>) -> Result<Vec<Member>, String> {
    let members: Vec<Member> = members.into_iter().map(Member::normalized).collect();
    if members.is_empty() {
        return Err("household must have at least one member".into());
    }
    if members.iter().any(|m| m.name.is_empty()) {
        return Err("every household member needs a name".into());
    }
    Ok(members)
}

/// Turns the onboarding extraction JSON into a validated profile.
///
/// Either every required field is present and well-formed or the whole
/// extraction is rejected.
pub fn profile_from_extraction(
    value: serde_json::Value,
    user_id: Option<Uuid>,
) -> Result<HouseholdProfile, AppError> {
    let extracted: ExtractedProfile = serde_json::from_value(value)
        .map_err(|e| AppError::extraction(format!("onboarding data does not match schema: {e}")))?;
    let members = validate_members(extracted.members).map_err(AppError::extraction)?;

    let now = OffsetDateTime::now_utc();
    Ok(HouseholdProfile {
        id: Uuid::new_v4(),
        user_id,
        members,
        cooking_skill: extracted.cooking_skill,
        max_cooking_time: extracted
            .max_cooking_time
            .filter(|m| (1..=MAX_COOKING_TIME_LIMIT).contains(m))
            .unwrap_or(DEFAULT_MAX_COOKING_TIME),
        favorite_cuisines: clean_list(extracted.favorite_cuisines.unwrap_or_default()),
        dislikes: clean_list(extracted.dislikes.unwrap_or_default()),
        kitchen_equipment: clean_list(extracted.kitchen_equipment.unwrap_or_default()),
        created_at: now,
        updated_at: now,
    })
}

/// Persists a profile produced by onboarding. A user keeps at most one
/// household: an existing one is overwritten in place.
#[instrument(skip(state, profile), fields(household_id = %profile.id))]
pub async fn save_onboarding_profile(
    state: &AppState,
    mut profile: HouseholdProfile,
) -> Result<HouseholdProfile, AppError> {
    if let Some(user_id) = profile.user_id {
        let existing = state
            .store
            .household_by_user(user_id)
            .await
            .map_err(AppError::persistence)?;
        if let Some(existing) = existing {
            warn!(%user_id, existing = %existing.id, "user already has a household; replacing profile");
            profile.id = existing.id;
            profile.created_at = existing.created_at;
            state
                .store
                .update_household(&profile)
                .await
                .map_err(AppError::persistence)?;
            return Ok(profile);
        }
    }

    state
        .store
        .insert_household(&profile)
        .await
        .map_err(AppError::persistence)?;
    info!(household_id = %profile.id, members = profile.members.len(), "household profile created");
    Ok(profile)
}

pub async fn get_household(state: &AppState, id: Uuid) -> Result<HouseholdProfile, AppError> {
    state
        .store
        .get_household(id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Household not found"))
}

pub async fn household_for_user(
    state: &AppState,
    user_id: Uuid,
) -> Result<HouseholdProfile, AppError> {
    state
        .store
        .household_by_user(user_id)
        .await
        .map_err(AppError::persistence)?
        .ok_or_else(|| AppError::not_found("Household not found"))
}

#[instrument(skip(state, req))]
pub async fn update_household(
    state: &AppState,
    id: Uuid,
    req: UpdateHouseholdRequest,
) -> Result<HouseholdProfile, AppError> {
    let mut profile = get_household(state, id).await?;

    if let Some(members) = req.members {
        profile.members = validate_members(members).map_err(AppError::invalid)?;
    }
    if let Some(skill) = req.cooking_skill {
        profile.cooking_skill = skill;
    }
    if let Some(minutes) = req.max_cooking_time {
        if !(1..=MAX_COOKING_TIME_LIMIT).contains(&minutes) {
            return Err(AppError::invalid(format!(
                "max_cooking_time must be between 1 and {MAX_COOKING_TIME_LIMIT} minutes"
            )));
        }
        profile.max_cooking_time = minutes;
    }
    if let Some(v) = req.favorite_cuisines {
        profile.favorite_cuisines = clean_list(v);
    }
    if let Some(v) = req.dislikes {
        profile.dislikes = clean_list(v);
    }
    if let Some(v) = req.kitchen_equipment {
        profile.kitchen_equipment = clean_list(v);
    }
    profile.updated_at = OffsetDateTime::now_utc();

    let updated = state
        .store
        .update_household(&profile)
        .await
        .map_err(AppError::persistence)?;
    if !updated {
        return Err(AppError::not_found("Household not found"));
    }
    Ok(profile)
}

#[instrument(skip(state))]
pub async fn delete_household(state: &AppState, id: Uuid) -> Result<(), AppError> {
    let deleted = state
        .store
        .delete_household(id)
        .await
        .map_err(AppError::persistence)?;
    if !deleted {
        return Err(AppError::not_found("Household not found"));
    }
    info!(household_id = %id, "household deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::households::repo_types::CookingSkill;
    use serde_json::json;

    fn extraction() -> serde_json::Value {
        json!({
            "members": [
                {"name": "Jordan", "age": null, "is_adult": true, "dietary_restrictions": []},
                {"name": "Mia", "age": 6, "is_adult": true, "dietary_restrictions": ["nut-free"]}
            ],
            "cooking_skill": "intermediate",
            "favorite_cuisines": ["Italian", "italian", " Mexican "],
            "dislikes": null
        })
    }

    #[test]
    fn extraction_builds_profile_with_defaults() {
        let p = profile_from_extraction(extraction(), None).unwrap();
        assert_eq!(p.members.len(), 2);
        assert!(p.members[0].is_adult);
        assert!(!p.members[1].is_adult);
        assert_eq!(p.cooking_skill, CookingSkill::Intermediate);
        assert_eq!(p.max_cooking_time, DEFAULT_MAX_COOKING_TIME);
        assert_eq!(p.favorite_cuisines, vec!["Italian", "Mexican"]);
        assert!(p.dislikes.is_empty());
    }

    #[test]
    fn extraction_without_members_is_rejected() {
        let mut v = extraction();
        v["members"] = json!([]);
        let err = profile_from_extraction(v, None).unwrap_err();
        assert_eq!(err.code(), "extraction_error");
    }

    #[test]
    fn extraction_with_bad_skill_is_rejected() {
        let mut v = extraction();
        v["cooking_skill"] = json!("expert chef");
        assert!(profile_from_extraction(v, None).is_err());
    }

    #[tokio::test]
    async fn onboarding_profile_replaces_existing_for_same_user() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let first = save_onboarding_profile(&state, profile_from_extraction(extraction(), Some(user)).unwrap())
            .await
            .unwrap();

        let mut v = extraction();
        v["cooking_skill"] = json!("advanced");
        let second = save_onboarding_profile(&state, profile_from_extraction(v, Some(user)).unwrap())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = household_for_user(&state, user).await.unwrap();
        assert_eq!(stored.cooking_skill, CookingSkill::Advanced);
    }

    #[tokio::test]
    async fn update_rejects_empty_member_list() {
        let state = AppState::fake();
        let p = save_onboarding_profile(&state, profile_from_extraction(extraction(), None).unwrap())
            .await
            .unwrap();
        let err = update_household(
            &state,
            p.id,
            UpdateHouseholdRequest { members: Some(vec![]), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[tokio::test]
    async fn update_applies_partial_fields() {
        let state = AppState::fake();
        let p = save_onboarding_profile(&state, profile_from_extraction(extraction(), None).unwrap())
            .await
            .unwrap();
        let updated = update_household(
            &state,
            p.id,
            UpdateHouseholdRequest {
                max_cooking_time: Some(20),
                kitchen_equipment: Some(vec!["air fryer".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.max_cooking_time, 20);
        assert_eq!(updated.kitchen_equipment, vec!["air fryer"]);
        assert_eq!(updated.members, p.members);
    }

    #[tokio::test]
    async fn update_rejects_out_of_range_cooking_time() {
        let state = AppState::fake();
        let p = save_onboarding_profile(&state, profile_from_extraction(extraction(), None).unwrap())
            .await
            .unwrap();
        for minutes in [0, MAX_COOKING_TIME_LIMIT + 1, u32::MAX] {
            let err = update_household(
                &state,
                p.id,
                UpdateHouseholdRequest { max_cooking_time: Some(minutes), ..Default::default() },
            )
            .await
            .unwrap_err();
            assert_eq!(err.code(), "invalid_request");
        }
        assert_eq!(get_household(&state, p.id).await.unwrap().max_cooking_time, DEFAULT_MAX_COOKING_TIME);
    }

    #[test]
    fn extracted_cooking_time_out_of_range_falls_back_to_default() {
        let mut v = extraction();
        v["max_cooking_time"] = json!(4_000_000_000u32);
        let p = profile_from_extraction(v, None).unwrap();
        assert_eq!(p.max_cooking_time, DEFAULT_MAX_COOKING_TIME);
    }

    #[tokio::test]
    async fn delete_unlinks_sessions_and_is_not_found_twice() {
        use crate::chat::{ConversationSession, Phase};

        let state = AppState::fake();
        let p = save_onboarding_profile(&state, profile_from_extraction(extraction(), None).unwrap())
            .await
            .unwrap();
        let session = ConversationSession::new(Phase::WeeklyPlanning, Some(p.id), None);
        state.store.insert_session(&session).await.unwrap();

        delete_household(&state, p.id).await.unwrap();
        assert_eq!(get_household(&state, p.id).await.unwrap_err().code(), "not_found");
        let stored = state.store.get_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.household_id, None);

        let err = delete_household(&state, p.id).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn missing_household_is_not_found() {
        let err = get_household(&AppState::fake(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
