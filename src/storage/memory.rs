use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::{
    chat::{repo_types::Message, ConversationSession},
    grocery::GroceryList,
    households::HouseholdProfile,
    meal_plans::MealPlan,
};

/// Process-local store. Rows are kept in insertion order so "newest first"
/// is stable even when timestamps collide.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<Vec<ConversationSession>>,
    households: RwLock<Vec<HouseholdProfile>>,
    meal_plans: RwLock<Vec<MealPlan>>,
    grocery_lists: RwLock<Vec<GroceryList>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> bool
where
    T: Clone,
{
    match rows.iter_mut().find(|r| same(r)) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_session(&self, session: &ConversationSession) -> anyhow::Result<()> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> anyhow::Result<Option<ConversationSession>> {
        Ok(self.sessions.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn update_session(
        &self,
        session: &ConversationSession,
        appended: &[Message],
    ) -> anyhow::Result<()> {
        let mut rows = self.sessions.write().await;
        let Some(row) = rows.iter_mut().find(|s| s.id == session.id) else {
            anyhow::bail!("chat session {} does not exist", session.id);
        };
        row.messages.extend_from_slice(appended);
        row.completed |= session.completed;
        row.household_id = session.household_id;
        row.extracted = session.extracted.clone();
        row.updated_at = session.updated_at;
        Ok(())
    }

    async fn insert_household(&self, profile: &HouseholdProfile) -> anyhow::Result<()> {
        self.households.write().await.push(profile.clone());
        Ok(())
    }

    async fn get_household(&self, id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
        Ok(self.households.read().await.iter().find(|h| h.id == id).cloned())
    }

    async fn household_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
        Ok(self
            .households
            .read()
            .await
            .iter()
            .rev()
            .find(|h| h.user_id == Some(user_id))
            .cloned())
    }

    async fn update_household(&self, profile: &HouseholdProfile) -> anyhow::Result<bool> {
        let mut rows = self.households.write().await;
        Ok(replace(&mut rows, profile, |h| h.id == profile.id))
    }

    async fn delete_household(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut households = self.households.write().await;
        let before = households.len();
        households.retain(|h| h.id != id);
        if households.len() == before {
            return Ok(false);
        }

        let mut plans = self.meal_plans.write().await;
        let removed: Vec<Uuid> = plans.iter().filter(|p| p.household_id == id).map(|p| p.id).collect();
        plans.retain(|p| p.household_id != id);
        self.grocery_lists
            .write()
            .await
            .retain(|g| !removed.contains(&g.meal_plan_id));
        for session in self.sessions.write().await.iter_mut() {
            if session.household_id == Some(id) {
                session.household_id = None;
            }
        }
        Ok(true)
    }

    async fn insert_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<()> {
        self.meal_plans.write().await.push(plan.clone());
        Ok(())
    }

    async fn get_meal_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlan>> {
        Ok(self.meal_plans.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn list_meal_plans(&self, household_id: Uuid, limit: i64) -> anyhow::Result<Vec<MealPlan>> {
        let rows = self.meal_plans.read().await;
        let mut plans: Vec<MealPlan> = rows
            .iter()
            .rev()
            .filter(|p| p.household_id == household_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plans.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(plans)
    }

    async fn update_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<bool> {
        let mut rows = self.meal_plans.write().await;
        Ok(replace(&mut rows, plan, |p| p.id == plan.id))
    }

    async fn delete_meal_plan(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.meal_plans.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() != before)
    }

    async fn insert_grocery_list(&self, list: &GroceryList) -> anyhow::Result<()> {
        self.grocery_lists.write().await.push(list.clone());
        Ok(())
    }

    async fn latest_grocery_list(&self, meal_plan_id: Uuid) -> anyhow::Result<Option<GroceryList>> {
        let rows = self.grocery_lists.read().await;
        let mut matching: Vec<&GroceryList> =
            rows.iter().rev().filter(|g| g.meal_plan_id == meal_plan_id).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching.first().map(|g| (*g).clone()))
    }
}
