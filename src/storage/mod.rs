//! Data-access contract for every persisted entity.
//!
//! Handlers and services only ever talk to [`Store`]; the Postgres
//! implementation delegates to each domain's `repo` module, the in-memory one
//! backs `AppState::fake()` and the tests.

mod memory;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    chat::{self, repo_types::Message, ConversationSession},
    grocery::{self, GroceryList},
    households::{self, HouseholdProfile},
    meal_plans::{self, MealPlan},
};

pub use memory::MemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_session(&self, session: &ConversationSession) -> anyhow::Result<()>;
    async fn get_session(&self, id: Uuid) -> anyhow::Result<Option<ConversationSession>>;
    /// Appends `appended` to the stored messages and writes the remaining
    /// session fields. Stored messages are never rewritten.
    async fn update_session(
        &self,
        session: &ConversationSession,
        appended: &[Message],
    ) -> anyhow::Result<()>;

    async fn insert_household(&self, profile: &HouseholdProfile) -> anyhow::Result<()>;
    async fn get_household(&self, id: Uuid) -> anyhow::Result<Option<HouseholdProfile>>;
    async fn household_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<HouseholdProfile>>;
    /// Returns false when no profile with that id exists.
    async fn update_household(&self, profile: &HouseholdProfile) -> anyhow::Result<bool>;
    /// Cascades to the household's meal plans and grocery lists and unlinks
    /// its chat sessions.
    async fn delete_household(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn insert_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<()>;
    async fn get_meal_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlan>>;
    /// Newest first.
    async fn list_meal_plans(&self, household_id: Uuid, limit: i64) -> anyhow::Result<Vec<MealPlan>>;
    async fn update_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<bool>;
    async fn delete_meal_plan(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn insert_grocery_list(&self, list: &GroceryList) -> anyhow::Result<()>;
    async fn latest_grocery_list(&self, meal_plan_id: Uuid) -> anyhow::Result<Option<GroceryList>>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_session(&self, session: &ConversationSession) -> anyhow::Result<()> {
        chat::repo::insert_session(&self.db, session).await
    }

    async fn get_session(&self, id: Uuid) -> anyhow::Result<Option<ConversationSession>> {
        chat::repo::get_session(&self.db, id).await
    }

    async fn update_session(
        &self,
        session: &ConversationSession,
        appended: &[Message],
    ) -> anyhow::Result<()> {
        chat::repo::update_session(&self.db, session, appended).await
    }

    async fn insert_household(&self, profile: &HouseholdProfile) -> anyhow::Result<()> {
        households::repo::insert_household(&self.db, profile).await
    }

    async fn get_household(&self, id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
        households::repo::get_household(&self.db, id).await
    }

    async fn household_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<HouseholdProfile>> {
        households::repo::find_by_user(&self.db, user_id).await
    }

    async fn update_household(&self, profile: &HouseholdProfile) -> anyhow::Result<bool> {
        households::repo::update_household(&self.db, profile).await
    }

    async fn delete_household(&self, id: Uuid) -> anyhow::Result<bool> {
        households::repo::delete_household(&self.db, id).await
    }

    async fn insert_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<()> {
        meal_plans::repo::insert_meal_plan(&self.db, plan).await
    }

    async fn get_meal_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlan>> {
        meal_plans::repo::get_meal_plan(&self.db, id).await
    }

    async fn list_meal_plans(&self, household_id: Uuid, limit: i64) -> anyhow::Result<Vec<MealPlan>> {
        meal_plans::repo::list_by_household(&self.db, household_id, limit).await
    }

    async fn update_meal_plan(&self, plan: &MealPlan) -> anyhow::Result<bool> {
        meal_plans::repo::update_meals(&self.db, plan).await
    }

    async fn delete_meal_plan(&self, id: Uuid) -> anyhow::Result<bool> {
        meal_plans::repo::delete_meal_plan(&self.db, id).await
    }

    async fn insert_grocery_list(&self, list: &GroceryList) -> anyhow::Result<()> {
        grocery::repo::insert_grocery_list(&self.db, list).await
    }

    async fn latest_grocery_list(&self, meal_plan_id: Uuid) -> anyhow::Result<Option<GroceryList>> {
        grocery::repo::latest_for_meal_plan(&self.db, meal_plan_id).await
    }
}
