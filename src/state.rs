use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::llm::{HttpGateway, LlmGateway, ScriptedGateway};
use crate::storage::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn LlmGateway>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config.database_url).await?;
        let store = Arc::new(PgStore::new(pool)) as Arc<dyn Store>;
        let llm = Arc::new(HttpGateway::new(config.llm.clone())?) as Arc<dyn LlmGateway>;

        Ok(Self { config, store, llm })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        llm: Arc<dyn LlmGateway>,
    ) -> Self {
        Self { config, store, llm }
    }

    /// In-memory store plus the given scripted gateway; no database, no network.
    pub fn with_script(llm: Arc<ScriptedGateway>) -> Self {
        Self::from_parts(
            Arc::new(AppConfig::test()),
            Arc::new(MemoryStore::new()),
            llm,
        )
    }

    pub fn fake() -> Self {
        Self::with_script(Arc::new(ScriptedGateway::default()))
    }
}
