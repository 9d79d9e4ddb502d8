mod app;
mod chat;
mod config;
mod db;
mod error;
mod extractors;
mod grocery;
mod households;
mod llm;
mod meal_plans;
mod state;
mod storage;

use crate::app::{build_app, serve};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealplanner=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;
    tracing::info!(
        default_provider = %state.config.llm.default_provider,
        providers = ?state.llm.availability(),
        "state initialised"
    );

    serve(build_app(state)).await
}
