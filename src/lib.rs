// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod category;
pub mod chat;
pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod metrics;
pub mod sentiment;
pub mod session;
pub mod summary;

// Classification pipeline (remote adapter, fallback classifier, dataset analysis)
pub mod analyze;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::{router, AppState};
pub use crate::category::{classify_category, Category};
pub use crate::error::DashboardError;
pub use crate::filter::{apply_filters, FilteredView, Filters};
pub use crate::sentiment::{classify_sentiment_local, Polarity};

use tracing::info;

/// Build the dashboard router from config files + env, as the binary does.
pub async fn app() -> anyhow::Result<axum::Router> {
    let state = AppState::from_env()?;
    Ok(router(state))
}

/// Call this from the entrypoint (after tracing init) to perform a one-off smoke test of
/// the remote classifier. It won't panic on failure; it just logs the result.
pub async fn run_ai_quick_probe() -> anyhow::Result<()> {
    let ai = ai_bootstrap::AiRuntime::from_default()?;
    ai.quick_probe().await;
    info!("AI quick probe finished");
    Ok(())
}
