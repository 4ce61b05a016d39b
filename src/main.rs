//! Student Sentiment Dashboard: binary entrypoint
//! Boots the Axum HTTP server, wiring routes, session state, metrics, and tracing.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use student_sentiment_dashboard::{
    api, metrics::Metrics, run_ai_quick_probe, session::spawn_idle_sweeper, AppState,
};

/// Compact tracing logs. `RUST_LOG` wins; otherwise info for this crate, warn elsewhere.
/// Uses `try_init` because the hosting runtime may already have installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("student_sentiment_dashboard=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    if std::env::var("AI_QUICK_PROBE").is_ok_and(|v| v == "1") {
        if let Err(e) = run_ai_quick_probe().await {
            tracing::warn!(error = ?e, "AI quick probe didn't run");
        }
    }

    let state = AppState::from_env()?;
    if let Some((every, max_idle)) = state.config.sessions.expiry() {
        spawn_idle_sweeper(state.sessions.clone(), every, max_idle);
    }
    let mut router = api::router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics recorder not installed"),
    }

    Ok(router.into())
}
