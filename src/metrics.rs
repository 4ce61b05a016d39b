use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the series this crate emits.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("dataset_loads_total", "Datasets loaded successfully.");
        describe_counter!(
            "dataset_load_errors_total",
            "Dataset loads that failed (missing file or unparseable)."
        );
        describe_gauge!("dataset_rows", "Rows in the most recently loaded dataset.");
        describe_counter!(
            "sentiment_remote_calls_total",
            "Remote classification requests issued."
        );
        describe_counter!(
            "sentiment_remote_failures_total",
            "Remote classification requests that failed."
        );
        describe_counter!(
            "sentiment_unrecognized_total",
            "Remote answers that did not map to a label."
        );
        describe_counter!(
            "sentiment_memo_hits_total",
            "Classifications served from the session memo."
        );
        describe_counter!(
            "sentiment_local_total",
            "Classifications answered by the local lexicon classifier."
        );
        describe_gauge!("sessions_open", "Sessions currently held in the store.");
        describe_counter!(
            "sessions_expired_total",
            "Sessions dropped after sitting idle."
        );
        describe_counter!("chat_messages_total", "Chat messages received.");
        describe_counter!(
            "chat_remote_failures_total",
            "Chat completions that fell back to the local reply."
        );

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
