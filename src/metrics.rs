use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// The recorder is process-global; installing it twice fails, so keep the handle.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe our series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_counter!(
                    "sadhana_entries_saved_total",
                    "Daily entries scored and upserted."
                );
                describe_counter!(
                    "sadhana_score_previews_total",
                    "Score previews computed without persisting."
                );
                describe_counter!(
                    "sadhana_store_errors_total",
                    "Document store operations that failed."
                );
                describe_histogram!(
                    "sadhana_entry_total_score",
                    "Total score of each saved entry (0-180)."
                );
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
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

pub fn record_entry_saved(total: u32) {
    counter!("sadhana_entries_saved_total").increment(1);
    histogram!("sadhana_entry_total_score").record(f64::from(total));
}

pub fn record_score_preview() {
    counter!("sadhana_score_previews_total").increment(1);
}

pub fn record_store_error() {
    counter!("sadhana_store_errors_total").increment(1);
}
