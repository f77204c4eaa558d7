// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::category::ProductCategory;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the scoring series.
    /// Later calls reuse the installed handle, so tests can build the app repeatedly.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE.get_or_try_init(|| {
            // Use default buckets to avoid API differences across crate versions.
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe_counter!(
                "scoring_requests_total",
                "Analysis requests by category and outcome."
            );
            describe_histogram!(
                "scoring_duration_ms",
                "End-to-end analysis time in milliseconds."
            );
            Ok::<_, anyhow::Error>(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
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

/// Count one analysis call. `outcome` is `ok` or the error code.
pub fn record_analysis(category: Option<ProductCategory>, outcome: &'static str, elapsed_ms: f64) {
    let category = category.map(|c| c.as_str()).unwrap_or("unknown");
    counter!("scoring_requests_total", "category" => category, "outcome" => outcome).increment(1);
    histogram!("scoring_duration_ms", "category" => category).record(elapsed_ms);
}
