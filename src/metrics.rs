use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the process-wide Prometheus recorder (first call) and return its handle.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("prometheus: install recorder")?;
            describe_all();
            Ok::<_, anyhow::Error>(handle)
        })
        .cloned()
}

/// One-time metric descriptions (so series carry HELP text on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_all);
}

fn describe_all() {
    describe_counter!("scam_analyze_requests_total", "Texts submitted for analysis.");
    describe_counter!(
        "scam_analyze_risk_level_total",
        "Completed analyses by risk level."
    );
    describe_counter!(
        "scam_collaborator_failures_total",
        "Collaborator calls that failed and degraded a stage."
    );
    describe_histogram!(
        "scam_analyze_duration_ms",
        "Pipeline wall time in milliseconds."
    );
}

/// Router exposing `/metrics` in the Prometheus exposition format.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
