use std::sync::OnceLock;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_response(status: u16, latency: Duration) {
    let status_label = status.to_string();
    metrics::counter!("http_requests_total", "status" => status_label.clone()).increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status_label)
        .record(latency.as_secs_f64());
}

pub(crate) fn record_submission(outcome: &'static str) {
    metrics::counter!("task_submissions_total", "outcome" => outcome).increment(1);
}
