use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

static METRICS_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if metrics are enabled via METRICS_ENABLED env var (default on)
pub fn is_metrics_enabled() -> bool {
    *METRICS_ENABLED.get_or_init(|| {
        std::env::var("METRICS_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and spawns its upkeep task.
/// Returns `None` when metrics are disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_metrics_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .context("Failed to set histogram buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_metrics_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);
    gauge!("http_requests_active").decrement(1.0);

    response
}

/// `status` is `success` or the failing error code.
pub fn track_sign_in(status: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("auth_sign_in_total", "status" => status.to_string()).increment(1);
}

pub fn track_token_issued() {
    if !is_metrics_enabled() {
        return;
    }
    counter!("auth_tokens_issued_total").increment(1);
}

/// Counts requests the authentication filter marked as rejected, by error code.
pub fn track_filter_rejection(code: &str) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("auth_filter_rejections_total", "code" => code.to_string()).increment(1);
}

pub fn track_upstream_request(route: &str, status: u16) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("gateway_upstream_requests_total", "route" => route.to_string(), "status" => status.to_string())
        .increment(1);
}
