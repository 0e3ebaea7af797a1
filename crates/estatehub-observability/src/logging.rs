use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default `info`) applies to
/// our crates with noisy dependencies held at `warn`. `LOG_FORMAT=json` switches
/// to one JSON object per line.
pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{log_level},tower_http=warn,hyper=warn,hyper_util=warn,h2=warn,sqlx=warn,reqwest=warn"
        ))
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).init();
}

/// Logs every request with a request id, its latency and a level chosen by status class.
///
/// The id is taken from an incoming `x-request-id` header or generated, and is
/// echoed back on the response.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(request_id = %request_id, method = %method, path = %path, "Incoming request");

    let mut response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Client error"
        ),
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Server error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request completed"
        ),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
