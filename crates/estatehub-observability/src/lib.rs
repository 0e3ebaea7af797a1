//! EstateHub Observability
//!
//! - [`logging`]: subscriber setup (`RUST_LOG` / `LOG_LEVEL`, `LOG_FORMAT=json`)
//!   and a request logging middleware that tags every request with an id
//! - [`metrics`]: Prometheus recorder, HTTP metrics middleware and the
//!   authentication counters
//!
//! Metrics can be switched off at runtime with `METRICS_ENABLED=false`; the
//! middleware and counters then become no-ops.
//!
//! # Examples
//!
//! ```no_run
//! use estatehub_observability::{init_metrics, init_tracing};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_tracing();
//!     let metrics_handle = init_metrics()?;
//!     // ... application code ...
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod metrics;

pub use metrics_exporter_prometheus::PrometheusHandle;

pub use logging::{REQUEST_ID_HEADER, init_tracing, logging_middleware};
pub use metrics::{
    init_metrics, is_metrics_enabled, metrics_middleware, track_filter_rejection,
    track_sign_in, track_token_issued, track_upstream_request,
};
