//! Edge gateway: authenticates every inbound request, propagates the verified
//! identity as trusted headers and proxies to an upstream service.

pub mod proxy;
pub mod routes;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use estatehub_config::CorsConfig;
use estatehub_observability::{PrometheusHandle, logging_middleware, metrics_middleware};
use tower::ServiceBuilder;

use crate::middleware::{PropagationPolicy, authenticate, propagate_claims, reject_failed_authentication};
use crate::modules::health::health;
use crate::router::{cors_layer, metrics_router};
use crate::state::AuthState;

pub use routes::RouteTable;

#[derive(Clone)]
pub struct GatewayState {
    pub auth: AuthState,
    pub routes: Arc<RouteTable>,
    pub propagation: Arc<PropagationPolicy>,
    pub client: reqwest::Client,
}

/// Gateway router. Every request that is not `/health` or `/metrics` falls
/// through to the proxy.
///
/// Stage order, outermost first: CORS, logging, metrics, authentication
/// filter, access control, claims propagation, proxy.
pub fn init_gateway_router(
    state: GatewayState,
    cors_config: &CorsConfig,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let mut router = Router::new().route("/health", get(health));

    if let Some(handle) = metrics {
        router = router.merge(metrics_router(handle));
    }

    router
        .fallback(proxy::forward)
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(cors_config))
                .layer(middleware::from_fn(logging_middleware))
                .layer(middleware::from_fn(metrics_middleware))
                .layer(middleware::from_fn_with_state(state.auth.clone(), authenticate))
                .layer(middleware::from_fn(reject_failed_authentication))
                .layer(middleware::from_fn_with_state(state.propagation.clone(), propagate_claims)),
        )
}
