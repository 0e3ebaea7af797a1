use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::{Router, middleware, routing::get};
use estatehub_config::CorsConfig;
use estatehub_observability::{PrometheusHandle, logging_middleware, metrics_middleware};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::middleware::{authenticate, require_authenticated};
use crate::modules::auth::router::init_auth_router;
use crate::modules::health::health;
use crate::modules::identities::router::init_identities_router;
use crate::state::AppState;

/// Identity service router.
///
/// Stages run outermost first: CORS, logging, metrics, authentication filter,
/// then per-route access control and the handler.
pub fn init_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api/v1",
            Router::new().nest("/auth", init_auth_router()).nest(
                "/identities",
                init_identities_router().route_layer(middleware::from_fn(require_authenticated)),
            ),
        );

    if let Some(handle) = state.metrics.clone() {
        router = router.merge(metrics_router(handle));
    }

    router.with_state(state.clone()).layer(
        ServiceBuilder::new()
            .layer(cors_layer(&state.cors_config))
            .layer(middleware::from_fn(logging_middleware))
            .layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn_with_state(state.auth.clone(), authenticate)),
    )
}

pub fn metrics_router<S>(handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}
