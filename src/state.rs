use std::sync::Arc;

use axum::extract::FromRef;
use estatehub_auth::{TokenIssuer, TokenValidator};
use estatehub_config::{CorsConfig, SecurityConfig};
use estatehub_observability::PrometheusHandle;

use crate::modules::identities::service::IdentityResolver;

/// Everything the request authentication filter needs. Shared by the identity
/// service and the gateway; immutable after startup.
#[derive(Clone)]
pub struct AuthState {
    pub validator: TokenValidator,
    pub resolver: IdentityResolver,
    pub security: Arc<SecurityConfig>,
}

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub issuer: TokenIssuer,
    pub cors_config: CorsConfig,
    pub metrics: Option<PrometheusHandle>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
