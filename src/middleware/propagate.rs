//! Claims propagation (gateway only).
//!
//! After the authentication filter, the gateway turns the request's principal
//! into two trusted headers (identity id and role) for the upstream service.
//! Injected values replace every client-supplied value for the same header
//! name, matched case-insensitively.
//!
//! Requests without a principal are either stripped of those headers (the
//! default) or forwarded untouched when `strip_untrusted` is off.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use estatehub_auth::AuthenticatedPrincipal;
use estatehub_config::{ConfigError, GatewayConfig};
use estatehub_core::AuthError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PropagationPolicy {
    pub user_id_header: HeaderName,
    pub user_roles_header: HeaderName,
    pub strip_untrusted: bool,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            user_id_header: HeaderName::from_static("x-user-id"),
            user_roles_header: HeaderName::from_static("x-user-roles"),
            strip_untrusted: true,
        }
    }
}

impl PropagationPolicy {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let header = |name: &'static str, value: &str| {
            HeaderName::from_bytes(value.as_bytes()).map_err(|e| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
            })
        };

        Ok(Self {
            user_id_header: header("GATEWAY_USER_ID_HEADER", &config.user_id_header)?,
            user_roles_header: header("GATEWAY_USER_ROLES_HEADER", &config.user_roles_header)?,
            strip_untrusted: config.strip_untrusted_headers,
        })
    }

    fn strip(&self, headers: &mut HeaderMap) {
        headers.remove(&self.user_id_header);
        headers.remove(&self.user_roles_header);
    }
}

/// Identity headers derived from one request's principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHeaderSet {
    pub user_id: HeaderValue,
    pub user_roles: HeaderValue,
}

impl TrustedHeaderSet {
    /// `None` unless the principal has a positive id and a non-blank role
    /// that is a valid header value.
    pub fn from_principal(principal: &AuthenticatedPrincipal) -> Option<Self> {
        let role = principal.role.trim();
        if principal.identity_id <= 0 || role.is_empty() {
            return None;
        }

        Some(Self {
            user_id: HeaderValue::from_str(&principal.subject()).ok()?,
            user_roles: HeaderValue::from_str(role).ok()?,
        })
    }

    pub fn apply(&self, policy: &PropagationPolicy, headers: &mut HeaderMap) {
        headers.insert(policy.user_id_header.clone(), self.user_id.clone());
        headers.insert(policy.user_roles_header.clone(), self.user_roles.clone());
    }
}

pub async fn propagate_claims(
    State(policy): State<Arc<PropagationPolicy>>,
    mut req: Request,
    next: Next,
) -> Response {
    let trusted = req
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .and_then(TrustedHeaderSet::from_principal);

    match trusted {
        Some(set) => set.apply(&policy, req.headers_mut()),
        None if policy.strip_untrusted => {
            debug!("No principal; stripping client-supplied identity headers");
            policy.strip(req.headers_mut());
        }
        None => {}
    }

    next.run(req).await
}

/// Identity forwarded by the gateway, for services running behind it.
///
/// Header names come from an `Arc<PropagationPolicy>` request extension, so a
/// service behind a gateway with custom `GATEWAY_USER_ID_HEADER` /
/// `GATEWAY_USER_ROLES_HEADER` adds `Extension(Arc::new(policy))` with the same
/// settings. Without the extension the default `X-User-Id` / `X-User-Roles`
/// apply. Only trust it on services that are unreachable except through the
/// gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedIdentity {
    pub identity_id: i64,
    pub role: String,
}

impl TrustedIdentity {
    pub fn from_headers(headers: &HeaderMap, policy: &PropagationPolicy) -> Result<Self, AuthError> {
        let header = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let identity_id = header(&policy.user_id_header)
            .ok_or(AuthError::TokenMissing)?
            .parse::<i64>()
            .map_err(|_| AuthError::AuthenticationFailed("trusted identity header is not an id".to_string()))?;
        let role = header(&policy.user_roles_header)
            .ok_or_else(|| AuthError::AuthenticationFailed("trusted role header is missing".to_string()))?
            .to_string();

        Ok(Self { identity_id, role })
    }
}

impl<S> FromRequestParts<S> for TrustedIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Arc<PropagationPolicy>>() {
            Some(policy) => Self::from_headers(&parts.headers, policy),
            None => Self::from_headers(&parts.headers, &PropagationPolicy::default()),
        }
    }
}
