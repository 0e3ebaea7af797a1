//! Request authentication filter.
//!
//! Runs once per request and records its outcome as a [`RequestAuthentication`]
//! request extension. The only request it refuses is one whose path carries
//! `.` or `..` segments (400), since public-path matching and the upstream's
//! URL parser would disagree about which path it names. Otherwise it never
//! rejects: public paths skip it, a request without
//! a token continues as [`RequestAuthentication::Anonymous`], and a failed
//! validation continues as [`RequestAuthentication::Rejected`] with no
//! principal attached. The access-control stage downstream turns those into
//! 401/403 responses.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use estatehub_auth::AuthenticatedPrincipal;
use estatehub_core::{AppError, AuthError};
use estatehub_observability::track_filter_rejection;
use tracing::{debug, warn};

use crate::state::AuthState;

/// Outcome of the authentication filter for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuthentication {
    /// The path is public; the filter did not run.
    Public,
    /// No bearer token was presented.
    Anonymous,
    Authenticated(AuthenticatedPrincipal),
    Rejected(AuthError),
}

impl AuthState {
    pub async fn authenticate(&self, path: &str, headers: &HeaderMap) -> RequestAuthentication {
        if self.is_public(path) {
            return RequestAuthentication::Public;
        }

        let Some(token) = extract_bearer_token(
            headers,
            &self.security.header_name,
            &self.security.header_prefix,
        ) else {
            return RequestAuthentication::Anonymous;
        };

        let result = match self.validator.validate(token) {
            Ok(claims) => self.resolver.resolve_principal(&claims).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(principal) => {
                debug!(identity_id = principal.identity_id, "Request authenticated");
                RequestAuthentication::Authenticated(principal)
            }
            Err(err) => {
                match &err {
                    AuthError::AuthenticationFailed(_) => {
                        warn!(code = err.error_code(), path, "Authentication failed")
                    }
                    _ => debug!(code = err.error_code(), path, reason = %err, "Bearer token rejected"),
                }
                track_filter_rejection(err.error_code());
                RequestAuthentication::Rejected(err)
            }
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.security
            .public_paths
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }
}

pub async fn authenticate(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    if has_dot_segment(req.uri().path()) {
        debug!(path = %req.uri().path(), "Rejected path with dot segments");
        return AppError::bad_request(anyhow::anyhow!(
            "Request path must not contain '.' or '..' segments"
        ))
        .into_response();
    }

    let outcome = auth.authenticate(req.uri().path(), req.headers()).await;

    if let RequestAuthentication::Authenticated(principal) = &outcome {
        req.extensions_mut().insert(principal.clone());
    }
    req.extensions_mut().insert(outcome);

    next.run(req).await
}

/// Reads the token from `header_name`, which must start with `prefix`.
///
/// The scheme in the prefix is matched case-insensitively. A header without the
/// prefix, or with nothing after it, counts as no token at all.
pub fn extract_bearer_token<'a>(headers: &'a HeaderMap, header_name: &str, prefix: &str) -> Option<&'a str> {
    let value = headers.get(header_name)?.to_str().ok()?;

    let head = value.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let token = value[prefix.len()..].trim();
    (!token.is_empty()).then_some(token)
}

/// A segment is `.` or `..`, literally or percent-encoded (`%2e`, `.%2E`, ...).
/// Backslashes count as separators because URL parsers treat them as `/`.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

/// `path` equals `prefix` or continues it at a segment boundary.
pub(crate) fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
