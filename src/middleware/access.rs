//! Access control: the stage that turns the authentication filter's outcome
//! into 401/403 responses.
//!
//! Two flavours are provided:
//! 1. Layer-based middleware (`require_authenticated`, `require_authorities`,
//!    `reject_failed_authentication`)
//! 2. Extractors (`Principal`, and role extractors generated by `require_role!`)

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{Extensions, request::Parts},
    middleware::Next,
    response::Response,
};
use estatehub_auth::{AuthenticatedPrincipal, Authority};
use estatehub_core::AuthError;

use crate::middleware::authenticate::RequestAuthentication;

/// The request's principal, or why there is none.
///
/// A request the filter never saw, or one on a public path, has no principal
/// and fails as [`AuthError::TokenMissing`].
pub fn principal_from(extensions: &Extensions) -> Result<&AuthenticatedPrincipal, AuthError> {
    match extensions.get::<RequestAuthentication>() {
        Some(RequestAuthentication::Authenticated(principal)) => Ok(principal),
        Some(RequestAuthentication::Rejected(err)) => Err(err.clone()),
        Some(RequestAuthentication::Anonymous | RequestAuthentication::Public) | None => {
            Err(AuthError::TokenMissing)
        }
    }
}

/// Rejects requests without an authenticated principal.
///
/// ```rust,ignore
/// let me_routes = Router::new()
///     .route("/me", get(me))
///     .route_layer(middleware::from_fn(require_authenticated));
/// ```
pub async fn require_authenticated(req: Request, next: Next) -> Result<Response, AuthError> {
    principal_from(req.extensions())?;
    Ok(next.run(req).await)
}

/// Rejects requests whose presented token failed authentication; anonymous
/// and public requests continue.
pub async fn reject_failed_authentication(req: Request, next: Next) -> Result<Response, AuthError> {
    if let Some(RequestAuthentication::Rejected(err)) = req.extensions().get::<RequestAuthentication>() {
        return Err(err.clone());
    }
    Ok(next.run(req).await)
}

/// Capability set a route requires; any one of them grants access.
#[derive(Debug, Clone)]
pub struct RequiredAuthorities(Arc<[Authority]>);

impl RequiredAuthorities {
    pub fn any_of(authorities: impl IntoIterator<Item = Authority>) -> Self {
        Self(authorities.into_iter().collect())
    }

    pub fn check(&self, principal: &AuthenticatedPrincipal) -> Result<(), AuthError> {
        if principal.has_any_authority(&self.0) {
            return Ok(());
        }

        let expected: Vec<String> = self.0.iter().map(|a| a.as_str().to_string()).collect();
        Err(AuthError::InsufficientRole(format!(
            "requires one of [{}]",
            expected.join(", ")
        )))
    }
}

/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/{id}", get(get_identity))
///     .route_layer(middleware::from_fn_with_state(
///         RequiredAuthorities::any_of([Authority::role("ADMIN")]),
///         require_authorities,
///     ));
/// ```
pub async fn require_authorities(
    State(required): State<RequiredAuthorities>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    required.check(principal_from(req.extensions())?)?;
    Ok(next.run(req).await)
}

/// Extractor for the authenticated principal.
#[derive(Debug, Clone)]
pub struct Principal(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(&parts.extensions).map(|p| Principal(p.clone()))
    }
}

/// Generates an extractor that admits only principals holding a role.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $role:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::access::Principal);

        impl<S> axum::extract::FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = $crate::estatehub_core::AuthError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let principal = <$crate::middleware::access::Principal as axum::extract::FromRequestParts<S>>::from_request_parts(parts, state).await?;

                $crate::middleware::access::RequiredAuthorities::any_of([
                    $crate::estatehub_auth::Authority::role($role),
                ])
                .check(&principal.0)?;

                Ok($name(principal))
            }
        }
    };
}

require_role!(RequireAdmin, "ADMIN");
