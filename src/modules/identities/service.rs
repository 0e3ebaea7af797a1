use std::sync::Arc;

use estatehub_auth::{AuthenticatedPrincipal, TokenClaims};
use estatehub_core::AuthError;
use estatehub_models::{Identity, IdentityStore};
use tracing::{error, instrument};

/// Loads identities for sign-in and for per-request principal resolution.
///
/// Missing and inactive identities are both [`AuthError::PrincipalNotFound`];
/// a store failure is [`AuthError::AuthenticationFailed`]. Nothing is cached.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Any identity with this id, active or not.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, AuthError> {
        self.store.find_by_id(id).await.map_err(store_failure)
    }

    #[instrument(skip(self))]
    pub async fn resolve_by_id(&self, id: i64) -> Result<Identity, AuthError> {
        active(self.find_by_id(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn resolve_by_email(&self, email: &str) -> Result<Identity, AuthError> {
        let identity = self
            .store
            .find_by_email(&normalize_email(email))
            .await
            .map_err(store_failure)?;
        active(identity)
    }

    /// Turns validated claims into the request's principal.
    pub async fn resolve_principal(&self, claims: &TokenClaims) -> Result<AuthenticatedPrincipal, AuthError> {
        let identity = self.resolve_by_id(claims.identity_id()?).await?;
        Ok(AuthenticatedPrincipal::from(&identity))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn active(identity: Option<Identity>) -> Result<Identity, AuthError> {
    match identity {
        Some(identity) if identity.active => Ok(identity),
        _ => Err(AuthError::PrincipalNotFound),
    }
}

fn store_failure(err: anyhow::Error) -> AuthError {
    error!(error = ?err, "Identity store lookup failed");
    AuthError::AuthenticationFailed("identity store unavailable".to_string())
}
