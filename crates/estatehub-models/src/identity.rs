//! The identity record and its public view.

use chrono::{DateTime, Utc};
use estatehub_auth::{AuthenticatedPrincipal, TokenSubject};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A stored identity.
///
/// Owned by the identity store. Inactive identities stay in storage but are
/// never accepted as principals.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create an identity. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Identity as exposed over the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySummary {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "ADMIN")]
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for IdentitySummary {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role.clone(),
            active: identity.active,
            created_at: identity.created_at,
        }
    }
}

impl From<&Identity> for AuthenticatedPrincipal {
    fn from(identity: &Identity) -> Self {
        AuthenticatedPrincipal::new(identity.id, identity.email.clone(), identity.role.clone())
    }
}

impl TokenSubject for Identity {
    fn subject_id(&self) -> i64 {
        self.id
    }

    fn role(&self) -> &str {
        &self.role
    }
}
