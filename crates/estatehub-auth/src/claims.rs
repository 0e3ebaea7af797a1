//! Claim set carried by every token this system issues.

use estatehub_core::AuthError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Signed token claims.
///
/// A token carries exactly one role; multi-role tokens are not issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenClaims {
    /// Identity id, as a string
    pub sub: String,
    /// The identity's single role
    pub role: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

impl TokenClaims {
    /// Parses the subject back into an identity id.
    pub fn identity_id(&self) -> Result<i64, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::TokenMalformed(format!("subject '{}' is not an identity id", self.sub)))
    }
}
