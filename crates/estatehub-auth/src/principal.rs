//! Request-scoped principal and the capabilities derived from its role.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An authorization capability.
///
/// A role string becomes a tagged value; authorization compares against
/// expected capability sets instead of matching on prefixed strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Role(String),
}

impl Authority {
    pub fn role(name: impl Into<String>) -> Self {
        Authority::Role(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Authority::Role(name) => name,
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authority::Role(name) => write!(f, "role:{name}"),
        }
    }
}

/// Who is making the current request.
///
/// Built fresh for every request from a validated token plus an identity
/// lookup, and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub identity_id: i64,
    pub email: String,
    pub role: String,
    pub authorities: Vec<Authority>,
}

impl AuthenticatedPrincipal {
    pub fn new(identity_id: i64, email: impl Into<String>, role: impl Into<String>) -> Self {
        let role = role.into();
        let authorities = if role.trim().is_empty() {
            Vec::new()
        } else {
            vec![Authority::role(role.trim())]
        };

        Self {
            identity_id,
            email: email.into(),
            role,
            authorities,
        }
    }

    /// Identity id in the string form used for token subjects and propagated headers.
    pub fn subject(&self) -> String {
        self.identity_id.to_string()
    }

    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.authorities.contains(authority)
    }

    pub fn has_any_authority(&self, expected: &[Authority]) -> bool {
        expected.iter().any(|a| self.has_authority(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_becomes_single_authority() {
        let principal = AuthenticatedPrincipal::new(1, "alice@example.com", "ADMIN");
        assert_eq!(principal.authorities, vec![Authority::role("ADMIN")]);
        assert!(principal.has_authority(&Authority::role("ADMIN")));
        assert!(!principal.has_authority(&Authority::role("USER")));
    }

    #[test]
    fn blank_role_grants_nothing() {
        let principal = AuthenticatedPrincipal::new(1, "alice@example.com", "  ");
        assert!(principal.authorities.is_empty());
        assert!(!principal.has_any_authority(&[Authority::role("")]));
    }

    #[test]
    fn has_any_authority_matches_one_of_set() {
        let principal = AuthenticatedPrincipal::new(2, "bob@example.com", "AGENT");
        assert!(principal.has_any_authority(&[Authority::role("ADMIN"), Authority::role("AGENT")]));
        assert!(!principal.has_any_authority(&[Authority::role("ADMIN")]));
    }

    #[test]
    fn authority_matching_is_exact() {
        let principal = AuthenticatedPrincipal::new(3, "carol@example.com", "admin");
        assert!(!principal.has_authority(&Authority::role("ADMIN")));
    }

    #[test]
    fn subject_is_string_id() {
        assert_eq!(AuthenticatedPrincipal::new(42, "x@example.com", "USER").subject(), "42");
    }
}
