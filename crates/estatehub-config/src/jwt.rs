use std::{env, fmt};

use crate::ConfigError;

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_EXPIRY_SECONDS: i64 = 3600;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_EXPIRY_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Where signing/verification key material comes from.
#[derive(Clone)]
pub enum KeySource {
    /// Shared HMAC secret (`JWT_SECRET`).
    Secret(String),
    /// Published key set (`JWT_JWKS_URL`). Verification keys are fetched from the
    /// locator; signing needs a private key on disk.
    KeySet {
        jwks_url: String,
        private_key_path: Option<String>,
        key_id: Option<String>,
    },
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Secret(_) => f.write_str("Secret(<redacted>)"),
            KeySource::KeySet {
                jwks_url,
                private_key_path,
                key_id,
            } => f
                .debug_struct("KeySet")
                .field("jwks_url", jwks_url)
                .field("private_key_path", private_key_path)
                .field("key_id", key_id)
                .finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub key_source: KeySource,
    pub expiry_seconds: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let key_source = match (non_empty("JWT_SECRET"), non_empty("JWT_JWKS_URL")) {
            (Some(secret), None) => KeySource::Secret(secret),
            (None, Some(jwks_url)) => KeySource::KeySet {
                jwks_url,
                private_key_path: non_empty("JWT_PRIVATE_KEY_PATH"),
                key_id: non_empty("JWT_KEY_ID"),
            },
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingKeySources),
            (None, None) => return Err(ConfigError::MissingKeySource),
        };

        let expiry_seconds = match non_empty("JWT_EXPIRY") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(seconds) if (1..=MAX_TOKEN_EXPIRY_SECONDS).contains(&seconds) => seconds,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "JWT_EXPIRY",
                        reason: format!(
                            "'{raw}' is not a number of seconds between 1 and {MAX_TOKEN_EXPIRY_SECONDS}"
                        ),
                    });
                }
            },
            None => DEFAULT_TOKEN_EXPIRY_SECONDS,
        };

        Ok(Self {
            key_source,
            expiry_seconds,
        })
    }

    /// Shared-secret configuration with the default lifetime.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            key_source: KeySource::Secret(secret.into()),
            expiry_seconds: DEFAULT_TOKEN_EXPIRY_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn secret_mode_with_default_expiry() {
        let config = JwtConfig::from_lookup(lookup_from(&[(
            "JWT_SECRET",
            "a-very-long-test-secret-of-at-least-32-bytes",
        )]))
        .unwrap();

        assert!(matches!(config.key_source, KeySource::Secret(_)));
        assert_eq!(config.expiry_seconds, 3600);
    }

    #[test]
    fn key_set_mode_reads_signing_key_settings() {
        let config = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_JWKS_URL", "https://id.example/.well-known/jwks.json"),
            ("JWT_PRIVATE_KEY_PATH", "/run/secrets/jwt.pem"),
            ("JWT_KEY_ID", "2026-10"),
            ("JWT_EXPIRY", "900"),
        ]))
        .unwrap();

        match config.key_source {
            KeySource::KeySet {
                jwks_url,
                private_key_path,
                key_id,
            } => {
                assert_eq!(jwks_url, "https://id.example/.well-known/jwks.json");
                assert_eq!(private_key_path.as_deref(), Some("/run/secrets/jwt.pem"));
                assert_eq!(key_id.as_deref(), Some("2026-10"));
            }
            other => panic!("unexpected key source {other:?}"),
        }
        assert_eq!(config.expiry_seconds, 900);
    }

    #[test]
    fn missing_key_source_is_an_error() {
        let result = JwtConfig::from_lookup(lookup_from(&[("JWT_SECRET", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingKeySource)));
    }

    #[test]
    fn both_key_sources_is_an_error() {
        let result = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("JWT_JWKS_URL", "https://id.example/jwks"),
        ]));
        assert!(matches!(result, Err(ConfigError::ConflictingKeySources)));
    }

    #[test]
    fn rejects_non_positive_expiry() {
        let result = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRY", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "JWT_EXPIRY", .. })
        ));
    }

    #[test]
    fn rejects_expiry_beyond_one_year() {
        let result = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRY", "10000000000000000"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "JWT_EXPIRY", .. })
        ));

        let one_year = MAX_TOKEN_EXPIRY_SECONDS.to_string();
        let config =
            JwtConfig::from_lookup(lookup_from(&[("JWT_SECRET", "secret"), ("JWT_EXPIRY", &one_year)])).unwrap();
        assert_eq!(config.expiry_seconds, MAX_TOKEN_EXPIRY_SECONDS);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = JwtConfig::with_secret("super-secret-value");
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
