//! Signing and verification key material.
//!
//! Two modes, chosen once at startup from [`JwtConfig`]:
//!
//! - **Shared secret**: one HMAC secret signs and verifies (HS256 only).
//! - **Published key set**: verification keys come from a JWKS document
//!   fetched once at startup and are matched by the token's `kid`. Signing
//!   needs the matching private key on disk; without it the material is
//!   verify-only and the identity service refuses to start.
//!
//! Keys are rotated by restarting the process.

use std::{fmt, time::Duration};

use estatehub_config::{JwtConfig, KeySource};
use estatehub_core::AuthError;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header,
    jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm},
};
use tracing::{info, warn};

/// Shortest accepted shared secret (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("JWT secret must be at least {MIN_SECRET_BYTES} bytes, got {0}")]
    SecretTooShort(usize),
    #[error("failed to fetch key set: {0}")]
    JwksFetch(String),
    #[error("key set is unusable: {0}")]
    InvalidKeySet(String),
    #[error("signing key is unusable: {0}")]
    InvalidSigningKey(String),
}

/// One verification key from a published key set.
pub struct PublishedKey {
    pub kid: Option<String>,
    pub algorithm: Algorithm,
    key: DecodingKey,
}

impl fmt::Debug for PublishedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Private key used by the identity service to sign tokens in key-set mode.
pub struct SigningKey {
    kid: Option<String>,
    algorithm: Algorithm,
    key: EncodingKey,
}

pub enum KeyMaterial {
    Shared {
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
    Published {
        keys: Vec<PublishedKey>,
        signing: Option<SigningKey>,
    },
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Shared { .. } => f.write_str("KeyMaterial::Shared(<redacted>)"),
            KeyMaterial::Published { keys, signing } => f
                .debug_struct("KeyMaterial::Published")
                .field("keys", keys)
                .field("can_sign", &signing.is_some())
                .finish(),
        }
    }
}

impl KeyMaterial {
    /// Builds key material from configuration, fetching the key set if one is configured.
    pub async fn load(config: &JwtConfig) -> Result<Self, KeyMaterialError> {
        match &config.key_source {
            KeySource::Secret(secret) => Self::from_secret(secret.as_bytes()),
            KeySource::KeySet {
                jwks_url,
                private_key_path,
                key_id,
            } => {
                let set = fetch_key_set(jwks_url).await?;
                let pem = match private_key_path {
                    Some(path) => Some(std::fs::read(path).map_err(|e| {
                        KeyMaterialError::InvalidSigningKey(format!("cannot read {path}: {e}"))
                    })?),
                    None => None,
                };

                let material = Self::from_key_set(&set, pem.as_deref(), key_id.as_deref())?;
                info!(
                    jwks_url = %jwks_url,
                    keys = set.keys.len(),
                    can_sign = material.can_sign(),
                    "Loaded published key set"
                );
                Ok(material)
            }
        }
    }

    pub fn from_secret(secret: &[u8]) -> Result<Self, KeyMaterialError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(KeyMaterialError::SecretTooShort(secret.len()));
        }

        Ok(KeyMaterial::Shared {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Builds key-set material. `signing_pem` is the private half of the key
    /// named by `key_id` (or of the sole published key when no id is given).
    pub fn from_key_set(
        set: &JwkSet,
        signing_pem: Option<&[u8]>,
        key_id: Option<&str>,
    ) -> Result<Self, KeyMaterialError> {
        let keys: Vec<PublishedKey> = set.keys.iter().filter_map(published_key).collect();
        if keys.is_empty() {
            return Err(KeyMaterialError::InvalidKeySet(
                "no RSA or EC signature keys found".to_string(),
            ));
        }

        let signing = match signing_pem {
            Some(pem) => {
                let published = match key_id {
                    Some(kid) => keys.iter().find(|k| k.kid.as_deref() == Some(kid)),
                    None if keys.len() == 1 => keys.first(),
                    None => None,
                }
                .ok_or_else(|| {
                    KeyMaterialError::InvalidSigningKey(match key_id {
                        Some(kid) => format!("kid '{kid}' is not in the published key set"),
                        None => "JWT_KEY_ID is required when several keys are published".to_string(),
                    })
                })?;

                let key = match published.algorithm {
                    Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(pem),
                    _ => EncodingKey::from_rsa_pem(pem),
                }
                .map_err(|e| KeyMaterialError::InvalidSigningKey(e.to_string()))?;

                Some(SigningKey {
                    kid: published.kid.clone(),
                    algorithm: published.algorithm,
                    key,
                })
            }
            None => None,
        };

        Ok(KeyMaterial::Published { keys, signing })
    }

    pub fn can_sign(&self) -> bool {
        match self {
            KeyMaterial::Shared { .. } => true,
            KeyMaterial::Published { signing, .. } => signing.is_some(),
        }
    }

    /// Algorithms a token may declare under this material.
    pub fn accepted_algorithms(&self) -> Vec<Algorithm> {
        match self {
            KeyMaterial::Shared { .. } => vec![Algorithm::HS256],
            KeyMaterial::Published { keys, .. } => {
                let mut algorithms: Vec<Algorithm> = Vec::new();
                for key in keys {
                    if !algorithms.contains(&key.algorithm) {
                        algorithms.push(key.algorithm);
                    }
                }
                algorithms
            }
        }
    }

    pub(crate) fn signing_key(&self) -> Option<(Header, &EncodingKey)> {
        match self {
            KeyMaterial::Shared { encoding, .. } => Some((Header::new(Algorithm::HS256), encoding)),
            KeyMaterial::Published { signing, .. } => signing.as_ref().map(|s| {
                let mut header = Header::new(s.algorithm);
                header.kid = s.kid.clone();
                (header, &s.key)
            }),
        }
    }

    /// Picks the verification key for a token header.
    ///
    /// The declared algorithm must belong to this mode's family before any key
    /// is looked at, so `none` and cross-family downgrades never reach
    /// signature verification.
    pub(crate) fn verification_key(&self, header: &Header) -> Result<(&DecodingKey, Algorithm), AuthError> {
        if !self.accepted_algorithms().contains(&header.alg) {
            return Err(AuthError::TokenUnsupported(format!(
                "algorithm {:?} is not accepted",
                header.alg
            )));
        }

        match self {
            KeyMaterial::Shared { decoding, .. } => Ok((decoding, header.alg)),
            KeyMaterial::Published { keys, .. } => {
                let key = match header.kid.as_deref() {
                    Some(kid) => keys
                        .iter()
                        .find(|k| k.kid.as_deref() == Some(kid))
                        .ok_or_else(|| {
                            AuthError::SignatureInvalid(format!("no published key with kid '{kid}'"))
                        })?,
                    None => match keys.as_slice() {
                        [only] => only,
                        _ => {
                            return Err(AuthError::SignatureInvalid(
                                "token has no kid and several keys are published".to_string(),
                            ));
                        }
                    },
                };

                if key.algorithm != header.alg {
                    return Err(AuthError::TokenUnsupported(format!(
                        "algorithm {:?} does not match key algorithm {:?}",
                        header.alg, key.algorithm
                    )));
                }

                Ok((&key.key, key.algorithm))
            }
        }
    }
}

async fn fetch_key_set(url: &str) -> Result<JwkSet, KeyMaterialError> {
    let client = reqwest::Client::builder()
        .timeout(JWKS_FETCH_TIMEOUT)
        .build()
        .map_err(|e| KeyMaterialError::JwksFetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| KeyMaterialError::JwksFetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(KeyMaterialError::JwksFetch(format!(
            "HTTP {} from key set endpoint",
            response.status()
        )));
    }

    response
        .json::<JwkSet>()
        .await
        .map_err(|e| KeyMaterialError::InvalidKeySet(e.to_string()))
}

fn published_key(jwk: &Jwk) -> Option<PublishedKey> {
    let kid = jwk.common.key_id.clone();

    let converted = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::RS256) | None => Algorithm::RS256,
                Some(other) => {
                    warn!(kid = ?kid, algorithm = ?other, "Skipping RSA key with unsupported algorithm");
                    return None;
                }
            };
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e).map(|key| (key, algorithm))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let algorithm = match ec.curve {
                EllipticCurve::P256 => Algorithm::ES256,
                EllipticCurve::P384 => Algorithm::ES384,
                ref other => {
                    warn!(kid = ?kid, curve = ?other, "Skipping EC key on unsupported curve");
                    return None;
                }
            };
            DecodingKey::from_ec_components(&ec.x, &ec.y).map(|key| (key, algorithm))
        }
        _ => {
            warn!(kid = ?kid, "Skipping non-RSA/EC key in published key set");
            return None;
        }
    };

    match converted {
        Ok((key, algorithm)) => Some(PublishedKey { kid, algorithm, key }),
        Err(e) => {
            warn!(kid = ?kid, error = %e, "Skipping malformed published key");
            None
        }
    }
}
