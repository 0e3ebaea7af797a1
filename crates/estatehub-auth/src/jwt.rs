//! Token issuance and validation.
//!
//! [`TokenIssuer`] signs a [`TokenClaims`] set for an authenticated identity.
//! [`TokenValidator`] is the pure check applied to every presented token:
//! structure, declared algorithm, signature, then expiry. It never inspects
//! claims from a token whose signature failed.
//!
//! Both take an explicit `now` in their `*_at` variants so tests can pin time.
//!
//! # Example
//!
//! ```ignore
//! let keys = Arc::new(KeyMaterial::from_secret(secret.as_bytes())?);
//! let issuer = TokenIssuer::new(keys.clone(), 3600)?;
//! let validator = TokenValidator::new(keys);
//!
//! let issued = issuer.issue(&identity)?;
//! let claims = validator.validate(&issued.token)?;
//! assert_eq!(claims.sub, identity.id.to_string());
//! ```

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Header, Validation, decode, decode_header, encode, errors::ErrorKind};

use estatehub_config::MAX_TOKEN_EXPIRY_SECONDS;
use estatehub_core::{AppError, AuthError};

use crate::claims::TokenClaims;
use crate::keys::KeyMaterial;

/// Anything a token can be issued for.
pub trait TokenSubject {
    fn subject_id(&self) -> i64;
    fn role(&self) -> &str;
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Fails with [`AuthError::SigningKeyUnavailable`] when the key material is
    /// verify-only, and with [`AuthError::AuthenticationFailed`] when the lifetime
    /// is not between one second and [`MAX_TOKEN_EXPIRY_SECONDS`].
    pub fn new(keys: Arc<KeyMaterial>, expiry_seconds: i64) -> Result<Self, AuthError> {
        if !keys.can_sign() {
            return Err(AuthError::SigningKeyUnavailable);
        }

        let lifetime = Duration::try_seconds(expiry_seconds)
            .filter(|_| (1..=MAX_TOKEN_EXPIRY_SECONDS).contains(&expiry_seconds))
            .ok_or_else(|| {
                AuthError::AuthenticationFailed(format!("token lifetime of {expiry_seconds}s is out of range"))
            })?;

        Ok(Self { keys, lifetime })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, subject: &impl TokenSubject) -> Result<IssuedToken, AppError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &impl TokenSubject, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let (header, key) = self.keys.signing_key().ok_or(AuthError::SigningKeyUnavailable)?;

        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: subject.subject_id().to_string(),
            role: subject.role().to_string(),
            iat,
            exp: iat + self.lifetime.num_seconds(),
        };

        let token = encode(&header, &claims, key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }
}

#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: Arc<KeyMaterial>,
}

impl TokenValidator {
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        Self { keys }
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validates `token` as of `now`. A token is expired when `exp < now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenMissing);
        }

        let header = read_header(token)?;
        let (key, algorithm) = self.keys.verification_key(&header)?;

        // Expiry is checked below against the injected clock.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, key, &validation).map_err(map_decode_error)?;

        if data.claims.exp < now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

fn read_header(token: &str) -> Result<Header, AuthError> {
    if token.split('.').count() != 3 {
        return Err(AuthError::TokenMalformed(
            "expected three dot-separated segments".to_string(),
        ));
    }

    decode_header(token).map_err(|e| match declared_algorithm(token) {
        Some(alg) => AuthError::TokenUnsupported(format!("algorithm '{alg}' is not accepted")),
        None => AuthError::TokenMalformed(e.to_string()),
    })
}

/// The raw `alg` of a header the token library refused to parse, e.g. `none`.
fn declared_algorithm(token: &str) -> Option<String> {
    let segment = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    header.get("alg")?.as_str().map(str::to_string)
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid(err.to_string()),
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName | ErrorKind::MissingAlgorithm => {
            AuthError::TokenUnsupported(err.to_string())
        }
        ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidEcdsaKey => {
            AuthError::SignatureInvalid(err.to_string())
        }
        _ => AuthError::TokenMalformed(err.to_string()),
    }
}
