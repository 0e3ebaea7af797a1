//! # EstateHub Auth
//!
//! Token lifecycle and principal types shared by the identity service and the gateway.
//!
//! - [`keys`]: key material, either a shared HMAC secret or a published key set
//! - [`jwt`]: [`TokenIssuer`] and the pure [`TokenValidator`]
//! - [`claims`]: the signed claim set
//! - [`principal`]: the request-scoped [`AuthenticatedPrincipal`] and its [`Authority`] set
//!
//! # Example
//!
//! ```ignore
//! use estatehub_auth::{KeyMaterial, TokenValidator};
//! use estatehub_config::JwtConfig;
//!
//! let keys = Arc::new(KeyMaterial::load(&JwtConfig::from_env()?).await?);
//! let validator = TokenValidator::new(keys);
//! let claims = validator.validate(token)?;
//! ```

pub mod claims;
pub mod jwt;
pub mod keys;
pub mod principal;

pub use claims::TokenClaims;
pub use jwt::{IssuedToken, TokenIssuer, TokenSubject, TokenValidator};
pub use keys::{KeyMaterial, KeyMaterialError, MIN_SECRET_BYTES};
pub use principal::{AuthenticatedPrincipal, Authority};
