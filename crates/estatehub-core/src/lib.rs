//! # EstateHub Core
//!
//! Foundational types shared by the identity service and the edge gateway:
//!
//! - [`errors`]: the authentication/authorization error taxonomy ([`AuthError`]),
//!   the general-purpose [`AppError`], and the single JSON error shape both
//!   render to ([`ErrorResponse`])
//! - [`password`]: bcrypt password hashing and constant-time verification
//!
//! # Example
//!
//! ```ignore
//! use estatehub_core::{AuthError, hash_password, verify_password};
//!
//! let hash = hash_password("s3cret-passw0rd")?;
//! if !verify_password("s3cret-passw0rd", &hash)? {
//!     return Err(AuthError::InvalidCredentials);
//! }
//! ```

pub mod errors;
pub mod password;

pub use errors::{AppError, AuthError, ErrorResponse};
pub use password::{hash_password, hash_password_with_cost, verify_password};
