//! # EstateHub Models
//!
//! - [`identity`]: the stored [`Identity`] record and its API view
//! - [`store`]: the [`IdentityStore`] seam plus an in-memory implementation
//! - [`auth`]: sign-in DTOs

pub mod auth;
pub mod identity;
pub mod store;

pub use auth::{SignInRequest, SignInResponse};
pub use identity::{Identity, IdentitySummary, NewIdentity};
pub use store::{IdentityStore, InMemoryIdentityStore};
