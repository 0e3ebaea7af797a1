pub mod access;
pub mod authenticate;
pub mod propagate;

pub use access::{
    Principal, RequireAdmin, RequiredAuthorities, reject_failed_authentication, require_authenticated,
    require_authorities,
};
pub use authenticate::{RequestAuthentication, authenticate};
pub use propagate::{PropagationPolicy, TrustedHeaderSet, TrustedIdentity, propagate_claims};
