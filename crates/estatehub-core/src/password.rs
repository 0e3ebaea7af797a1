use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash with an explicit bcrypt cost. Low costs are only meant for tests and seeding.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

/// Compares `password` against a stored bcrypt hash.
///
/// bcrypt re-derives the hash with the stored salt and compares in constant time.
/// A stored value that is not a bcrypt hash is reported as an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}
