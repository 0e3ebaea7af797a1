//! Sign-in request and response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::identity::IdentitySummary;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    #[schema(example = "Sign-in successful")]
    pub message: String,
    /// Bearer token to present on subsequent requests
    pub token: String,
    pub identity: IdentitySummary,
}
