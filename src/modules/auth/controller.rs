use axum::Json;
use axum::extract::State;
use estatehub_auth::AuthenticatedPrincipal;
use estatehub_core::{AppError, ErrorResponse};
use estatehub_models::{SignInRequest, SignInResponse};
use tracing::instrument;

use super::service::AuthService;
use crate::middleware::Principal;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Sign in and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Sign-in successful", body = SignInResponse),
        (status = 401, description = "Unknown identity or wrong password", body = ErrorResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let response = AuthService::sign_in(&state, dto).await?;
    Ok(Json(response))
}

/// Current principal
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "The authenticated principal", body = AuthenticatedPrincipal),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(principal), fields(identity_id = principal.0.identity_id))]
pub async fn me(principal: Principal) -> Json<AuthenticatedPrincipal> {
    Json(principal.0)
}
