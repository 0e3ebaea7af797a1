use axum::Json;
use axum::extract::{Path, State};
use estatehub_core::{AppError, ErrorResponse};
use estatehub_models::IdentitySummary;
use tracing::instrument;

use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Look up an identity by id (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/identities/{id}",
    params(("id" = i64, Path, description = "Identity id")),
    responses(
        (status = 200, description = "Identity found", body = IdentitySummary),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Caller lacks the ADMIN role", body = ErrorResponse),
        (status = 404, description = "No identity with this id", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin), fields(admin_id = admin.0.0.identity_id))]
pub async fn get_identity(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<IdentitySummary>, AppError> {
    let identity = state
        .auth
        .resolver
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Identity {} not found", id)))?;

    Ok(Json(IdentitySummary::from(&identity)))
}
