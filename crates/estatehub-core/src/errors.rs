//! Error taxonomy and the single JSON error shape every failure renders to.
//!
//! [`AuthError`] is the closed set of authentication/authorization failures.
//! Each variant carries a stable `errorCode`, a human title and an HTTP status:
//! 401 for every authentication failure, 403 for a role denial.
//! [`AppError`] covers everything else (validation, missing resources, upstream
//! failures) and also absorbs an [`AuthError`] without losing its code.
//!
//! Both produce:
//!
//! ```json
//! {
//!   "success": false,
//!   "errorCode": "TOKEN_EXPIRED",
//!   "title": "Token Expired",
//!   "timestamp": "2026-10-19T12:00:00Z",
//!   "details": "Token has expired"
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Stable machine-readable code
    #[schema(example = "TOKEN_EXPIRED")]
    pub error_code: String,
    #[schema(example = "Token Expired")]
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.into(),
            title: title.into(),
            timestamp: Utc::now(),
            details: details.into(),
        }
    }
}

/// Authentication and authorization failures.
///
/// Variants holding a `String` carry the nested cause reported by the token
/// library or the filter stage that produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No active identity matches the authenticated subject")]
    PrincipalNotFound,
    #[error("Full authentication is required: no bearer token was presented")]
    TokenMissing,
    #[error("Bearer token is malformed: {0}")]
    TokenMalformed(String),
    #[error("Token signature could not be verified: {0}")]
    SignatureInvalid(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token uses an unsupported algorithm or format: {0}")]
    TokenUnsupported(String),
    #[error("Access denied: {0}")]
    InsufficientRole(String),
    /// Startup-fatal. Never produced while serving a request.
    #[error("Signing key material is unavailable")]
    SigningKeyUnavailable,
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::PrincipalNotFound => "PRINCIPAL_NOT_FOUND",
            AuthError::TokenMissing => "TOKEN_MISSING",
            AuthError::TokenMalformed(_) => "INVALID_BEARER_TOKEN",
            AuthError::SignatureInvalid(_) => "TOKEN_SIGNATURE_INVALID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenUnsupported(_) => "TOKEN_UNSUPPORTED",
            AuthError::InsufficientRole(_) => "ACCESS_DENIED",
            AuthError::SigningKeyUnavailable => "SIGNING_KEY_UNAVAILABLE",
            AuthError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid Credentials",
            AuthError::PrincipalNotFound => "Principal Not Found",
            AuthError::TokenMissing => "Authentication Required",
            AuthError::TokenMalformed(_) => "Invalid Bearer Token",
            AuthError::SignatureInvalid(_) => "Token Validation Failed",
            AuthError::TokenExpired => "Token Expired",
            AuthError::TokenUnsupported(_) => "Unsupported Token",
            AuthError::InsufficientRole(_) => "Access Denied",
            AuthError::SigningKeyUnavailable => "Signing Key Unavailable",
            AuthError::AuthenticationFailed(_) => "Authentication Failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole(_) => StatusCode::FORBIDDEN,
            AuthError::SigningKeyUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.error_code(), self.title(), self.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}

/// General application error: an HTTP status, a stable code and the underlying cause.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub title: &'static str,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: &'static str, title: &'static str, err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            status,
            code,
            title,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal Server Error",
            err,
        )
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Bad Request", err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_FAILED",
            "Validation Failed",
            err,
        )
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Not Found", err)
    }

    pub fn payload_too_large<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Payload Too Large",
            err,
        )
    }

    pub fn bad_gateway<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::new(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "Bad Gateway", err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self {
            status: err.status_code(),
            code: err.error_code(),
            title: err.title(),
            error: anyhow::Error::new(err),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self.error, "Internal server error");
            "An unexpected error occurred".to_string()
        } else {
            self.error.to_string()
        };

        let body = Json(ErrorResponse::new(self.code, self.title, details));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn token_expired_renders_structured_401() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errorCode"], "TOKEN_EXPIRED");
        assert_eq!(body["title"], "Token Expired");
        assert_eq!(body["details"], "Token has expired");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn insufficient_role_renders_403() {
        let response = AuthError::InsufficientRole("requires ADMIN".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["errorCode"], "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn signature_failure_keeps_nested_cause() {
        let response = AuthError::SignatureInvalid("InvalidSignature".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["errorCode"], "TOKEN_SIGNATURE_INVALID");
        assert!(body["details"].as_str().unwrap().contains("InvalidSignature"));
    }

    #[test]
    fn every_authentication_failure_is_401() {
        let failures = [
            AuthError::InvalidCredentials,
            AuthError::PrincipalNotFound,
            AuthError::TokenMissing,
            AuthError::TokenMalformed("x".into()),
            AuthError::SignatureInvalid("x".into()),
            AuthError::TokenExpired,
            AuthError::TokenUnsupported("x".into()),
            AuthError::AuthenticationFailed("x".into()),
        ];
        for failure in failures {
            assert_eq!(failure.status_code(), StatusCode::UNAUTHORIZED, "{failure:?}");
        }
    }

    #[test]
    fn error_codes_are_distinct() {
        let codes = [
            AuthError::InvalidCredentials.error_code(),
            AuthError::PrincipalNotFound.error_code(),
            AuthError::TokenMissing.error_code(),
            AuthError::TokenMalformed(String::new()).error_code(),
            AuthError::SignatureInvalid(String::new()).error_code(),
            AuthError::TokenExpired.error_code(),
            AuthError::TokenUnsupported(String::new()).error_code(),
            AuthError::InsufficientRole(String::new()).error_code(),
            AuthError::SigningKeyUnavailable.error_code(),
            AuthError::AuthenticationFailed(String::new()).error_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[tokio::test]
    async fn app_error_from_auth_error_keeps_code_and_status() {
        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let body = body_json(err.into_response()).await;
        assert_eq!(body["errorCode"], "INVALID_CREDENTIALS");
        assert_eq!(body["details"], "Invalid email or password");
    }

    #[tokio::test]
    async fn payload_too_large_renders_413() {
        let response = AppError::payload_too_large(anyhow::anyhow!("Request body exceeds 10 bytes")).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = body_json(response).await;
        assert_eq!(body["errorCode"], "PAYLOAD_TOO_LARGE");
        assert_eq!(body["details"], "Request body exceeds 10 bytes");
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let response = AppError::internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["errorCode"], "INTERNAL_ERROR");
        assert!(!body["details"].as_str().unwrap().contains("connection refused"));
    }
}
