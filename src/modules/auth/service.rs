use estatehub_auth::IssuedToken;
use estatehub_core::{AppError, AuthError, verify_password};
use estatehub_models::{Identity, IdentitySummary, SignInRequest, SignInResponse};
use estatehub_observability::{track_sign_in, track_token_issued};
use tracing::{error, info, instrument};

use crate::modules::identities::service::IdentityResolver;
use crate::state::AppState;

pub struct AuthService;

impl AuthService {
    /// Checks an email/password pair against the stored hash.
    ///
    /// Unknown and inactive identities are [`AuthError::PrincipalNotFound`];
    /// a wrong password is [`AuthError::InvalidCredentials`]. Read-only.
    #[instrument(skip(resolver, password))]
    pub async fn verify_credentials(
        resolver: &IdentityResolver,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let identity = resolver.resolve_by_email(email).await?;

        match verify_password(password, &identity.password_hash) {
            Ok(true) => Ok(identity),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                error!(identity_id = identity.id, error = ?e.error, "Stored password hash is unusable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    #[instrument(skip(state, dto), fields(email = %dto.email))]
    pub async fn sign_in(state: &AppState, dto: SignInRequest) -> Result<SignInResponse, AppError> {
        let identity = match Self::verify_credentials(&state.auth.resolver, &dto.email, &dto.password).await {
            Ok(identity) => identity,
            Err(err) => {
                track_sign_in(err.error_code());
                return Err(err.into());
            }
        };

        let IssuedToken { token, claims } = state.issuer.issue(&identity)?;
        track_sign_in("success");
        track_token_issued();
        info!(identity_id = identity.id, exp = claims.exp, "Token issued");

        Ok(SignInResponse {
            message: "Sign-in successful".to_string(),
            token,
            identity: IdentitySummary::from(&identity),
        })
    }
}
