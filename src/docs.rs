use estatehub_auth::{AuthenticatedPrincipal, Authority};
use estatehub_core::ErrorResponse;
use estatehub_models::{IdentitySummary, SignInRequest, SignInResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::health::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::sign_in,
        crate::modules::auth::controller::me,
        crate::modules::identities::controller::get_identity,
        crate::modules::health::health,
    ),
    components(
        schemas(
            SignInRequest,
            SignInResponse,
            IdentitySummary,
            AuthenticatedPrincipal,
            Authority,
            HealthResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-in and current principal"),
        (name = "Identities", description = "Identity lookup"),
        (name = "Health", description = "Liveness")
    ),
    info(
        title = "EstateHub Identity API",
        version = "0.1.0",
        description = "Issues bearer tokens for EstateHub identities and exposes the authenticated principal.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
