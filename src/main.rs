use anyhow::Context;
use dotenvy::dotenv;
use estatehub::bootstrap::{auth_state, connect_identity_store, load_key_material, shutdown_signal};
use estatehub::router::init_router;
use estatehub::state::AppState;
use estatehub_auth::TokenIssuer;
use estatehub_config::{CorsConfig, JwtConfig, SecurityConfig, ServerConfig};
use estatehub_observability::{init_metrics, init_tracing};
use tracing::info;

const DEFAULT_PORT: u16 = 8081;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let jwt_config = JwtConfig::from_env()?;
    let server_config = ServerConfig::from_env(DEFAULT_PORT)?;

    let keys = load_key_material(&jwt_config).await?;
    // A verify-only key set cannot issue tokens; refuse to start.
    let issuer = TokenIssuer::new(keys.clone(), jwt_config.expiry_seconds)
        .context("Identity service needs signing key material")?;

    let store = connect_identity_store().await?;

    let state = AppState {
        auth: auth_state(keys, store, SecurityConfig::from_env()),
        issuer,
        cors_config: CorsConfig::from_env(),
        metrics: init_metrics()?,
    };

    let app = init_router(state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Identity service listening");
    info!("Swagger UI available at http://{}/swagger-ui", address);
    info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
