use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use estatehub::bootstrap::{auth_state, connect_identity_store, load_key_material, shutdown_signal};
use estatehub::gateway::{GatewayState, RouteTable, init_gateway_router};
use estatehub::middleware::PropagationPolicy;
use estatehub_config::{CorsConfig, GatewayConfig, JwtConfig, SecurityConfig, ServerConfig};
use estatehub_observability::{init_metrics, init_tracing};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let jwt_config = JwtConfig::from_env()?;
    let gateway_config = GatewayConfig::from_env()?;
    let server_config = ServerConfig::from_env(DEFAULT_PORT)?;

    let keys = load_key_material(&jwt_config).await?;
    let store = connect_identity_store().await?;

    let routes = RouteTable::new(gateway_config.routes.clone());
    if routes.is_empty() {
        warn!("GATEWAY_ROUTES is empty; every proxied request will be 404");
    }

    let propagation = PropagationPolicy::from_config(&gateway_config)?;
    if !propagation.strip_untrusted {
        warn!("Client-supplied identity headers are forwarded on anonymous requests");
    }

    let client = reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build upstream HTTP client")?;

    let state = GatewayState {
        auth: auth_state(keys, store, SecurityConfig::from_env()),
        routes: Arc::new(routes),
        propagation: Arc::new(propagation),
        client,
    };

    let app = init_gateway_router(state, &CorsConfig::from_env(), init_metrics()?);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, routes = ?gateway_config.routes, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway error")?;

    Ok(())
}
