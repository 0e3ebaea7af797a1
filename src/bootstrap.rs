//! Startup wiring shared by the identity service and the gateway binaries.
//! Every failure here aborts the process before it binds a port.

use std::sync::Arc;

use anyhow::Context;
use estatehub_auth::{KeyMaterial, TokenValidator};
use estatehub_config::{JwtConfig, SecurityConfig};
use estatehub_db::{PgIdentityStore, init_db_pool, run_migrations};
use estatehub_models::IdentityStore;
use tracing::info;

use crate::modules::identities::service::IdentityResolver;
use crate::state::AuthState;

pub async fn load_key_material(jwt_config: &JwtConfig) -> anyhow::Result<Arc<KeyMaterial>> {
    let keys = KeyMaterial::load(jwt_config)
        .await
        .context("Failed to load token key material")?;
    info!(keys = ?keys, "Key material loaded");
    Ok(Arc::new(keys))
}

pub async fn connect_identity_store() -> anyhow::Result<Arc<dyn IdentityStore>> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(PgIdentityStore::new(pool)))
}

pub fn auth_state(
    keys: Arc<KeyMaterial>,
    store: Arc<dyn IdentityStore>,
    security: SecurityConfig,
) -> AuthState {
    AuthState {
        validator: TokenValidator::new(keys),
        resolver: IdentityResolver::new(store),
        security: Arc::new(security),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
