#![allow(dead_code)]

use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use estatehub::bootstrap::auth_state;
use estatehub::state::AppState;
use estatehub_auth::{KeyMaterial, TokenIssuer};
use estatehub_config::{CorsConfig, SecurityConfig};
use estatehub_core::hash_password_with_cost;
use estatehub_models::{Identity, InMemoryIdentityStore, NewIdentity};
use http_body_util::BodyExt;

pub const TEST_SECRET: &str = "estatehub-integration-test-secret-0123456789";
pub const TOKEN_LIFETIME_SECONDS: i64 = 3600;

pub struct TestContext {
    pub store: Arc<InMemoryIdentityStore>,
    pub keys: Arc<KeyMaterial>,
    pub issuer: TokenIssuer,
}

impl TestContext {
    pub fn new() -> Self {
        let keys = Arc::new(KeyMaterial::from_secret(TEST_SECRET.as_bytes()).unwrap());
        let issuer = TokenIssuer::new(keys.clone(), TOKEN_LIFETIME_SECONDS).unwrap();
        Self {
            store: Arc::new(InMemoryIdentityStore::new()),
            keys,
            issuer,
        }
    }

    /// Stores an active identity with a cheap bcrypt hash.
    pub fn seed_identity(&self, email: &str, password: &str, role: &str) -> Identity {
        self.store
            .insert(NewIdentity {
                email: email.to_string(),
                password_hash: hash_password_with_cost(password, 4).unwrap(),
                role: role.to_string(),
            })
            .unwrap()
    }

    pub fn token_for(&self, identity: &Identity) -> String {
        self.issuer.issue(identity).unwrap().token
    }

    /// Token whose lifetime ended `seconds_ago` seconds ago.
    pub fn expired_token_for(&self, identity: &Identity, seconds_ago: i64) -> String {
        let issued_at: DateTime<Utc> =
            Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECONDS + seconds_ago);
        self.issuer.issue_at(identity, issued_at).unwrap().token
    }

    pub fn app_state(&self, security: SecurityConfig) -> AppState {
        AppState {
            auth: auth_state(self.keys.clone(), self.store.clone(), security),
            issuer: self.issuer.clone(),
            cors_config: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            metrics: None,
        }
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
