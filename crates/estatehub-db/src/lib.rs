//! # EstateHub DB
//!
//! Postgres connection pool, migrations and the production [`IdentityStore`].
//!
//! # Example
//!
//! ```ignore
//! use estatehub_db::{PgIdentityStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url).await?;
//! run_migrations(&pool).await?;
//! let store = PgIdentityStore::new(pool);
//! ```

use anyhow::Context;
use async_trait::async_trait;
use estatehub_models::{Identity, IdentityStore, NewIdentity};
use tracing::info;

pub use sqlx::PgPool;

/// Connects to Postgres. The pool is cheap to clone and shared for the process lifetime.
pub async fn init_db_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Database pool initialized");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// Identity store backed by the `identities` table.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new: NewIdentity) -> anyhow::Result<Identity> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, active, created_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to create identity {}", new.email))?;

        Ok(identity)
    }

    /// Returns whether a row was updated.
    pub async fn set_active(&self, email: &str, active: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE identities SET active = $1 WHERE email = $2")
            .bind(active)
            .bind(email)
            .execute(&self.pool)
            .await
            .context("Failed to update identity")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password_hash, role, active, created_at FROM identities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password_hash, role, active, created_at FROM identities WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }
}
