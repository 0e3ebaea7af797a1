//! Identity store abstraction.
//!
//! The authentication core only reads identities. [`IdentityStore`] is the
//! seam between it and the backing store: Postgres in production, the
//! [`InMemoryIdentityStore`] in tests and local tooling.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::identity::{Identity, NewIdentity};

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Identity>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>>;
}

/// Identity store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<Vec<Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an active identity and returns it with its assigned id.
    pub fn insert(&self, new: NewIdentity) -> anyhow::Result<Identity> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| anyhow::anyhow!("identity store lock poisoned"))?;

        if identities.iter().any(|i| i.email == new.email) {
            anyhow::bail!("an identity with email {} already exists", new.email);
        }

        let identity = Identity {
            id: identities.iter().map(|i| i.id).max().unwrap_or(0) + 1,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            active: true,
            created_at: Utc::now(),
        };
        identities.push(identity.clone());
        Ok(identity)
    }

    /// Returns whether an identity with `id` existed.
    pub fn set_active(&self, id: i64, active: bool) -> anyhow::Result<bool> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| anyhow::anyhow!("identity store lock poisoned"))?;

        Ok(match identities.iter_mut().find(|i| i.id == id) {
            Some(identity) => {
                identity.active = active;
                true
            }
            None => false,
        })
    }

    fn find(&self, predicate: impl Fn(&Identity) -> bool) -> anyhow::Result<Option<Identity>> {
        let identities = self
            .identities
            .read()
            .map_err(|_| anyhow::anyhow!("identity store lock poisoned"))?;
        Ok(identities.iter().find(|i| predicate(i)).cloned())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Identity>> {
        self.find(|i| i.id == id)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>> {
        self.find(|i| i.email == email)
    }
}
