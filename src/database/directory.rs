use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::models::{OrganizationMembership, User};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Lookup interface the authorization layer depends on.
///
/// Absence is a normal negative result (`Ok(None)`); only persistence
/// failures surface as errors.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError>;

    async fn find_membership(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationMembership>, DirectoryError>;
}

pub type DirectoryState = Arc<dyn Directory>;

/// Postgres-backed directory used in production.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationMembership>, DirectoryError> {
        let membership = sqlx::query_as::<_, OrganizationMembership>(
            r#"
            SELECT id, user_id, organization_id, role, status, joined_at
            FROM organization_memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }
}

/// In-memory directory for tests and local experiments. Lookups never touch
/// the database, so permission logic can be exercised in isolation.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    memberships: RwLock<HashMap<(Uuid, Uuid), OrganizationMembership>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users
            .write()
            .expect("user map poisoned")
            .insert(user.id, user);
    }

    pub fn insert_membership(&self, membership: OrganizationMembership) {
        self.memberships
            .write()
            .expect("membership map poisoned")
            .insert(
                (membership.user_id, membership.organization_id),
                membership,
            );
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DirectoryError> {
        Ok(self
            .users
            .read()
            .expect("user map poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<OrganizationMembership>, DirectoryError> {
        Ok(self
            .memberships
            .read()
            .expect("membership map poisoned")
            .get(&(user_id, organization_id))
            .cloned())
    }
}
