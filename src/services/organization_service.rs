use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::Role;
use crate::database::models::{membership, Organization, OrganizationMembership};

#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    #[error("Invalid organization name: {0}")]
    InvalidName(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already a member: {0}")]
    AlreadyMember(String),
    #[error("No pending invite: {0}")]
    NoPendingInvite(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct OrganizationService {
    pool: PgPool,
}

impl OrganizationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an organization; the creator becomes its active owner.
    pub async fn create(
        &self,
        name: &str,
        creator_id: Uuid,
    ) -> Result<Organization, OrganizationError> {
        self.validate_name(name)?;

        let mut tx = self.pool.begin().await?;

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO organization_memberships (id, user_id, organization_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(creator_id)
        .bind(organization.id)
        .bind(Role::Owner.as_str())
        .bind(membership::STATUS_ACTIVE)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(organization)
    }

    pub async fn get(&self, organization_id: Uuid) -> Result<Organization, OrganizationError> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OrganizationError::NotFound(organization_id.to_string()))
    }

    pub async fn update_name(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Organization, OrganizationError> {
        self.validate_name(name)?;

        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OrganizationError::NotFound(organization_id.to_string()))
    }

    /// Delete an organization and its memberships.
    pub async fn delete(&self, organization_id: Uuid) -> Result<(), OrganizationError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM organization_memberships WHERE organization_id = $1")
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(OrganizationError::NotFound(organization_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Organizations where the user holds an active membership.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>, OrganizationError> {
        let organizations = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.created_at, o.updated_at
            FROM organizations o
            JOIN organization_memberships m ON m.organization_id = o.id
            WHERE m.user_id = $1 AND m.status = $2
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(membership::STATUS_ACTIVE)
        .fetch_all(&self.pool)
        .await?;

        Ok(organizations)
    }

    pub async fn list_members(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationMembership>, OrganizationError> {
        let members = sqlx::query_as::<_, OrganizationMembership>(
            r#"
            SELECT id, user_id, organization_id, role, status, joined_at
            FROM organization_memberships
            WHERE organization_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Invite a user: creates a pending membership carrying the offered role.
    pub async fn invite(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<OrganizationMembership, OrganizationError> {
        let existing = sqlx::query_as::<_, OrganizationMembership>(
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

        if existing.is_some() {
            return Err(OrganizationError::AlreadyMember(user_id.to_string()));
        }

        let invited = sqlx::query_as::<_, OrganizationMembership>(
            r#"
            INSERT INTO organization_memberships (id, user_id, organization_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, organization_id, role, status, joined_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(organization_id)
        .bind(role.as_str())
        .bind(membership::STATUS_PENDING)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(invited)
    }

    /// Flip the caller's own pending membership to active. The join
    /// timestamp is set at acceptance, not at invite time.
    pub async fn accept_invite(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrganizationMembership, OrganizationError> {
        sqlx::query_as::<_, OrganizationMembership>(
            r#"
            UPDATE organization_memberships
            SET status = $3, joined_at = $4
            WHERE user_id = $1 AND organization_id = $2 AND status = $5
            RETURNING id, user_id, organization_id, role, status, joined_at
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(membership::STATUS_ACTIVE)
        .bind(Utc::now())
        .bind(membership::STATUS_PENDING)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OrganizationError::NoPendingInvite(user_id.to_string()))
    }

    pub async fn remove_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), OrganizationError> {
        let result = sqlx::query(
            "DELETE FROM organization_memberships WHERE user_id = $1 AND organization_id = $2",
        )
        .bind(user_id)
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrganizationError::NotFound(user_id.to_string()));
        }

        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), OrganizationError> {
        if name.trim().len() < 2 {
            return Err(OrganizationError::InvalidName(
                "Organization name must be at least 2 characters".to_string(),
            ));
        }

        if name.len() > 100 {
            return Err(OrganizationError::InvalidName(
                "Organization name must be less than 100 characters".to_string(),
            ));
        }

        Ok(())
    }
}
