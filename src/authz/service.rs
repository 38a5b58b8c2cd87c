use thiserror::Error;
use uuid::Uuid;

use crate::database::directory::{DirectoryError, DirectoryState};

use super::{AccessConditions, Action, PermissionTable, Resource, Role};

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Authorization lookup failed: {0}")]
    Lookup(String),
}

impl From<DirectoryError> for AuthzError {
    fn from(err: DirectoryError) -> Self {
        AuthzError::Lookup(err.to_string())
    }
}

/// Permission decisions layered over directory lookups.
///
/// Every "no" is a silent `Ok(false)` - missing user, missing membership,
/// pending membership, unknown role, missing grant, unmet condition. Only
/// lookup faults become errors, and those propagate to the caller untouched.
pub struct AuthorizationService {
    directory: DirectoryState,
    table: PermissionTable,
}

impl AuthorizationService {
    pub fn new(directory: DirectoryState, table: PermissionTable) -> Self {
        Self { directory, table }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    /// Decide whether `user_id` may perform `action` on `resource` within
    /// `organization_id`.
    ///
    /// Cross-organization administrative tiers (dev, global admin) bypass the
    /// membership lookup entirely. Everyone else is judged by their active
    /// membership role against the static permission table, then by any
    /// caller-supplied conditions on the record named by `resource_id`.
    pub async fn has_permission(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        action: Action,
        resource: Resource,
        resource_id: Option<Uuid>,
        conditions: Option<&AccessConditions>,
    ) -> Result<bool, AuthzError> {
        let Some(user) = self.directory.find_user(user_id).await? else {
            return Ok(false);
        };

        if matches!(Role::parse(&user.role), Some(role) if role.is_cross_org_admin()) {
            return Ok(true);
        }

        let Some(membership) = self
            .directory
            .find_membership(user_id, organization_id)
            .await?
        else {
            return Ok(false);
        };

        if !membership.is_active() {
            return Ok(false);
        }

        // Unknown role strings stored in the database degrade to "no
        // permission" rather than raising.
        let Some(role) = Role::parse(&membership.role) else {
            tracing::warn!(
                "Membership {} carries unknown role '{}'; denying",
                membership.id,
                membership.role
            );
            return Ok(false);
        };

        if !self.table.allows(role, action, resource) {
            return Ok(false);
        }

        if let Some(conditions) = conditions {
            if !conditions.met_by(user_id) {
                tracing::debug!(
                    "Condition unmet for user {} on {:?} {:?} (record {:?})",
                    user_id,
                    action,
                    resource,
                    resource_id
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// True only when the actor holds the highest global tier and the target
    /// is somebody else. The caller appends the audit entry on success.
    pub async fn can_impersonate(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, AuthzError> {
        if actor_id == target_id {
            return Ok(false);
        }

        let Some(actor) = self.directory.find_user(actor_id).await? else {
            return Ok(false);
        };

        Ok(Role::parse(&actor.role) == Some(Role::Dev))
    }

    /// The role that governs what `user_id` sees inside `organization_id`:
    /// the global tier for cross-organization admins, otherwise the active
    /// membership role. `None` means the caller has no standing there.
    pub async fn effective_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Role>, AuthzError> {
        let Some(user) = self.directory.find_user(user_id).await? else {
            return Ok(None);
        };

        if let Some(role) = Role::parse(&user.role) {
            if role.is_cross_org_admin() {
                return Ok(Some(role));
            }
        }

        let Some(membership) = self
            .directory
            .find_membership(user_id, organization_id)
            .await?
        else {
            return Ok(None);
        };

        if !membership.is_active() {
            return Ok(None);
        }

        Ok(Role::parse(&membership.role))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::database::directory::InMemoryDirectory;
    use crate::database::models::{membership, OrganizationMembership, User};

    fn user(role: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", role),
            name: role.to_string(),
            role: role.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn membership_row(user_id: Uuid, org_id: Uuid, role: &str, status: &str) -> OrganizationMembership {
        OrganizationMembership {
            id: Uuid::new_v4(),
            user_id,
            organization_id: org_id,
            role: role.to_string(),
            status: status.to_string(),
            joined_at: Utc::now(),
        }
    }

    fn service(directory: InMemoryDirectory) -> AuthorizationService {
        AuthorizationService::new(Arc::new(directory), PermissionTable::builtin())
    }

    #[tokio::test]
    async fn no_membership_means_no_permission() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        directory.insert_user(caller);

        let svc = service(directory);
        let org = Uuid::new_v4();
        let allowed = svc
            .has_permission(caller_id, org, Action::Read, Resource::Product, None, None)
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn unknown_user_is_denied() {
        let svc = service(InMemoryDirectory::new());
        let allowed = svc
            .has_permission(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Action::Read,
                Resource::Product,
                None,
                None,
            )
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn active_member_gets_catalog_access_but_not_org_settings() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        let org = Uuid::new_v4();
        directory.insert_user(caller);
        directory.insert_membership(membership_row(
            caller_id,
            org,
            "member",
            membership::STATUS_ACTIVE,
        ));

        let svc = service(directory);
        assert!(svc
            .has_permission(caller_id, org, Action::Create, Resource::Product, None, None)
            .await
            .unwrap());
        assert!(!svc
            .has_permission(caller_id, org, Action::Update, Resource::Organization, None, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn pending_membership_confers_nothing() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        let org = Uuid::new_v4();
        directory.insert_user(caller);
        directory.insert_membership(membership_row(
            caller_id,
            org,
            "owner",
            membership::STATUS_PENDING,
        ));

        let svc = service(directory);
        assert!(!svc
            .has_permission(caller_id, org, Action::Read, Resource::Product, None, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_membership_role_is_denied() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        let org = Uuid::new_v4();
        directory.insert_user(caller);
        directory.insert_membership(membership_row(
            caller_id,
            org,
            "superuser",
            membership::STATUS_ACTIVE,
        ));

        let svc = service(directory);
        assert!(!svc
            .has_permission(caller_id, org, Action::Read, Resource::Product, None, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn global_admin_bypasses_membership_lookup() {
        let directory = InMemoryDirectory::new();
        let admin = user("admin");
        let admin_id = admin.id;
        directory.insert_user(admin);

        // No membership inserted at all.
        let svc = service(directory);
        assert!(svc
            .has_permission(
                admin_id,
                Uuid::new_v4(),
                Action::Delete,
                Resource::Organization,
                None,
                None,
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn conditions_gate_own_records() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        let org = Uuid::new_v4();
        directory.insert_user(caller);
        directory.insert_membership(membership_row(
            caller_id,
            org,
            "member",
            membership::STATUS_ACTIVE,
        ));

        let svc = service(directory);
        let record = Uuid::new_v4();

        let own = AccessConditions::owned_by(caller_id);
        assert!(svc
            .has_permission(
                caller_id,
                org,
                Action::Update,
                Resource::Product,
                Some(record),
                Some(&own),
            )
            .await
            .unwrap());

        let someone_elses = AccessConditions::owned_by(Uuid::new_v4());
        assert!(!svc
            .has_permission(
                caller_id,
                org,
                Action::Update,
                Resource::Product,
                Some(record),
                Some(&someone_elses),
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn decisions_are_deterministic() {
        let directory = InMemoryDirectory::new();
        let caller = user("user");
        let caller_id = caller.id;
        let org = Uuid::new_v4();
        directory.insert_user(caller);
        directory.insert_membership(membership_row(
            caller_id,
            org,
            "member",
            membership::STATUS_ACTIVE,
        ));

        let svc = service(directory);
        let mut outcomes = Vec::new();
        for _ in 0..5 {
            outcomes.push(
                svc.has_permission(caller_id, org, Action::Read, Resource::Combo, None, None)
                    .await
                    .unwrap(),
            );
        }
        assert!(outcomes.iter().all(|&v| v));
    }

    #[tokio::test]
    async fn self_impersonation_is_always_refused() {
        let directory = InMemoryDirectory::new();
        let dev = user("dev");
        let dev_id = dev.id;
        directory.insert_user(dev);

        let svc = service(directory);
        assert!(!svc.can_impersonate(dev_id, dev_id).await.unwrap());
    }

    #[tokio::test]
    async fn only_devs_impersonate() {
        let directory = InMemoryDirectory::new();
        let dev = user("dev");
        let admin = user("admin");
        let target = user("user");
        let (dev_id, admin_id, target_id) = (dev.id, admin.id, target.id);
        directory.insert_user(dev);
        directory.insert_user(admin);
        directory.insert_user(target);

        let svc = service(directory);
        assert!(svc.can_impersonate(dev_id, target_id).await.unwrap());
        assert!(!svc.can_impersonate(admin_id, target_id).await.unwrap());
        assert!(!svc.can_impersonate(target_id, dev_id).await.unwrap());
    }

    #[tokio::test]
    async fn effective_role_prefers_global_tier() {
        let directory = InMemoryDirectory::new();
        let dev = user("dev");
        let plain = user("user");
        let (dev_id, plain_id) = (dev.id, plain.id);
        let org = Uuid::new_v4();
        directory.insert_user(dev);
        directory.insert_user(plain);
        directory.insert_membership(membership_row(
            plain_id,
            org,
            "owner",
            membership::STATUS_ACTIVE,
        ));

        let svc = service(directory);
        assert_eq!(svc.effective_role(dev_id, org).await.unwrap(), Some(Role::Dev));
        assert_eq!(svc.effective_role(plain_id, org).await.unwrap(), Some(Role::Owner));
        assert_eq!(
            svc.effective_role(Uuid::new_v4(), org).await.unwrap(),
            None
        );
    }
}
