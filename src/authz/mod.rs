pub mod audit;
pub mod service;

pub use service::{AuthorizationService, AuthzError};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed role enumeration. Dev/Admin/User are global account tiers;
/// Owner/Member are organization-scoped and only ever appear on memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dev,
    Admin,
    User,
    Owner,
    Member,
}

impl Role {
    /// Parse a stored role string. Unknown values return `None`, which every
    /// caller treats as "no permission".
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "dev" => Some(Role::Dev),
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "owner" => Some(Role::Owner),
            "member" => Some(Role::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dev => "dev",
            Role::Admin => "admin",
            Role::User => "user",
            Role::Owner => "owner",
            Role::Member => "member",
        }
    }

    /// Cross-organization administrative tiers skip the membership lookup
    /// entirely; everyone else is bound by their membership role.
    pub fn is_cross_org_admin(&self) -> bool {
        matches!(self, Role::Dev | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Organization,
    Membership,
    Product,
    Category,
    Combo,
    Upload,
}

/// Caller-supplied constraints on a permission check. The only supported
/// condition is "own records only": the caller resolves the owner of the
/// record named by `resource_id` and the check passes only when it matches
/// the acting user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConditions {
    pub owner_id: Option<Uuid>,
}

impl AccessConditions {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }

    pub fn met_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Immutable role -> allowed (action, resource) mapping. Built once at
/// startup and passed by reference through the application state; never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<(Action, Resource)>>,
}

impl PermissionTable {
    /// The static grants of the product. Owners hold every capability in
    /// their organization; members run the day-to-day catalog but cannot
    /// touch organization settings or memberships.
    pub fn builtin() -> Self {
        use Action::*;
        use Resource::*;

        let mut grants: HashMap<Role, HashSet<(Action, Resource)>> = HashMap::new();

        let owner: HashSet<(Action, Resource)> = [
            (Read, Organization),
            (Update, Organization),
            (Delete, Organization),
            (Create, Membership),
            (Read, Membership),
            (Delete, Membership),
            (Create, Product),
            (Read, Product),
            (Update, Product),
            (Delete, Product),
            (Create, Category),
            (Read, Category),
            (Update, Category),
            (Delete, Category),
            (Create, Combo),
            (Read, Combo),
            (Update, Combo),
            (Delete, Combo),
            (Create, Upload),
        ]
        .into_iter()
        .collect();

        let member: HashSet<(Action, Resource)> = [
            (Read, Organization),
            (Read, Membership),
            (Create, Product),
            (Read, Product),
            (Update, Product),
            (Delete, Product),
            (Create, Category),
            (Read, Category),
            (Update, Category),
            (Delete, Category),
            (Create, Combo),
            (Read, Combo),
            (Update, Combo),
            (Delete, Combo),
            (Create, Upload),
        ]
        .into_iter()
        .collect();

        grants.insert(Role::Owner, owner);
        grants.insert(Role::Member, member);
        // Global tiers carry no per-organization grants: Dev/Admin bypass the
        // table, plain users hold nothing without a membership.
        grants.insert(Role::User, HashSet::new());

        Self { grants }
    }

    /// Membership test. Roles without an entry have no grants.
    pub fn allows(&self, role: Role, action: Action, resource: Resource) -> bool {
        self.grants
            .get(&role)
            .map(|set| set.contains(&(action, resource)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_closed() {
        assert_eq!(Role::parse("owner"), Some(Role::Owner));
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("dev"), Some(Role::Dev));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("OWNER"), None);
    }

    #[test]
    fn owner_holds_organization_capabilities_member_does_not() {
        let table = PermissionTable::builtin();
        assert!(table.allows(Role::Owner, Action::Update, Resource::Organization));
        assert!(table.allows(Role::Owner, Action::Create, Resource::Membership));
        assert!(!table.allows(Role::Member, Action::Update, Resource::Organization));
        assert!(!table.allows(Role::Member, Action::Create, Resource::Membership));
    }

    #[test]
    fn member_runs_the_catalog() {
        let table = PermissionTable::builtin();
        assert!(table.allows(Role::Member, Action::Create, Resource::Product));
        assert!(table.allows(Role::Member, Action::Delete, Resource::Combo));
        assert!(table.allows(Role::Member, Action::Create, Resource::Upload));
    }

    #[test]
    fn roles_without_grants_are_denied() {
        let table = PermissionTable::builtin();
        assert!(!table.allows(Role::User, Action::Read, Resource::Product));
        // Dev/Admin are absent from the table by design; their access comes
        // from the service-level bypass, not from grants.
        assert!(!table.allows(Role::Dev, Action::Read, Resource::Product));
        assert!(!table.allows(Role::Admin, Action::Read, Resource::Product));
    }

    #[test]
    fn conditions_match_only_the_owner() {
        let me = uuid::Uuid::new_v4();
        let someone_else = uuid::Uuid::new_v4();
        let cond = AccessConditions::owned_by(me);
        assert!(cond.met_by(me));
        assert!(!cond.met_by(someone_else));
        assert!(!AccessConditions::default().met_by(me));
    }
}
