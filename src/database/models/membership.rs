use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PENDING: &str = "pending";

/// The binding of a user to an organization. This row is the sole authority
/// for what the user may do inside that organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationMembership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

impl OrganizationMembership {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}
