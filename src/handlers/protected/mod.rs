pub mod categories;
pub mod combos;
pub mod navigation;
pub mod organizations;
pub mod products;
pub mod uploads;

use uuid::Uuid;

use crate::authz::{Action, Resource};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Gate a handler on a permission-table decision. "No" is always a 403; the
/// reasons (no membership, pending, missing grant) are deliberately not
/// distinguished for the client.
pub(crate) async fn require_permission(
    state: &AppState,
    user: &AuthUser,
    organization_id: Uuid,
    action: Action,
    resource: Resource,
) -> Result<(), ApiError> {
    let allowed = state
        .authz
        .has_permission(user.user_id, organization_id, action, resource, None, None)
        .await?;

    if !allowed {
        return Err(ApiError::forbidden("Insufficient permissions"));
    }

    Ok(())
}
