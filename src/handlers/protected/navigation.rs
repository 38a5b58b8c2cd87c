use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::authz::Role;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::navigation::filter_navigation_by_role;
use crate::AppState;

/// GET /api/navigation - sidebar filtered by the caller's global role.
///
/// The role is re-read from the directory rather than trusted from the
/// token, so a demoted account loses its menu immediately.
pub async fn global_navigation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let account = state
        .directory
        .find_user(user.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Directory lookup failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?
        .ok_or_else(|| ApiError::forbidden("Unknown user"))?;

    let role = Role::parse(&account.role).ok_or_else(|| ApiError::forbidden("Unknown role"))?;

    let filtered = filter_navigation_by_role(&state.navigation, role);
    Ok(Json(json!({ "success": true, "data": filtered })))
}

/// GET /api/orgs/:org_id/navigation - sidebar filtered by the caller's
/// effective role inside the organization.
pub async fn organization_navigation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let role = state
        .authz
        .effective_role(user.user_id, org_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("Not a member of this organization"))?;

    let filtered = filter_navigation_by_role(&state.navigation, role);
    Ok(Json(json!({ "success": true, "data": filtered })))
}
