use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::require_permission;
use crate::authz::{Action, Resource, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::OrganizationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// POST /api/orgs - any authenticated user may found an organization and
/// becomes its active owner.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<Json<Value>, ApiError> {
    let service = OrganizationService::new(state.pool.clone());
    let organization = service.create(&payload.name, user.user_id).await?;

    Ok(Json(json!({ "success": true, "data": organization })))
}

/// GET /api/orgs - organizations the caller actively belongs to.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let service = OrganizationService::new(state.pool.clone());
    let organizations = service.list_for_user(user.user_id).await?;

    Ok(Json(json!({ "success": true, "data": organizations })))
}

/// GET /api/orgs/:org_id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Organization).await?;

    let service = OrganizationService::new(state.pool.clone());
    let organization = service.get(org_id).await?;

    Ok(Json(json!({ "success": true, "data": organization })))
}

/// PUT /api/orgs/:org_id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Update, Resource::Organization).await?;

    let service = OrganizationService::new(state.pool.clone());
    let organization = service.update_name(org_id, &payload.name).await?;

    Ok(Json(json!({ "success": true, "data": organization })))
}

/// DELETE /api/orgs/:org_id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Delete, Resource::Organization).await?;

    let service = OrganizationService::new(state.pool.clone());
    service.delete(org_id).await?;

    Ok(Json(json!({ "success": true, "data": { "deleted": org_id } })))
}

/// GET /api/orgs/:org_id/members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Membership).await?;

    let service = OrganizationService::new(state.pool.clone());
    let members = service.list_members(org_id).await?;

    Ok(Json(json!({ "success": true, "data": members })))
}

/// POST /api/orgs/:org_id/members - invite a user. The invitation is a
/// pending membership carrying the offered organization-scoped role.
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Create, Resource::Membership).await?;

    let role = match Role::parse(&payload.role) {
        Some(role @ (Role::Owner | Role::Member)) => role,
        _ => {
            return Err(ApiError::validation_error(
                "Role must be one of: owner, member",
                None,
            ))
        }
    };

    let service = OrganizationService::new(state.pool.clone());
    let invited = service.invite(org_id, payload.user_id, role).await?;

    Ok(Json(json!({ "success": true, "data": invited })))
}

/// PUT /api/orgs/:org_id/members/accept - the invited user activates their
/// own pending membership. No permission check: pending members cannot hold
/// any grant yet.
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let service = OrganizationService::new(state.pool.clone());
    let membership = service.accept_invite(org_id, user.user_id).await?;

    Ok(Json(json!({ "success": true, "data": membership })))
}

/// DELETE /api/orgs/:org_id/members/:user_id - remove a member. Leaving an
/// organization (removing yourself) needs no grant.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    if member_id != user.user_id {
        require_permission(&state, &user, org_id, Action::Delete, Resource::Membership).await?;
    }

    let service = OrganizationService::new(state.pool.clone());
    service.remove_member(org_id, member_id).await?;

    Ok(Json(json!({ "success": true, "data": { "removed": member_id } })))
}
