use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::require_permission;
use crate::authz::{Action, Resource};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::combo_service::{CreateComboInput, UpdateComboInput};
use crate::services::ComboService;
use crate::AppState;

/// POST /api/orgs/:org_id/combos
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateComboInput>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Create, Resource::Combo).await?;

    let service = ComboService::new(state.pool.clone());
    let (combo, items) = service.create(org_id, payload).await?;

    Ok(Json(json!({ "success": true, "data": { "combo": combo, "items": items } })))
}

/// GET /api/orgs/:org_id/combos
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Combo).await?;

    let service = ComboService::new(state.pool.clone());
    let combos = service.list(org_id).await?;

    Ok(Json(json!({ "success": true, "data": combos })))
}

/// GET /api/orgs/:org_id/combos/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, combo_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Combo).await?;

    let service = ComboService::new(state.pool.clone());
    let (combo, items) = service.get(org_id, combo_id).await?;

    Ok(Json(json!({ "success": true, "data": { "combo": combo, "items": items } })))
}

/// PUT /api/orgs/:org_id/combos/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, combo_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateComboInput>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Update, Resource::Combo).await?;

    let service = ComboService::new(state.pool.clone());
    let (combo, items) = service.update(org_id, combo_id, payload).await?;

    Ok(Json(json!({ "success": true, "data": { "combo": combo, "items": items } })))
}

/// DELETE /api/orgs/:org_id/combos/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, combo_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Delete, Resource::Combo).await?;

    let service = ComboService::new(state.pool.clone());
    service.delete(org_id, combo_id).await?;

    Ok(Json(json!({ "success": true, "data": { "deleted": combo_id } })))
}
