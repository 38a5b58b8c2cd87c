use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::require_permission;
use crate::authz::{Action, Resource};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::CatalogService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// POST /api/orgs/:org_id/categories
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Create, Resource::Category).await?;

    let service = CatalogService::new(state.pool.clone());
    let category = service.create_category(org_id, &payload.name).await?;

    Ok(Json(json!({ "success": true, "data": category })))
}

/// GET /api/orgs/:org_id/categories
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Category).await?;

    let service = CatalogService::new(state.pool.clone());
    let categories = service.list_categories(org_id).await?;

    Ok(Json(json!({ "success": true, "data": categories })))
}

/// PUT /api/orgs/:org_id/categories/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, category_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Update, Resource::Category).await?;

    let service = CatalogService::new(state.pool.clone());
    let category = service
        .update_category(org_id, category_id, &payload.name)
        .await?;

    Ok(Json(json!({ "success": true, "data": category })))
}

/// DELETE /api/orgs/:org_id/categories/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Delete, Resource::Category).await?;

    let service = CatalogService::new(state.pool.clone());
    service.delete_category(org_id, category_id).await?;

    Ok(Json(json!({ "success": true, "data": { "deleted": category_id } })))
}
