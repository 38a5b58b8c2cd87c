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
use crate::services::catalog_service::{CreateProductInput, UpdateProductInput};
use crate::services::CatalogService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustInventoryRequest {
    pub delta: i32,
}

/// POST /api/orgs/:org_id/products
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateProductInput>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Create, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    let product = service.create_product(org_id, payload).await?;

    Ok(Json(json!({ "success": true, "data": product })))
}

/// GET /api/orgs/:org_id/products
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    let products = service.list_products(org_id).await?;

    Ok(Json(json!({ "success": true, "data": products })))
}

/// GET /api/orgs/:org_id/products/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Read, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    let product = service.get_product(org_id, product_id).await?;

    Ok(Json(json!({ "success": true, "data": product })))
}

/// PUT /api/orgs/:org_id/products/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Update, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    let product = service.update_product(org_id, product_id, payload).await?;

    Ok(Json(json!({ "success": true, "data": product })))
}

/// DELETE /api/orgs/:org_id/products/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Delete, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    service.delete_product(org_id, product_id).await?;

    Ok(Json(json!({ "success": true, "data": { "deleted": product_id } })))
}

/// PUT /api/orgs/:org_id/products/:id/inventory - apply a stock delta.
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((org_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdjustInventoryRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Update, Resource::Product).await?;

    let service = CatalogService::new(state.pool.clone());
    let product = service
        .adjust_inventory(org_id, product_id, payload.delta)
        .await?;

    Ok(Json(json!({ "success": true, "data": product })))
}
