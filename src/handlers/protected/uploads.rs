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
use crate::storage::sanitize_key;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub filename: String,
    pub content_type: String,
}

/// POST /api/orgs/:org_id/uploads/presign
///
/// Object keys are namespaced per organization and carry a random segment so
/// uploads can never collide or overwrite each other.
pub async fn presign(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<PresignRequest>,
) -> Result<Json<Value>, ApiError> {
    require_permission(&state, &user, org_id, Action::Create, Resource::Upload).await?;

    if payload.content_type.trim().is_empty() {
        return Err(ApiError::validation_error("content_type is required", None));
    }

    let key = sanitize_key(&format!(
        "{}/{}/{}",
        org_id,
        Uuid::new_v4(),
        payload.filename
    ))?;

    let upload_url = state.storage.presign_upload(&key, &payload.content_type).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "key": key,
            "upload_url": upload_url,
            "content_type": payload.content_type,
        }
    })))
}
