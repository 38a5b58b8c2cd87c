use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::authz::{audit, Role};
use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub target_user_id: Uuid,
    pub reason: Option<String>,
}

/// POST /api/admin/impersonate - mint a short-lived token for the target
/// identity. Allowed only for the highest global tier, never against
/// yourself; every grant is audited before the token leaves the server.
pub async fn impersonate_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ImpersonateRequest>,
) -> Result<Json<Value>, ApiError> {
    let allowed = state
        .authz
        .can_impersonate(user.user_id, payload.target_user_id)
        .await?;

    if !allowed {
        return Err(ApiError::forbidden("Impersonation not permitted"));
    }

    let target = state
        .directory
        .find_user(payload.target_user_id)
        .await
        .map_err(|e| {
            tracing::error!("Directory lookup failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?
        .ok_or_else(|| ApiError::not_found("Target user not found"))?;

    let target_role =
        Role::parse(&target.role).ok_or_else(|| ApiError::forbidden("Target role unknown"))?;

    // Audit first; if the entry cannot be written the token is not issued.
    audit::record_impersonation(
        &state.pool,
        user.user_id,
        target.id,
        payload.reason.as_deref(),
    )
    .await?;

    let claims = Claims::impersonation(target.id, target_role);
    let token = generate_jwt(claims)?;
    let expires_in = config::config().security.impersonation_expiry_hours * 3600;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "expires_in": expires_in,
            "target": {
                "id": target.id,
                "name": target.name,
                "role": target.role,
            }
        }
    })))
}
