use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::authz::{audit::ImpersonationAudit, Role};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

/// GET /api/admin/audit - recent impersonation audit entries, newest first.
/// Dev-only; the audit trail is the counterpart of the impersonation grant.
pub async fn audit_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Value>, ApiError> {
    let actor = state
        .directory
        .find_user(user.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Directory lookup failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?
        .ok_or_else(|| ApiError::forbidden("Unknown user"))?;

    if Role::parse(&actor.role) != Some(Role::Dev) {
        return Err(ApiError::forbidden("Audit log is dev-only"));
    }

    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let entries = sqlx::query_as::<_, ImpersonationAudit>(
        r#"
        SELECT id, actor_id, target_id, reason, created_at
        FROM impersonation_audit
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": entries })))
}
