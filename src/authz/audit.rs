use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;

/// One impersonation event: who acted as whom, when, and why.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImpersonationAudit {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append an audit entry for a granted impersonation. Called by the handler
/// on the success path, after `can_impersonate` said yes and before the
/// token is returned.
pub async fn record_impersonation(
    pool: &PgPool,
    actor_id: Uuid,
    target_id: Uuid,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    tracing::info!(
        "Impersonation granted: actor={} target={} reason={:?}",
        actor_id,
        target_id,
        reason
    );

    if !config::config().security.enable_audit_logging {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO impersonation_audit (id, actor_id, target_id, reason, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor_id)
    .bind(target_id)
    .bind(reason)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
