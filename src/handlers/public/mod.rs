use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Backoffice API",
            "version": version,
            "description": "Multi-tenant back-office API: organizations, catalog, combos, role-based access",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "navigation": "/api/navigation, /api/orgs/:org_id/navigation (protected)",
                "organizations": "/api/orgs[/:org_id] (protected)",
                "members": "/api/orgs/:org_id/members[/:user_id] (protected)",
                "products": "/api/orgs/:org_id/products[/:id] (protected)",
                "categories": "/api/orgs/:org_id/categories[/:id] (protected)",
                "combos": "/api/orgs/:org_id/combos[/:id] (protected)",
                "uploads": "/api/orgs/:org_id/uploads/presign (protected)",
                "admin": "/api/admin/impersonate (restricted)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
