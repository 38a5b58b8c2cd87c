use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod authz;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod navigation;
pub mod services;
pub mod storage;

use authz::AuthorizationService;
use database::directory::DirectoryState;
use crate::middleware::jwt_auth_middleware;
use navigation::NavigationTree;
use storage::StorageState;

/// Shared application state, passed by reference to every handler.
///
/// The permission table lives inside the authorization service and the
/// navigation tree is built once at startup; neither is mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub directory: DirectoryState,
    pub authz: Arc<AuthorizationService>,
    pub navigation: Arc<NavigationTree>,
    pub storage: StorageState,
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(state: &AppState) -> DirectoryState {
        state.directory.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(state: &AppState) -> StorageState {
        state.storage.clone()
    }
}

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected API (bearer token required)
        .merge(protected_routes())
        // Restricted API (bearer token + global-role checks in handlers)
        .merge(restricted_routes())
        .with_state(state)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn protected_routes() -> Router<AppState> {
    use axum::routing::delete;
    use handlers::protected::{categories, combos, navigation, organizations, products, uploads};

    Router::new()
        // Sidebar navigation, filtered for the caller
        .route("/api/navigation", get(navigation::global_navigation))
        .route("/api/orgs/:org_id/navigation", get(navigation::organization_navigation))
        // Organizations and memberships
        .route("/api/orgs", get(organizations::list_mine).post(organizations::create))
        .route(
            "/api/orgs/:org_id",
            get(organizations::show)
                .put(organizations::update)
                .delete(organizations::remove),
        )
        .route(
            "/api/orgs/:org_id/members",
            get(organizations::list_members).post(organizations::invite_member),
        )
        .route("/api/orgs/:org_id/members/accept", put(organizations::accept_invite))
        .route("/api/orgs/:org_id/members/:user_id", delete(organizations::remove_member))
        // Product catalog
        .route(
            "/api/orgs/:org_id/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/orgs/:org_id/products/:id",
            get(products::show).put(products::update).delete(products::remove),
        )
        .route("/api/orgs/:org_id/products/:id/inventory", put(products::adjust_inventory))
        // Categories
        .route(
            "/api/orgs/:org_id/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/orgs/:org_id/categories/:id",
            put(categories::update).delete(categories::remove),
        )
        // Combos
        .route("/api/orgs/:org_id/combos", get(combos::list).post(combos::create))
        .route(
            "/api/orgs/:org_id/combos/:id",
            get(combos::show).put(combos::update).delete(combos::remove),
        )
        // Presigned uploads
        .route("/api/orgs/:org_id/uploads/presign", post(uploads::presign))
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
}

fn restricted_routes() -> Router<AppState> {
    use handlers::restricted::{audit, impersonate};

    Router::new()
        .route("/api/admin/impersonate", post(impersonate::impersonate_post))
        .route("/api/admin/audit", get(audit::audit_get))
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
}
