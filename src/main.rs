use std::sync::Arc;

use backoffice_api::authz::{AuthorizationService, PermissionTable};
use backoffice_api::database::directory::{DirectoryState, PgDirectory};
use backoffice_api::database::DatabaseManager;
use backoffice_api::navigation::NavigationTree;
use backoffice_api::storage::{S3Storage, StorageState};
use backoffice_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = backoffice_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Backoffice API in {:?} mode", config.environment);

    let pool = DatabaseManager::pool()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    let directory: DirectoryState = Arc::new(PgDirectory::new(pool.clone()));
    let authz = Arc::new(AuthorizationService::new(
        directory.clone(),
        PermissionTable::builtin(),
    ));
    let storage: StorageState = Arc::new(S3Storage::new(&config.storage));

    let state = AppState {
        pool,
        directory,
        authz,
        navigation: Arc::new(NavigationTree::default_layout()),
        storage,
    };

    let app = app(state);

    // Allow deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Backoffice API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
