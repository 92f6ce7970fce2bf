use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use kanban_core::{AppConfig, OrderingMode};
use kanban_persistence::{CapabilityFlags, SqliteStore};
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState, SharedState};

/// Settings for [`start_server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub ordering: OrderingMode,
    pub default_page_size: u32,
    /// Bring the schema up to date before serving.
    pub run_migrations: bool,
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            database_path: config.database_path.clone(),
            ordering: config.ordering,
            default_page_size: config.effective_page_size(),
            run_migrations: true,
        }
    }
}

/// Build the full application router with request tracing.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database, resolve capabilities and serve until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if let Some(parent) = config.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let store = Arc::new(SqliteStore::new(&config.database_path));
    if config.run_migrations {
        store
            .migrate(None)
            .await
            .context("Failed to migrate database")?;
    }

    let capabilities = Arc::new(
        CapabilityFlags::resolve(store.as_ref(), config.ordering)
            .await
            .context("Failed to inspect database schema")?,
    );
    let state = Arc::new(AppState::new(
        store.clone(),
        capabilities,
        config.default_page_size,
    ));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Requirement board API listening on http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use kanban_persistence::{InMemoryStore, StoreCapabilities};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Arc::new(InMemoryStore::new());
        let flags = Arc::new(CapabilityFlags::new(StoreCapabilities::FULL));
        build_router(Arc::new(AppState::new(store, flags, 20)))
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let req = Request::builder()
            .uri("/api/boards")
            .body(Body::empty())
            .unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig {
            default_page_size: 0,
            ..AppConfig::default()
        };
        let config = ServerConfig::from(&app);
        assert_eq!(config.default_page_size, 1);
        assert!(config.run_migrations);
    }
}
