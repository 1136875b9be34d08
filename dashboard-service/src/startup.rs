//! Application startup and lifecycle management.

use crate::actions::{DeleteMode, InvoiceActions};
use crate::config::DashboardConfig;
use crate::handlers::{health, invoices};
use crate::services::{init_metrics, InvoiceStore, MockInvoiceStore, PathCache, PgInvoiceStore};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: DashboardConfig,
    pub store: Arc<dyn InvoiceStore>,
    pub cache: Arc<PathCache>,
    pub actions: InvoiceActions,
}

impl AppState {
    pub fn new(config: DashboardConfig, store: Arc<dyn InvoiceStore>) -> Self {
        let cache = Arc::new(PathCache::new());
        let actions = InvoiceActions::new(store.clone(), cache.clone(), config.delete_mode);
        Self {
            config,
            store,
            cache,
            actions,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/dashboard/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/dashboard/invoices/:id/edit", post(invoices::update_invoice))
        .route("/dashboard/invoices/:id/delete", post(invoices::delete_invoice))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn connect_store(config: &DashboardConfig) -> Result<Arc<dyn InvoiceStore>, AppError> {
    let Some(url) = config.database.url.as_deref() else {
        tracing::warn!("DATABASE_URL not set - using in-memory invoice store");
        return Ok(Arc::new(MockInvoiceStore::new()));
    };

    let store = PgInvoiceStore::connect(
        url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to PostgreSQL");
        e
    })?;

    if config.run_migrations {
        store.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;
    }

    Ok(Arc::new(store))
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: DashboardConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let state = AppState::new(config.clone(), store);
        Self::build_with_state(config, state).await
    }

    /// Build around an existing state, e.g. one backed by a mock store.
    pub async fn build_with_state(
        config: DashboardConfig,
        state: AppState,
    ) -> Result<Self, AppError> {
        init_metrics();

        if config.delete_mode == DeleteMode::Disabled {
            tracing::warn!(
                "Invoice deletion is disabled: every delete request fails. \
                 Set INVOICE_DELETE_ENABLED=true to enable it"
            );
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!(http_port = http_port, "Dashboard service listener bound");

        Ok(Self {
            http_port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        let router = build_router(self.state);
        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
