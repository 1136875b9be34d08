//! Common test utilities for dashboard-service integration tests.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use dashboard_service::actions::DeleteMode;
use dashboard_service::config::{DashboardConfig, DatabaseConfig};
use dashboard_service::services::{InvoiceStore, MockInvoiceStore};
use dashboard_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use service_core::config::Config as CommonConfig;
use std::sync::{Arc, Once};
use tower::util::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,dashboard_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config(delete_mode: DeleteMode) -> DashboardConfig {
    DashboardConfig {
        common: CommonConfig { port: 0 },
        service_name: "dashboard-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig::default(),
        delete_mode,
        run_migrations: false,
    }
}

/// Router plus handles on the state behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MockInvoiceStore>,
}

/// Build the router over an in-memory store.
pub fn spawn_app(delete_mode: DeleteMode) -> TestApp {
    spawn_app_with_store(delete_mode, MockInvoiceStore::recording())
}

pub fn spawn_app_with_store(delete_mode: DeleteMode, store: MockInvoiceStore) -> TestApp {
    init_tracing();

    let store = Arc::new(store);
    let state = AppState::new(
        test_config(delete_mode),
        store.clone() as Arc<dyn InvoiceStore>,
    );

    TestApp {
        router: build_router(state.clone()),
        state,
        store,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    #[allow(dead_code)]
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).expect("failed to encode form");
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    #[allow(dead_code)]
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}
