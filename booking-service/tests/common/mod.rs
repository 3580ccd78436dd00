#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use booking_service::config::{
    AllowedOrigins, BookingConfig, CorsConfig, MongoConfig, SmtpConfig,
};
use booking_service::services::{MemoryStatusStore, MockMailRelay, StatusStore};
use booking_service::{build_router, AppState};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub fn test_config(with_credentials: bool) -> BookingConfig {
    BookingConfig {
        common: CoreConfig { port: 0 },
        service_name: "booking-service".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: format!("booking_test_{}", uuid::Uuid::new_v4()),
            connect_timeout: Duration::from_secs(2),
        },
        smtp: SmtpConfig {
            host: "smtp.test.local".to_string(),
            port: 465,
            user: with_credentials.then(|| "relay@themaplin.com".to_string()),
            password: with_credentials.then(|| Secret::new("test-password".to_string())),
            timeout: Duration::from_secs(5),
        },
        cors: CorsConfig {
            allowed_origins: AllowedOrigins::Any,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub relay: Arc<MockMailRelay>,
    pub store: Option<Arc<MemoryStatusStore>>,
}

impl TestApp {
    /// Credentials set, in-memory store, relay that accepts everything.
    pub fn spawn() -> Self {
        Self::build(test_config(true), MockMailRelay::new(), true)
    }

    pub fn build(config: BookingConfig, relay: MockMailRelay, with_store: bool) -> Self {
        let relay = Arc::new(relay);
        let store = with_store.then(|| Arc::new(MemoryStatusStore::new()));

        let state = AppState {
            config: Arc::new(config),
            store: store
                .clone()
                .map(|s| s as Arc<dyn StatusStore>),
            mail_relay: relay.clone(),
        };

        TestApp {
            router: build_router(state),
            relay,
            store,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}
