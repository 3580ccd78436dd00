//! Application startup and lifecycle management.
//!
//! Builds the HTTP router, wires the status store and mail relay into shared
//! state, and runs the server until a shutdown signal arrives.

use crate::config::{AllowedOrigins, BookingConfig, MongoConfig};
use crate::handlers;
use crate::services::{MailRelay, MongoStatusStore, SmtpRelay, StatusStore};
use axum::{
    http::{HeaderValue, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BookingConfig>,
    /// `None` when storage could not be reached at startup.
    pub store: Option<Arc<dyn StatusStore>>,
    pub mail_relay: Arc<dyn MailRelay>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/booking", post(handlers::create_booking))
        .route(
            "/api/status",
            post(handlers::create_status_check).get(handlers::list_status_checks),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    match origins {
        // Wildcard origins cannot be combined with credentials.
        AllowedOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        AllowedOrigins::List(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    mongo: Option<MongoStatusStore>,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// An unreachable MongoDB does not abort startup: the service runs without
    /// a status store and reports itself as not ready.
    pub async fn build(config: BookingConfig) -> Result<Self, AppError> {
        let mongo = connect_store(&config.mongodb).await;

        if config.smtp.credentials().is_none() {
            tracing::warn!("SMTP_USER/SMTP_PASSWORD not set; booking requests will be rejected");
        }

        let store = mongo
            .clone()
            .map(|store| Arc::new(store) as Arc<dyn StatusStore>);
        let mail_relay: Arc<dyn MailRelay> = Arc::new(SmtpRelay::new(&config.smtp));

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Booking service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState {
                config: Arc::new(config),
                store,
                mail_relay,
            },
            mongo,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM, then close the MongoDB client.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(mongo) = self.mongo {
            mongo.shutdown().await;
        }

        result.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            e
        })
    }
}

/// Connects and prepares the status store. Any failure leaves the service
/// running without one.
async fn connect_store(config: &MongoConfig) -> Option<MongoStatusStore> {
    let store = match MongoStatusStore::connect(config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "MongoDB unavailable; status checks will not be persisted"
            );
            return None;
        }
    };

    if let Err(e) = store.initialize_indexes().await {
        tracing::warn!(
            error = %e,
            "MongoDB index setup failed; status checks will not be persisted"
        );
        store.shutdown().await;
        return None;
    }

    Some(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusCheck;
    use std::time::Duration;

    fn mongo_config(uri: String) -> MongoConfig {
        MongoConfig {
            uri,
            database: format!("booking_startup_{}", uuid::Uuid::new_v4()),
            connect_timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn unreachable_store_is_skipped() {
        let config = mongo_config("mongodb://127.0.0.1:1".to_string());

        assert!(connect_store(&config).await.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires MongoDB (set TEST_MONGODB_URI)"]
    async fn failed_index_setup_is_skipped() {
        let uri = std::env::var("TEST_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let config = mongo_config(uri);

        // Duplicate ids make the unique index impossible to build.
        let seed = MongoStatusStore::connect(&config).await.unwrap();
        let check = StatusCheck::new("dup".to_string());
        seed.status_checks().insert_one(&check, None).await.unwrap();
        seed.status_checks().insert_one(&check, None).await.unwrap();

        assert!(connect_store(&config).await.is_none());

        seed.status_checks().drop(None).await.unwrap();
        seed.shutdown().await;
    }
}
