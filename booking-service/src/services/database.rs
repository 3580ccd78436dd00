use crate::config::MongoConfig;
use crate::models::StatusCheck;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{ClientOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::sync::Mutex;

/// Persistence for status-check pings.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn insert(&self, check: &StatusCheck) -> Result<(), AppError>;

    /// Newest first, at most `limit` records.
    async fn list(&self, limit: i64) -> Result<Vec<StatusCheck>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoStatusStore {
    client: MongoClient,
    db: Database,
}

impl MongoStatusStore {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Invalid MongoDB URI: {}", e);
            AppError::from(e)
        })?;
        // The URI can carry credentials, so only hosts are logged.
        let hosts = options
            .hosts
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join(",");
        tracing::info!(hosts = %hosts, database = %config.database, "Connecting to MongoDB");
        options.app_name = Some("booking-service".to_string());
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client for {}: {}", hosts, e);
            AppError::from(e)
        })?;
        let db = client.database(&config.database);

        let store = Self { client, db };
        store.health_check().await?;

        tracing::info!(database = %config.database, "Successfully connected to MongoDB database");
        Ok(store)
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for booking-service");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("status_check_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.status_checks()
            .create_index(id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create status check id index: {}", e);
                AppError::from(e)
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub fn status_checks(&self) -> Collection<StatusCheck> {
        self.db.collection("status_checks")
    }

    /// Closes pooled connections and stops background monitoring.
    pub async fn shutdown(self) {
        tracing::info!("Closing MongoDB client");
        self.client.shutdown().await;
    }
}

#[async_trait]
impl StatusStore for MongoStatusStore {
    async fn insert(&self, check: &StatusCheck) -> Result<(), AppError> {
        self.status_checks()
            .insert_one(check, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert status check: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<StatusCheck>, AppError> {
        // ObjectIds grow with insertion time, so this is newest first.
        let find_options = FindOptions::builder()
            .projection(doc! { "_id": 0 })
            .sort(doc! { "_id": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .status_checks()
            .find(doc! {}, find_options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list status checks: {}", e);
                AppError::from(e)
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect status checks: {}", e);
            AppError::from(e)
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

/// Process-local store, used in tests.
pub struct MemoryStatusStore {
    checks: Mutex<Vec<StatusCheck>>,
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self {
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.checks.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn insert(&self, check: &StatusCheck) -> Result<(), AppError> {
        self.checks
            .lock()
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Status store mutex poisoned: {}", e))
            })?
            .push(check.clone());
        Ok(())
    }

    async fn list(&self, limit: i64) -> Result<Vec<StatusCheck>, AppError> {
        let checks = self
            .checks
            .lock()
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Status store mutex poisoned: {}", e))
            })?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(checks.iter().rev().take(limit).cloned().collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
