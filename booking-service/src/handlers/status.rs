use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;

use crate::models::{StatusCheck, StatusCheckCreate, STATUS_LIST_LIMIT};
use crate::services::record_status_write;
use crate::startup::AppState;

/// Records a client ping and returns the stored record.
///
/// Without a store the record is still returned, but nothing is persisted.
#[tracing::instrument(skip(state, payload))]
pub async fn create_status_check(
    State(state): State<AppState>,
    payload: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> Result<Json<StatusCheck>, AppError> {
    let Json(input) = payload?;
    let check = StatusCheck::new(input.client_name);

    match &state.store {
        Some(store) => {
            store.insert(&check).await?;
            record_status_write(true);
            tracing::info!(id = %check.id, "Status check recorded");
        }
        None => {
            record_status_write(false);
            tracing::warn!(
                id = %check.id,
                "Status store unavailable; status check returned but not persisted"
            );
        }
    }

    Ok(Json(check))
}

#[tracing::instrument(skip(state))]
pub async fn list_status_checks(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusCheck>>, AppError> {
    let store = state.store.as_ref().ok_or_else(|| {
        tracing::warn!("Status list requested but no status store is connected");
        AppError::ServiceUnavailable
    })?;

    let checks = store.list(STATUS_LIST_LIMIT).await?;
    Ok(Json(checks))
}
