//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" or "error"
    pub status: String,
    /// "connected" or "disconnected"
    pub database: String,
    /// Version of the service
    pub version: String,
    /// Reason of the failure, without internal details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Health check endpoint (queries the database on every call)
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 500, description = "Database is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();

    match state.services.health.check_database().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "connected".to_string(),
                version,
                detail: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            let detail = match e {
                AppError::StorageUnavailable(_) => "database unreachable",
                _ => "database check failed",
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "error".to_string(),
                    database: "disconnected".to_string(),
                    version,
                    detail: Some(detail.to_string()),
                }),
            )
        }
    }
}
