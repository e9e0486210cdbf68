//! Health check endpoint for service monitoring.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::DbLease, error::AppError, models::envelope::Envelope};

/// Health check payload.
///
/// Returns service status and database connectivity.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall service status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// Runs `SELECT 1` on the request's leased connection, so a 200 also proves
/// the pool can hand out a configured session.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "message": "Service healthy",
///   "data": { "status": "healthy", "database": "connected", "timestamp": "2025-12-21T19:00:00Z" }
/// }
/// ```
pub async fn health_check(lease: DbLease) -> Result<Json<Envelope<HealthStatus>>, AppError> {
    let mut conn = lease.lock().await?;
    sqlx::query("SELECT 1").execute(&mut **conn).await?;

    Ok(Json(Envelope::ok(
        "Service healthy",
        HealthStatus {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            timestamp: Utc::now(),
        },
    )))
}
