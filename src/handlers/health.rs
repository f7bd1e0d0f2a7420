//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::Json;
use serde::Serialize;

use crate::response::ApiResponse;

/// Service name reported in health payloads and log metadata.
pub const SERVICE_NAME: &str = "aialpha-backend";

/// Health check payload
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
}

pub fn current_status() -> HealthStatus {
    HealthStatus {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
    }
}

/// Health check handler
///
/// Returns 200 OK with the health payload in the canonical envelope.
pub async fn handler() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok("Service is healthy", current_status()))
}
