//! HTTP request handlers

use std::sync::Arc;

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

use crate::config::EnvironmentConfig;
use crate::response::ApiResponse;
use crate::services::auth::AuthProvider;
use crate::services::tenant::{TenantDirectory, TenantService};

pub mod auth;
pub mod health;

/// Application state shared across all handlers
///
/// Holds the configuration snapshot and the external collaborators.
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<EnvironmentConfig>,
    auth: Arc<dyn AuthProvider>,
    tenants: Arc<TenantService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            tenants: Arc::new(TenantService::new(directory)),
        }
    }

    /// Get reference to the configuration snapshot
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Get reference to the authentication provider
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Get reference to the tenant service
    pub fn tenants(&self) -> &TenantService {
        &self.tenants
    }
}

/// Fallback for unmatched routes: the canonical 404 envelope.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Not Found", 404)),
    )
        .into_response()
}
