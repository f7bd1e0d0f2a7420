//! Tenant provisioning service
//!
//! Orchestrates tenant creation over the external data-store seam:
//! uniqueness check, tenant record insert, schema provisioning, admin
//! user creation, and cleanup of the tenant record when admin creation
//! fails. The store itself (tables, provisioning RPCs) is an external
//! collaborator behind `TenantDirectory`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Tenant record as stored in the public schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Payload for `POST /api/auth/tenant`, validated upstream by the
/// tenant-creation schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub name: String,
    pub schema_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Result of a successful provisioning run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProvisioned {
    pub tenant: Tenant,
    pub admin_user_id: String,
}

/// External multi-tenant data store.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, ApiError>;

    async fn find_by_schema_name(&self, schema_name: &str) -> Result<Option<Tenant>, ApiError>;

    async fn insert(&self, name: &str, schema_name: &str) -> Result<Tenant, ApiError>;

    async fn delete(&self, tenant_id: &str) -> Result<(), ApiError>;

    /// Creates the tenant's dedicated schema and its standard tables.
    async fn provision_schema(&self, schema_name: &str) -> Result<(), ApiError>;

    /// Creates the tenant's admin user in the auth subsystem and the
    /// tenant schema; returns the new user id.
    async fn create_admin_user(
        &self,
        tenant: &Tenant,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError>;
}

pub struct TenantService {
    directory: Arc<dyn TenantDirectory>,
}

impl TenantService {
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        Self { directory }
    }

    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantProvisioned, ApiError> {
        if self
            .directory
            .find_by_schema_name(&request.schema_name)
            .await?
            .is_some()
        {
            return Err(ApiError::operational("Schema name already exists", 400));
        }

        let tenant = self
            .directory
            .insert(&request.name, &request.schema_name)
            .await?;

        self.directory
            .provision_schema(&request.schema_name)
            .await?;

        let admin_user_id = match self
            .directory
            .create_admin_user(&tenant, &request.admin_email, &request.admin_password)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(
                    tenant_id = %tenant.id,
                    error = %err,
                    "admin user creation failed, rolling back tenant record"
                );
                if let Err(cleanup_err) = self.directory.delete(&tenant.id).await {
                    tracing::error!(
                        tenant_id = %tenant.id,
                        error = %cleanup_err,
                        "tenant cleanup failed"
                    );
                }
                return Err(ApiError::operational("Failed to create admin user", 500));
            }
        };

        tracing::info!(
            tenant_id = %tenant.id,
            schema_name = %tenant.schema_name,
            admin_user_id = %admin_user_id,
            "tenant created"
        );

        Ok(TenantProvisioned {
            tenant,
            admin_user_id,
        })
    }

    pub async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, ApiError> {
        self.directory.find_by_id(tenant_id).await
    }

    /// True when no existing tenant owns the schema name.
    pub async fn schema_name_available(&self, schema_name: &str) -> Result<bool, ApiError> {
        Ok(self
            .directory
            .find_by_schema_name(schema_name)
            .await?
            .is_none())
    }
}
