//! Supabase-backed collaborators
//!
//! Thin REST wrappers implementing the `AuthProvider` and
//! `TenantDirectory` seams against Supabase's auth (`/auth/v1`) and
//! PostgREST (`/rest/v1`) surfaces. No business logic lives here:
//! faults are mapped onto the error taxonomy and everything else is
//! plumbing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::config::SupabaseConfig;
use crate::error::ApiError;
use crate::services::auth::{
    AuthProvider, AuthSession, AuthUser, SignInResult, SignupMetadata, UserContext,
};
use crate::services::tenant::{Tenant, TenantDirectory};

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.base_url)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{path}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: UserRow,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    tenant_schema: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "msg", alias = "message", alias = "error_description")]
    detail: Option<String>,
}

/// Extracts the provider's own error message, falling back to a
/// generic one, without ever surfacing transport internals.
async fn provider_message(response: reqwest::Response, fallback: &str) -> String {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| fallback.to_string())
}

fn transport_fault(err: reqwest::Error) -> ApiError {
    ApiError::Internal(format!("supabase request failed: {err}"))
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ApiError> {
        let response = self
            .http
            .post(self.auth_url("/token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            let message = provider_message(response, "Invalid login credentials").await;
            return Err(ApiError::operational(message, 401));
        }

        let token: TokenResponse = response.json().await.map_err(transport_fault)?;
        Ok(SignInResult {
            user: AuthUser {
                id: token.user.id,
                email: token.user.email,
            },
            session: Some(AuthSession {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                expires_in: token.expires_in,
            }),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignupMetadata,
    ) -> Result<SignInResult, ApiError> {
        let response = self
            .http
            .post(self.auth_url("/signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": {
                    "tenant_id": metadata.tenant_id,
                    "tenant_schema": metadata.tenant_schema,
                    "tenant_name": metadata.tenant_name,
                },
            }))
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            let message = provider_message(response, "Signup failed").await;
            return Err(ApiError::operational(message, 400));
        }

        // Supabase returns either the bare user (confirmation pending)
        // or a session object with the user nested under "user".
        let body: serde_json::Value = response.json().await.map_err(transport_fault)?;
        let user_value = body.get("user").cloned().unwrap_or_else(|| body.clone());
        let user: UserRow = serde_json::from_value(user_value)
            .map_err(|_| ApiError::Internal("signup response missing user".to_string()))?;

        let session = body
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .map(|access_token| AuthSession {
                access_token: access_token.to_string(),
                refresh_token: body
                    .get("refresh_token")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                expires_in: body.get("expires_in").and_then(serde_json::Value::as_u64),
            });

        Ok(SignInResult {
            user: AuthUser {
                id: user.id,
                email: user.email,
            },
            session,
        })
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.auth_url("/logout"))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(transport_fault)?;

        if response.status().is_success() || response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(ApiError::operational("Logout failed", 500))
        }
    }

    async fn verify(&self, token: &str) -> Result<UserContext, ApiError> {
        let response = self
            .http
            .get(self.auth_url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            return Err(ApiError::Unauthorized);
        }

        let user: UserRow = response.json().await.map_err(transport_fault)?;
        Ok(UserContext {
            user_id: user.id,
            email: user.email,
            tenant_id: user.app_metadata.tenant_id.unwrap_or_default(),
            tenant_schema: user.app_metadata.tenant_schema.unwrap_or_default(),
            role: user
                .app_metadata
                .role
                .or(user.role)
                .unwrap_or_else(|| "user".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TenantRow {
    id: String,
    name: String,
    schema_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            schema_name: row.schema_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
        }
    }
}

impl SupabaseClient {
    async fn select_tenant(&self, filter: &str) -> Result<Option<Tenant>, ApiError> {
        let response = self
            .http
            .get(self.rest_url(&format!("/tenants?select=*&{filter}")))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), filter, "tenant lookup failed");
            return Err(ApiError::operational("Failed to retrieve tenant", 500));
        }

        let mut rows: Vec<TenantRow> = response.json().await.map_err(transport_fault)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0).into())
        })
    }
}

#[async_trait]
impl TenantDirectory for SupabaseClient {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, ApiError> {
        self.select_tenant(&format!("id=eq.{tenant_id}")).await
    }

    async fn find_by_schema_name(&self, schema_name: &str) -> Result<Option<Tenant>, ApiError> {
        self.select_tenant(&format!("schema_name=eq.{schema_name}"))
            .await
    }

    async fn insert(&self, name: &str, schema_name: &str) -> Result<Tenant, ApiError> {
        let response = self
            .http
            .post(self.rest_url("/tenants"))
            .header("apikey", &self.service_role_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "name": name,
                "schema_name": schema_name,
                "is_active": true,
            }))
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), schema_name, "tenant insert failed");
            return Err(ApiError::operational("Failed to create tenant", 500));
        }

        let mut rows: Vec<TenantRow> = response.json().await.map_err(transport_fault)?;
        if rows.is_empty() {
            return Err(ApiError::Internal("tenant insert returned no rows".to_string()));
        }
        Ok(rows.remove(0).into())
    }

    async fn delete(&self, tenant_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.rest_url(&format!("/tenants?id=eq.{tenant_id}")))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(transport_fault)?;

        if response.status().is_success() {
            Ok(())
        } else {
            tracing::error!(status = %response.status(), tenant_id, "tenant delete failed");
            Err(ApiError::operational("Failed to delete tenant", 500))
        }
    }

    async fn provision_schema(&self, schema_name: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.rest_url("/rpc/create_tenant_schema"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({ "schema_name": schema_name }))
            .send()
            .await
            .map_err(transport_fault)?;

        if response.status().is_success() {
            Ok(())
        } else {
            tracing::error!(status = %response.status(), schema_name, "schema provisioning failed");
            Err(ApiError::operational("Failed to create tenant schema", 500))
        }
    }

    async fn create_admin_user(
        &self,
        tenant: &Tenant,
        email: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.auth_url("/admin/users"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "app_metadata": {
                    "tenant_id": tenant.id,
                    "tenant_schema": tenant.schema_name,
                    "role": "admin",
                },
                "user_metadata": { "tenant_name": tenant.name },
            }))
            .send()
            .await
            .map_err(transport_fault)?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), email, "admin user creation failed");
            return Err(ApiError::operational("Failed to create admin user", 500));
        }

        let user: UserRow = response.json().await.map_err(transport_fault)?;
        Ok(user.id)
    }
}
