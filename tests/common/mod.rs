//! Shared fixtures for integration tests: a canned configuration, an
//! in-memory auth provider, and an in-memory tenant directory.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Response};
use chrono::Utc;
use serde_json::Value;

use aialpha_backend::app::build_router;
use aialpha_backend::config::{
    DatabaseConfig, Environment, EnvironmentConfig, LogFormat, LogLevel, LoggingConfig,
    SupabaseConfig,
};
use aialpha_backend::error::ApiError;
use aialpha_backend::handlers::AppState;
use aialpha_backend::services::auth::{
    AuthProvider, AuthSession, AuthUser, SignInResult, SignupMetadata, UserContext,
};
use aialpha_backend::services::tenant::{Tenant, TenantDirectory};

pub const VALID_TOKEN: &str = "valid-token";
pub const TENANT_ID: &str = "11111111-2222-3333-4444-555555555555";

pub fn test_config(environment: Environment) -> EnvironmentConfig {
    EnvironmentConfig {
        environment,
        port: 3001,
        supabase: SupabaseConfig {
            url: "https://project.supabase.co".to_string(),
            anon_key: "anon-key".to_string(),
            service_role_key: "service-role-key".to_string(),
        },
        jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        allowed_origins: Vec::new(),
        database: DatabaseConfig {
            pool_size: 10,
            timeout_ms: 30_000,
        },
        logging: LoggingConfig {
            level: LogLevel::Error,
            format: LogFormat::Json,
        },
    }
}

pub fn test_user_context() -> UserContext {
    UserContext {
        user_id: "user-1".to_string(),
        email: "user@example.com".to_string(),
        tenant_id: TENANT_ID.to_string(),
        tenant_schema: "acme".to_string(),
        role: "member".to_string(),
    }
}

/// Auth provider that accepts a single fixed credential pair and one
/// fixed access token.
#[derive(Default)]
pub struct FakeAuth {
    /// When set, `verify` succeeds with this context for VALID_TOKEN.
    pub context: Option<UserContext>,
    pub sign_out_fails: bool,
}

impl FakeAuth {
    pub fn with_context() -> Self {
        Self {
            context: Some(test_user_context()),
            sign_out_fails: false,
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ApiError> {
        if email == "user@example.com" && password == "correct-password" {
            Ok(SignInResult {
                user: AuthUser {
                    id: "user-1".to_string(),
                    email: email.to_string(),
                },
                session: Some(AuthSession {
                    access_token: VALID_TOKEN.to_string(),
                    refresh_token: Some("refresh".to_string()),
                    expires_in: Some(3600),
                }),
            })
        } else {
            Err(ApiError::operational("Invalid login credentials", 400))
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _metadata: SignupMetadata,
    ) -> Result<SignInResult, ApiError> {
        Ok(SignInResult {
            user: AuthUser {
                id: "new-user".to_string(),
                email: email.to_string(),
            },
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        if self.sign_out_fails {
            Err(ApiError::operational("provider unavailable", 500))
        } else {
            Ok(())
        }
    }

    async fn verify(&self, token: &str) -> Result<UserContext, ApiError> {
        match &self.context {
            Some(context) if token == VALID_TOKEN => Ok(context.clone()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

pub fn make_tenant(id: &str, schema_name: &str) -> Tenant {
    let now = Utc::now();
    Tenant {
        id: id.to_string(),
        name: "Acme".to_string(),
        schema_name: schema_name.to_string(),
        created_at: now,
        updated_at: now,
        is_active: true,
    }
}

/// In-memory tenant directory.
#[derive(Default)]
pub struct FakeDirectory {
    pub tenants: Mutex<Vec<Tenant>>,
    pub fail_admin_creation: bool,
}

impl FakeDirectory {
    pub fn with_tenant(tenant: Tenant) -> Self {
        let directory = Self::default();
        directory.tenants.lock().unwrap().push(tenant);
        directory
    }
}

#[async_trait]
impl TenantDirectory for FakeDirectory {
    async fn find_by_id(&self, tenant_id: &str) -> Result<Option<Tenant>, ApiError> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == tenant_id)
            .cloned())
    }

    async fn find_by_schema_name(&self, schema_name: &str) -> Result<Option<Tenant>, ApiError> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.schema_name == schema_name)
            .cloned())
    }

    async fn insert(&self, name: &str, schema_name: &str) -> Result<Tenant, ApiError> {
        let mut tenant = make_tenant(&format!("tenant-{schema_name}"), schema_name);
        tenant.name = name.to_string();
        self.tenants.lock().unwrap().push(tenant.clone());
        Ok(tenant)
    }

    async fn delete(&self, tenant_id: &str) -> Result<(), ApiError> {
        self.tenants.lock().unwrap().retain(|t| t.id != tenant_id);
        Ok(())
    }

    async fn provision_schema(&self, _schema_name: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn create_admin_user(
        &self,
        _tenant: &Tenant,
        _email: &str,
        _password: &str,
    ) -> Result<String, ApiError> {
        if self.fail_admin_creation {
            Err(ApiError::operational("provider rejected user", 500))
        } else {
            Ok("admin-user-1".to_string())
        }
    }
}

pub fn build_app(environment: Environment, auth: FakeAuth, directory: FakeDirectory) -> Router {
    let state = AppState::new(
        test_config(environment),
        Arc::new(auth),
        Arc::new(directory),
    );
    build_router(state)
}

/// Default app: test environment, valid token wired, no tenants.
pub fn default_app() -> Router {
    build_app(Environment::Test, FakeAuth::with_context(), FakeDirectory::default())
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
