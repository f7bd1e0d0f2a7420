//! Authentication provider seam
//!
//! The actual identity provider (sign-in, sign-up, token issuance) is
//! an external collaborator. This module defines the trait the rest of
//! the backend programs against and the value types that cross it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Authenticated caller identity, attached to requests after token
/// verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: String,
    pub email: String,
    pub tenant_id: String,
    pub tenant_schema: String,
    pub role: String,
}

/// Provider-side user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Issued session tokens. Absent when the provider defers issuance
/// (e.g. signup pending email verification).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct SignInResult {
    pub user: AuthUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<AuthSession>,
}

/// Tenant linkage recorded on the user at signup time.
#[derive(Debug, Clone)]
pub struct SignupMetadata {
    pub tenant_id: String,
    pub tenant_schema: String,
    pub tenant_name: String,
}

/// External authentication collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, ApiError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignupMetadata,
    ) -> Result<SignInResult, ApiError>;

    async fn sign_out(&self) -> Result<(), ApiError>;

    /// Resolves an access token to the caller's context. Any failure
    /// is treated as an authentication fault by the middleware.
    async fn verify(&self, token: &str) -> Result<UserContext, ApiError>;
}
