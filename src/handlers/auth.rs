//! Auth and tenant route handlers
//!
//! Bodies are validated (and transformed) by the route's validation
//! middleware before these run, so the DTOs deserialize the already
//! validated JSON. Business failures are raised as operational errors
//! and flow to the terminal error path.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::response::ApiResponse;
use crate::services::auth::{SignInResult, SignupMetadata, UserContext};
use crate::services::tenant::{CreateTenantRequest, TenantProvisioned};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSchemaNameRequest {
    pub schema_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNameAvailability {
    pub is_unique: bool,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SignInResult>>> {
    match state.auth().sign_in(&request.email, &request.password).await {
        Ok(result) => {
            tracing::info!(user_id = %result.user.id, email = %request.email, "user logged in");
            Ok(Json(ApiResponse::ok("Login successful", result)))
        }
        Err(err) => {
            tracing::warn!(email = %request.email, error = %err, "login attempt failed");
            Err(ApiError::operational("Invalid email or password", 401))
        }
    }
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignInResult>>)> {
    let tenant = state
        .tenants()
        .get_tenant(&request.tenant_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| ApiError::operational("Invalid or inactive tenant", 400))?;

    let result = state
        .auth()
        .sign_up(
            &request.email,
            &request.password,
            SignupMetadata {
                tenant_id: tenant.id.clone(),
                tenant_schema: tenant.schema_name.clone(),
                tenant_name: tenant.name.clone(),
            },
        )
        .await?;

    tracing::info!(
        user_id = %result.user.id,
        tenant_id = %tenant.id,
        "user signed up"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Signup successful. Please check your email for verification.",
            result,
        )),
    ))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    context: Option<Extension<UserContext>>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    state
        .auth()
        .sign_out()
        .await
        .map_err(|_| ApiError::operational("Logout failed", 500))?;

    if let Some(Extension(ctx)) = context {
        tracing::info!(user_id = %ctx.user_id, "user logged out");
    }
    Ok(Json(ApiResponse::ok_message("Logout successful")))
}

/// `GET /api/auth/profile`
pub async fn profile(
    context: Option<Extension<UserContext>>,
) -> ApiResult<Json<ApiResponse<UserContext>>> {
    let Extension(context) =
        context.ok_or_else(|| ApiError::operational("Authentication required", 401))?;
    Ok(Json(ApiResponse::ok(
        "Profile retrieved successfully",
        context,
    )))
}

/// `POST /api/auth/tenant`
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(request): Json<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TenantProvisioned>>)> {
    let result = state.tenants().create_tenant(request).await?;

    tracing::info!(
        tenant_id = %result.tenant.id,
        admin_user_id = %result.admin_user_id,
        "tenant created via API"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Tenant created successfully", result)),
    ))
}

/// `POST /api/auth/validate-schema-name`
pub async fn validate_schema_name(
    State(state): State<AppState>,
    Json(request): Json<ValidateSchemaNameRequest>,
) -> ApiResult<Json<ApiResponse<SchemaNameAvailability>>> {
    let is_unique = state
        .tenants()
        .schema_name_available(&request.schema_name)
        .await?;

    let message = if is_unique {
        "Schema name is available"
    } else {
        "Schema name is already taken"
    };
    Ok(Json(ApiResponse::ok(
        message,
        SchemaNameAvailability { is_unique },
    )))
}
