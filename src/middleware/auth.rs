//! Authentication middleware
//!
//! Extracts the bearer token, verifies it through the external auth
//! provider, and threads the resulting `UserContext` into request
//! extensions. Provider faults normalize to a fixed 401; missing
//! tenant linkage is an operational 403.

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::middleware::validate::{ValidatedBody, ValidatedParams};
use crate::services::auth::UserContext;

/// Verifies the bearer token and attaches the user context.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .ok_or_else(|| ApiError::operational("Access token required", 401))?;

    let context = match state.auth().verify(token).await {
        Ok(context) => context,
        Err(err) => {
            tracing::warn!(error = %err, "token verification failed");
            return Err(ApiError::Unauthorized);
        }
    };

    if context.tenant_id.is_empty() || context.tenant_schema.is_empty() {
        tracing::error!(user_id = %context.user_id, "missing tenant information in token");
        return Err(ApiError::operational(
            "User not associated with a tenant",
            403,
        ));
    }

    tracing::debug!(
        user_id = %context.user_id,
        tenant_id = %context.tenant_id,
        "user authenticated"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Role guard. Admits the required role and `admin`; must run after
/// `authenticate`.
pub fn require_role(required: &'static str) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |request, next| {
        Box::pin(async move {
            let context = request.extensions().get::<UserContext>().cloned();
            match context {
                None => ApiError::operational("Authentication required", 401).into_response(),
                Some(ctx) if ctx.role == required || ctx.role == "admin" => {
                    next.run(request).await
                }
                Some(ctx) => {
                    tracing::warn!(
                        user_id = %ctx.user_id,
                        role = %ctx.role,
                        required,
                        "role check failed"
                    );
                    ApiError::operational(format!("Access denied. Required role: {required}"), 403)
                        .into_response()
                }
            }
        })
    }
}

/// Rejects requests whose validated body or path parameters name a
/// tenant other than the caller's. Must run after `authenticate` and
/// any validation middleware.
pub async fn require_tenant_access(request: Request, next: Next) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<UserContext>()
        .cloned()
        .ok_or_else(|| ApiError::operational("Authentication required", 401))?;

    let requested = requested_tenant_id(&request);
    if let Some(tenant_id) = requested {
        if tenant_id != context.tenant_id {
            tracing::warn!(
                user_id = %context.user_id,
                user_tenant_id = %context.tenant_id,
                requested_tenant_id = %tenant_id,
                "tenant access violation attempt"
            );
            return Err(ApiError::operational("Access denied to requested tenant", 403));
        }
    }

    Ok(next.run(request).await)
}

fn requested_tenant_id(request: &Request) -> Option<String> {
    let from_params = request
        .extensions()
        .get::<ValidatedParams>()
        .and_then(|p| p.0.get("tenantId"))
        .and_then(Value::as_str);
    if let Some(id) = from_params {
        return Some(id.to_string());
    }
    request
        .extensions()
        .get::<ValidatedBody>()
        .and_then(|b| b.0.get("tenantId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
