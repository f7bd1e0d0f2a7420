//! Error taxonomy for the backend
//!
//! Errors are a tagged union rather than a class hierarchy: the
//! terminal path pattern-matches on the variant to pick the status
//! code and client-visible message. `ApiError` implements
//! `IntoResponse`, so handlers return `Result<_, ApiError>` and every
//! failure reaches the client as the canonical envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::response::ApiResponse;

/// A single field-level validation issue with a dot-joined path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Renders the issue as `"<dot.path>: <message>"`. Root-level
    /// issues (empty path) render as the bare message.
    pub fn formatted(&self) -> String {
        if self.path.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.path, self.message)
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum ApiError {
    /// A failed schema check: one entry per violated field.
    #[error("Validation failed")]
    Validation(Vec<FieldIssue>),

    /// An intentional business-rule failure with a caller-chosen
    /// status code. Created at the point the rule is violated and
    /// propagated unmodified.
    #[error("{message}")]
    Operational {
        message: String,
        status: StatusCode,
        context: Option<Value>,
    },

    /// An authentication-subsystem fault. Always 401 with a fixed
    /// message; the underlying reason is never exposed.
    #[error("Invalid or expired token")]
    Unauthorized,

    /// Anything else. The detail is logged server-side and echoed to
    /// the client only in development mode.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Construct an operational error. Status codes outside the valid
    /// HTTP range fall back to 500.
    pub fn operational(message: impl Into<String>, status_code: u16) -> Self {
        Self::Operational {
            message: message.into(),
            status: StatusCode::from_u16(status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            context: None,
        }
    }

    /// Operational error carrying structured context for the logs.
    pub fn operational_with_context(
        message: impl Into<String>,
        status_code: u16,
        context: Value,
    ) -> Self {
        Self::Operational {
            message: message.into(),
            status: StatusCode::from_u16(status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            context: Some(context),
        }
    }

    /// Discriminator for intentional failures. Returns `false` for
    /// every other variant, never panics.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Operational { .. })
    }

    /// The HTTP status this error normalizes to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Operational { status, .. } => *status,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error details attached to the response as an extension so the
/// terminal reporter can log them (and expose the detail in
/// development) after the envelope has been built.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    /// Server-side detail: the original fault text for unclassified
    /// errors, serialized context for operational ones. Never sent to
    /// the client outside development mode.
    pub detail: Option<String>,
    /// Whether `detail` may be echoed to the client in development.
    pub expose_detail: bool,
    pub envelope: ApiResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (envelope, detail, expose_detail) = match self {
            Self::Validation(issues) => {
                let errors = issues.iter().map(FieldIssue::formatted).collect();
                (ApiResponse::validation_failed(errors), None, false)
            }
            Self::Operational {
                message, context, ..
            } => (
                ApiResponse::error(message, status.as_u16()),
                context.map(|c| c.to_string()),
                false,
            ),
            Self::Unauthorized => (
                ApiResponse::error("Invalid or expired token", status.as_u16()),
                None,
                false,
            ),
            Self::Internal(detail) => (
                ApiResponse::error("Internal server error", status.as_u16()),
                Some(detail),
                true,
            ),
        };

        let report = ErrorReport {
            status,
            message: envelope.message.clone(),
            detail,
            expose_detail,
            envelope: envelope.clone(),
        };

        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Convenience type alias for Results
pub type ApiResult<T> = Result<T, ApiError>;
