//! Canonical JSON envelopes
//!
//! Every HTTP response in the system uses the same shape: `success`,
//! `message`, and either `data` (success) or `errors`/`statusCode`
//! (failure). Handlers build success envelopes directly; failure
//! envelopes are owned by the error path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The canonical response envelope.
///
/// `data` is present only on success, `errors` only for validation
/// failures, and `stack` only in development mode for unclassified
/// faults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(
        rename = "statusCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Success envelope with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            status_code: None,
            stack: None,
        }
    }

    /// Success envelope without a payload.
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            status_code: None,
            stack: None,
        }
    }
}

impl ApiResponse<Value> {
    /// Failure envelope with a status code and no issue list.
    pub fn error(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
            status_code: Some(status_code),
            stack: None,
        }
    }

    /// The default validation-failure envelope: status 400 and one
    /// `"<field>: <message>"` entry per violation.
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: "Validation failed".to_string(),
            data: None,
            errors: Some(errors),
            status_code: Some(400),
            stack: None,
        }
    }
}
