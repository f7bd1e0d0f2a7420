//! Terminal error reporter
//!
//! Registered as the outermost request layer. Any error response built
//! by `ApiError::into_response` carries an `ErrorReport` extension;
//! this middleware logs it with the request's method, path, and client
//! address, and in development mode rewrites the envelope to include
//! the server-side detail as a `stack` field. It never fails a
//! response: if anything about reporting goes wrong, the original
//! response is sent as-is.

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Environment;
use crate::error::ErrorReport;
use crate::handlers::AppState;

pub async fn error_reporter(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string());

    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    tracing::error!(
        message = %report.message,
        detail = report.detail.as_deref(),
        status_code = report.status.as_u16(),
        path = %path,
        method = %method,
        client_addr = client_addr.as_deref(),
        "request failed"
    );

    // Debug aid only: never in production or test.
    if state.config().environment == Environment::Development && report.expose_detail {
        if let Some(detail) = report.detail {
            let mut envelope = report.envelope;
            envelope.stack = Some(detail);
            return (report.status, Json(envelope)).into_response();
        }
    }

    response
}
