//! Request validation middleware
//!
//! Validates an incoming request's body, query string, and path
//! parameters against caller-supplied schemas. Sections are checked in
//! that order and the FIRST failing section short-circuits with the
//! canonical failure envelope; issues are aggregated within a section
//! but deliberately not across sections.
//!
//! A section that parses successfully REPLACES the original request
//! data: the transformed body is re-serialized into the request so
//! downstream `Json<T>` extractors observe transforms, and each
//! section's parsed value is inserted as a request extension.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{FromRequestParts, RawPathParams, Request},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::error::FieldIssue;
use crate::response::ApiResponse;
use crate::validation::Schema;

/// Matches the JSON body-size cap of the HTTP shell.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Up to three independent schemas, one per request section. An empty
/// set is legal and the middleware becomes a pass-through.
#[derive(Clone, Default)]
pub struct RequestSchemas {
    pub body: Option<Schema>,
    pub query: Option<Schema>,
    pub params: Option<Schema>,
}

impl RequestSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    fn is_empty(&self) -> bool {
        self.body.is_none() && self.query.is_none() && self.params.is_none()
    }
}

/// Parsed, transformed request body, available to handlers as an
/// extension after validation.
#[derive(Debug, Clone)]
pub struct ValidatedBody(pub Value);

/// Parsed, transformed query parameters.
#[derive(Debug, Clone)]
pub struct ValidatedQuery(pub Value);

/// Parsed, transformed path parameters.
#[derive(Debug, Clone)]
pub struct ValidatedParams(pub Value);

/// Callback that replaces the default failure envelope.
pub type OnError = Arc<dyn Fn(&[String]) -> (StatusCode, ApiResponse) + Send + Sync>;

/// Options for the factory variant: the schema set plus an optional
/// envelope override.
#[derive(Clone)]
pub struct ValidationMiddlewareOptions {
    pub schema: RequestSchemas,
    pub on_error: Option<OnError>,
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Builds the validation middleware for a route. Use with
/// `axum::middleware::from_fn`.
pub fn validate_request(
    schemas: RequestSchemas,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    validation_middleware(schemas, None)
}

/// Factory variant allowing the caller to override the failure
/// envelope's shape and status code.
pub fn create_validation_middleware(
    options: ValidationMiddlewareOptions,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    validation_middleware(options.schema, options.on_error)
}

fn validation_middleware(
    schemas: RequestSchemas,
    on_error: Option<OnError>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let schemas = Arc::new(schemas);
    move |request, next| {
        let schemas = Arc::clone(&schemas);
        let on_error = on_error.clone();
        Box::pin(async move { run(&schemas, on_error.as_ref(), request, next).await })
    }
}

async fn run(
    schemas: &RequestSchemas,
    on_error: Option<&OnError>,
    request: Request,
    next: Next,
) -> Response {
    if schemas.is_empty() {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    // Section 1: body
    let body = match &schemas.body {
        None => body,
        Some(schema) => {
            let bytes = match to_bytes(body, BODY_LIMIT).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::error!(error = %err, "failed to read request body");
                    return internal_failure();
                }
            };

            let value: Value = if bytes.is_empty() {
                Value::Null
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => value,
                    Err(_) => {
                        return section_failure(
                            on_error,
                            vec![FieldIssue::new("body", "invalid JSON")],
                        );
                    }
                }
            };

            match schema.safe_parse(&value) {
                Err(issues) => return section_failure(on_error, issues),
                Ok(parsed) => {
                    let new_bytes = match serde_json::to_vec(&parsed) {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            tracing::error!(error = %err, "failed to re-serialize validated body");
                            return internal_failure();
                        }
                    };
                    // Length changed; the extractor reads to the end.
                    parts.headers.remove(header::CONTENT_LENGTH);
                    parts.extensions.insert(ValidatedBody(parsed));
                    Body::from(new_bytes)
                }
            }
        }
    };

    // Section 2: query string
    if let Some(schema) = &schemas.query {
        let raw = parts.uri.query().unwrap_or("");
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(raw) {
            Ok(pairs) => pairs,
            Err(_) => {
                return section_failure(
                    on_error,
                    vec![FieldIssue::new("query", "invalid query string")],
                );
            }
        };

        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert(key, Value::String(value));
        }

        match schema.safe_parse(&Value::Object(map)) {
            Err(issues) => return section_failure(on_error, issues),
            Ok(parsed) => {
                parts.extensions.insert(ValidatedQuery(parsed));
            }
        }
    }

    // Section 3: path parameters
    if let Some(schema) = &schemas.params {
        let raw = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::error!(error = %err, "failed to extract path parameters");
                return internal_failure();
            }
        };

        let mut map = Map::new();
        for (key, value) in &raw {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }

        match schema.safe_parse(&Value::Object(map)) {
            Err(issues) => return section_failure(on_error, issues),
            Ok(parsed) => {
                parts.extensions.insert(ValidatedParams(parsed));
            }
        }
    }

    next.run(Request::from_parts(parts, body)).await
}

fn section_failure(on_error: Option<&OnError>, issues: Vec<FieldIssue>) -> Response {
    let errors: Vec<String> = issues.iter().map(FieldIssue::formatted).collect();
    match on_error {
        Some(callback) => {
            let (status, envelope) = callback(&errors);
            (status, Json(envelope)).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_failed(errors)),
        )
            .into_response(),
    }
}

/// A fault in the parsing machinery itself must never propagate; it
/// becomes a generic 500 envelope.
fn internal_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("Internal server error", 500)),
    )
        .into_response()
}
