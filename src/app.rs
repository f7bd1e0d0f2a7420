//! Application router
//!
//! Assembles the route tree and the middleware stack around it. Every
//! mutating auth route gets its own validation middleware; protected
//! routes sit behind the authentication guard.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::EnvironmentConfig;
use crate::handlers::{self, AppState};
use crate::middleware::{
    RequestSchemas, auth::authenticate, error_reporter, request_id_middleware, validate_request,
    validate::BODY_LIMIT,
};
use crate::schemas;

/// Build the application router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    let public_auth = Router::new()
        .route(
            "/login",
            post(handlers::auth::login).layer(middleware::from_fn(validate_request(
                RequestSchemas::new().body(schemas::login_schema()),
            ))),
        )
        .route(
            "/signup",
            post(handlers::auth::signup).layer(middleware::from_fn(validate_request(
                RequestSchemas::new().body(schemas::signup_schema()),
            ))),
        )
        .route(
            "/tenant",
            post(handlers::auth::create_tenant).layer(middleware::from_fn(validate_request(
                RequestSchemas::new().body(schemas::tenant_creation_schema()),
            ))),
        )
        .route(
            "/validate-schema-name",
            post(handlers::auth::validate_schema_name).layer(middleware::from_fn(
                validate_request(RequestSchemas::new().body(schemas::validate_schema_name_schema())),
            )),
        );

    let protected_auth = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/profile", get(handlers::auth::profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/api/health", get(handlers::health::handler))
        .nest("/api/auth", public_auth.merge(protected_auth))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), error_reporter))
        .with_state(state)
}

/// CORS policy from the configured frontend origin plus any extra
/// allowed origins. Invalid entries are skipped with a warning rather
/// than failing startup.
fn cors_layer(config: &EnvironmentConfig) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    for origin in std::iter::once(&config.cors_origin).chain(config.allowed_origins.iter()) {
        match origin.parse::<HeaderValue>() {
            Ok(value) => {
                if !origins.contains(&value) {
                    origins.push(value);
                }
            }
            Err(_) => tracing::warn!(origin = %origin, "skipping malformed CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
