//! Integration tests for the request validation middleware
//!
//! Covers the section ordering contract: issues are aggregated within
//! a single section, but the first failing section short-circuits the
//! rest. Also verifies that transformed values are what handlers see.

mod common;

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use aialpha_backend::middleware::{
    RequestSchemas, ValidatedParams, ValidatedQuery, ValidationMiddlewareOptions,
    create_validation_middleware, validate_request,
};
use aialpha_backend::response::ApiResponse;
use aialpha_backend::validation::{Field, Schema, Transform};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

fn item_schema() -> Schema {
    Schema::new()
        .field(Field::string("name").min_len(2))
        .field(Field::string("email").email())
}

#[tokio::test]
async fn test_body_issues_are_aggregated_in_declaration_order() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(item_schema()),
        ))),
    );

    let response = app
        .oneshot(post_json("/items", json!({"name": "A", "email": "bad"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(
        body["errors"],
        json!([
            "name: must be at least 2 characters",
            "email: Invalid email"
        ])
    );
}

#[tokio::test]
async fn test_first_failing_section_short_circuits_later_sections() {
    // Both body and query are invalid; only body issues are reported.
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new()
                .body(item_schema())
                .query(Schema::new().field(Field::string("page"))),
        ))),
    );

    let response = app
        .oneshot(post_json("/items", json!({"name": "A", "email": "bad"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| {
        let e = e.as_str().unwrap();
        e.starts_with("name:") || e.starts_with("email:")
    }));
}

#[tokio::test]
async fn test_valid_body_passes_query_is_then_checked() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new()
                .body(item_schema())
                .query(Schema::new().field(Field::string("page"))),
        ))),
    );

    let response = app
        .oneshot(post_json(
            "/items",
            json!({"name": "Widget", "email": "a@b.co"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["errors"], json!(["page: Required"]));
}

#[tokio::test]
async fn test_handler_observes_transformed_body() {
    let schema = Schema::new()
        .field(Field::string("name"))
        .field(Field::string("price").transform(Transform::ToNumber));

    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(schema),
        ))),
    );

    let response = app
        .oneshot(post_json("/items", json!({"name": "Widget", "price": "9.99"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::read_json(response).await;
    assert_eq!(body["price"], json!(9.99));
}

#[tokio::test]
async fn test_unknown_body_keys_are_stripped() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(Schema::new().field(Field::string("name"))),
        ))),
    );

    let response = app
        .oneshot(post_json("/items", json!({"name": "ok", "admin": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::read_json(response).await;
    assert_eq!(body, json!({"name": "ok"}));
}

#[tokio::test]
async fn test_malformed_json_body_is_a_400_not_a_fault() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(item_schema()),
        ))),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["errors"], json!(["body: invalid JSON"]));
}

#[tokio::test]
async fn test_empty_body_reports_required_fields() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(item_schema()),
        ))),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/items")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["errors"], json!(["name: Required", "email: Required"]));
}

#[tokio::test]
async fn test_empty_schema_set_is_a_pass_through() {
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(RequestSchemas::new()))),
    );

    let response = app
        .oneshot(post_json("/items", json!({"anything": "goes"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_query_section_is_validated_and_exposed() {
    async fn echo_query(Extension(ValidatedQuery(query)): Extension<ValidatedQuery>) -> Json<Value> {
        Json(query)
    }

    let app = Router::new().route(
        "/search",
        get(echo_query).layer(middleware::from_fn(validate_request(
            RequestSchemas::new()
                .query(Schema::new().field(Field::string("page").transform(Transform::ToNumber))),
        ))),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/search?page=3&noise=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::read_json(response).await;
    assert_eq!(body, json!({"page": 3.0}));
}

#[tokio::test]
async fn test_path_params_are_validated() {
    async fn echo_params(
        Extension(ValidatedParams(params)): Extension<ValidatedParams>,
    ) -> Json<Value> {
        Json(params)
    }

    let app = Router::new().route(
        "/tenants/{tenantId}",
        get(echo_params).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().params(Schema::new().field(Field::string("tenantId").uuid())),
        ))),
    );

    let bad = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/tenants/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(bad).await;
    assert_eq!(body["errors"], json!(["tenantId: Invalid uuid"]));

    let good = app
        .oneshot(
            Request::builder()
                .uri(format!("/tenants/{}", common::TENANT_ID))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(good.status(), StatusCode::OK);
    let body = common::read_json(good).await;
    assert_eq!(body["tenantId"], common::TENANT_ID);
}

#[tokio::test]
async fn test_on_error_callback_overrides_the_failure_envelope() {
    let options = ValidationMiddlewareOptions {
        schema: RequestSchemas::new().body(item_schema()),
        on_error: Some(Arc::new(|errors| {
            let mut envelope = ApiResponse::error("Custom failure", 422);
            envelope.errors = Some(errors.to_vec());
            (StatusCode::UNPROCESSABLE_ENTITY, envelope)
        })),
    };
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(create_validation_middleware(options))),
    );

    let response = app
        .oneshot(post_json(
            "/items",
            json!({"name": "Widget", "email": "bad"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], "Custom failure");
    assert_eq!(body["statusCode"], 422);
    assert_eq!(body["errors"], json!(["email: Invalid email"]));
}

#[tokio::test]
async fn test_factory_without_on_error_uses_the_default_envelope() {
    let options = ValidationMiddlewareOptions {
        schema: RequestSchemas::new().body(item_schema()),
        on_error: None,
    };
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(create_validation_middleware(options))),
    );

    let response = app
        .oneshot(post_json(
            "/items",
            json!({"name": "Widget", "email": "bad"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["errors"], json!(["email: Invalid email"]));
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_transformed_bodies() {
    let schema = Schema::new().field(Field::string("price").transform(Transform::ToNumber));
    let app = Router::new().route(
        "/items",
        post(echo_body).layer(middleware::from_fn(validate_request(
            RequestSchemas::new().body(schema),
        ))),
    );

    let (a, b) = tokio::join!(
        app.clone().oneshot(post_json("/items", json!({"price": "1.5"}))),
        app.oneshot(post_json("/items", json!({"price": "2.5"}))),
    );

    let a = common::read_json(a.unwrap()).await;
    let b = common::read_json(b.unwrap()).await;
    assert_eq!(a["price"], json!(1.5));
    assert_eq!(b["price"], json!(2.5));
}

#[tokio::test]
async fn test_login_route_uses_the_login_schema() {
    let app = common::default_app();

    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            json!({"email": "not-an-email", "password": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["errors"],
        json!([
            "email: Invalid email",
            "password: must be at least 1 characters"
        ])
    );
}
