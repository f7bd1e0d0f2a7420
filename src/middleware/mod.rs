//! Request pipeline middleware

pub mod auth;
pub mod error_handler;
pub mod request_id;
pub mod validate;

pub use error_handler::error_reporter;
pub use request_id::{RequestId, request_id_middleware};
pub use validate::{
    RequestSchemas, ValidatedBody, ValidatedParams, ValidatedQuery,
    ValidationMiddlewareOptions, create_validation_middleware, validate_request,
};
