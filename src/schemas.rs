//! Route schemas
//!
//! Declarative request schemas for the auth and tenant endpoints,
//! expressed in the generic validation engine. Field names match the
//! wire format (camelCase), which is also what the handler DTOs
//! deserialize.

use crate::validation::{Field, Schema};

const SCHEMA_NAME_PATTERN: &str = "^[a-z][a-z0-9_]*$";
const SCHEMA_NAME_MESSAGE: &str =
    "must start with a letter and contain only lowercase letters, numbers, and underscores";

/// Body schema for `POST /api/auth/login`.
pub fn login_schema() -> Schema {
    Schema::new()
        .field(Field::string("email").email())
        .field(Field::string("password").min_len(1))
}

/// Body schema for `POST /api/auth/signup`.
pub fn signup_schema() -> Schema {
    Schema::new()
        .field(Field::string("email").email())
        .field(Field::string("password").min_len(8))
        .field(Field::string("tenantId").uuid())
}

/// Full user-registration payload (signup plus profile and tenant
/// naming fields).
pub fn registration_schema() -> Schema {
    Schema::new()
        .field(Field::string("email").email())
        .field(Field::string("password").min_len(8))
        .field(Field::string("firstName").min_len(2))
        .field(Field::string("lastName").min_len(2))
        .field(Field::string("tenantName").min_len(2))
}

/// Body schema for `POST /api/auth/tenant`.
pub fn tenant_creation_schema() -> Schema {
    Schema::new()
        .field(Field::string("name").min_len(1).max_len(100))
        .field(
            Field::string("schemaName")
                .min_len(1)
                .max_len(50)
                .pattern(SCHEMA_NAME_PATTERN, SCHEMA_NAME_MESSAGE),
        )
        .field(Field::string("adminEmail").email())
        .field(Field::string("adminPassword").min_len(8))
}

/// Body schema for `POST /api/auth/validate-schema-name`.
pub fn validate_schema_name_schema() -> Schema {
    Schema::new().field(
        Field::string("schemaName")
            .min_len(1)
            .max_len(50)
            .pattern(SCHEMA_NAME_PATTERN, SCHEMA_NAME_MESSAGE),
    )
}

/// Chart-definition payload used by the visualization endpoints.
pub fn data_visualization_schema() -> Schema {
    Schema::new()
        .field(Field::string("type").one_of(&["line", "bar", "pie"]))
        .field(Field::string("title").min_len(2))
        .field(Field::object(
            "data",
            Schema::new()
                .field(Field::string_array("labels"))
                .field(Field::object_array(
                    "datasets",
                    Schema::new()
                        .field(Field::string("label"))
                        .field(Field::number_array("data")),
                )),
        ))
        .field(Field::any("options").optional())
}
