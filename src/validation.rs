//! Declarative schema validation engine
//!
//! A `Schema` is an ordered list of field descriptors, each declaring
//! a primitive kind, required/optional, constraints, and an optional
//! pure transform. One generic validator executes any schema against a
//! JSON value, so the engine is decoupled from the individual route
//! schemas.
//!
//! `safe_parse` never panics: it aggregates every issue within the
//! schema (dot-joined paths, array indices included) and a transform
//! error is a field validation failure, not a fault.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::error::FieldIssue;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        // Pragmatic address shape, not full RFC 5321.
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    })
}

/// Primitive shape a field must have before constraints run.
#[derive(Clone)]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    StringArray,
    NumberArray,
    Object(Schema),
    ObjectArray(Schema),
    /// Accepted as-is; useful for free-form option bags.
    Any,
}

/// A single declarative constraint with a fixed failure message.
#[derive(Clone)]
pub enum Constraint {
    MinLen(usize),
    MaxLen(usize),
    Email,
    Pattern(Regex, &'static str),
    OneOf(Vec<&'static str>),
    Min(f64),
    Max(f64),
    Uuid,
}

/// A pure value transform applied after a field's constraints pass.
/// The transformed value replaces the original in the parse output.
#[derive(Clone)]
pub enum Transform {
    /// Numeric string to JSON number (e.g. `"9.99"` → `9.99`).
    ToNumber,
    /// Comma-separated string to an array of trimmed strings.
    SplitComma,
    /// Caller-supplied pure transform; an `Err` is reported as a
    /// validation failure on the field.
    Custom(fn(&Value) -> Result<Value, String>),
}

/// Field descriptor: name, kind, required flag, constraints, optional
/// transform. Fields are required unless `.optional()` is called.
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: Kind,
    required: bool,
    constraints: Vec<Constraint>,
    transform: Option<Transform>,
}

impl Field {
    fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            constraints: Vec::new(),
            transform: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, Kind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Boolean)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, Kind::StringArray)
    }

    pub fn number_array(name: impl Into<String>) -> Self {
        Self::new(name, Kind::NumberArray)
    }

    pub fn object(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, Kind::Object(schema))
    }

    pub fn object_array(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, Kind::ObjectArray(schema))
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Any)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn min_len(self, n: usize) -> Self {
        self.constraint(Constraint::MinLen(n))
    }

    pub fn max_len(self, n: usize) -> Self {
        self.constraint(Constraint::MaxLen(n))
    }

    pub fn email(self) -> Self {
        self.constraint(Constraint::Email)
    }

    /// Regex constraint. Panics at schema-construction time on an
    /// invalid pattern, which is a programming error, not input.
    pub fn pattern(self, pattern: &str, message: &'static str) -> Self {
        let regex = Regex::new(pattern).expect("schema pattern is valid");
        self.constraint(Constraint::Pattern(regex, message))
    }

    pub fn one_of(self, values: &[&'static str]) -> Self {
        self.constraint(Constraint::OneOf(values.to_vec()))
    }

    pub fn min(self, n: f64) -> Self {
        self.constraint(Constraint::Min(n))
    }

    pub fn max(self, n: f64) -> Self {
        self.constraint(Constraint::Max(n))
    }

    pub fn uuid(self) -> Self {
        self.constraint(Constraint::Uuid)
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Declarative description of one request section (body, query, or
/// params). Unknown keys are dropped from the parse output.
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Non-throwing parse: returns the transformed value on success or
    /// every collected issue on failure. Never both.
    pub fn safe_parse(&self, value: &Value) -> Result<Value, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let output = self.parse_at("", value, &mut issues);
        if issues.is_empty() {
            Ok(output)
        } else {
            Err(issues)
        }
    }

    fn parse_at(&self, prefix: &str, value: &Value, issues: &mut Vec<FieldIssue>) -> Value {
        let object = match value {
            Value::Object(map) => map,
            Value::Null => {
                // Missing section: every required field is reported.
                for field in &self.fields {
                    if field.required {
                        issues.push(FieldIssue::new(join(prefix, &field.name), "Required"));
                    }
                }
                return Value::Object(Map::new());
            }
            _ => {
                issues.push(FieldIssue::new(prefix, "Expected object"));
                return Value::Object(Map::new());
            }
        };

        let mut out = Map::new();
        for field in &self.fields {
            let path = join(prefix, &field.name);
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        issues.push(FieldIssue::new(path, "Required"));
                    }
                }
                Some(raw) => {
                    let before = issues.len();
                    let checked = check_kind(&field.kind, &path, raw, issues);
                    if issues.len() == before {
                        apply_constraints(&field.constraints, &path, &checked, issues);
                    }
                    if issues.len() == before {
                        let transformed = match &field.transform {
                            None => checked,
                            Some(t) => match apply_transform(t, &checked) {
                                Ok(v) => v,
                                Err(message) => {
                                    issues.push(FieldIssue::new(path, message));
                                    continue;
                                }
                            },
                        };
                        out.insert(field.name.clone(), transformed);
                    }
                }
            }
        }
        Value::Object(out)
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_kind(kind: &Kind, path: &str, value: &Value, issues: &mut Vec<FieldIssue>) -> Value {
    match kind {
        Kind::Any => value.clone(),
        Kind::String => {
            if value.is_string() {
                value.clone()
            } else {
                issues.push(FieldIssue::new(path, "Expected string"));
                Value::Null
            }
        }
        Kind::Number => {
            if value.is_number() {
                value.clone()
            } else {
                issues.push(FieldIssue::new(path, "Expected number"));
                Value::Null
            }
        }
        Kind::Integer => {
            if value.as_i64().is_some() || value.as_u64().is_some() {
                value.clone()
            } else {
                issues.push(FieldIssue::new(path, "Expected integer"));
                Value::Null
            }
        }
        Kind::Boolean => {
            if value.is_boolean() {
                value.clone()
            } else {
                issues.push(FieldIssue::new(path, "Expected boolean"));
                Value::Null
            }
        }
        Kind::StringArray => check_elements(path, value, issues, |v| v.is_string(), "Expected string"),
        Kind::NumberArray => check_elements(path, value, issues, |v| v.is_number(), "Expected number"),
        Kind::Object(schema) => schema.parse_at(path, value, issues),
        Kind::ObjectArray(schema) => match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| schema.parse_at(&format!("{path}.{i}"), item, issues))
                    .collect(),
            ),
            _ => {
                issues.push(FieldIssue::new(path, "Expected array"));
                Value::Null
            }
        },
    }
}

fn check_elements(
    path: &str,
    value: &Value,
    issues: &mut Vec<FieldIssue>,
    accepts: fn(&Value) -> bool,
    message: &'static str,
) -> Value {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if !accepts(item) {
                    issues.push(FieldIssue::new(format!("{path}.{i}"), message));
                }
            }
            value.clone()
        }
        _ => {
            issues.push(FieldIssue::new(path, "Expected array"));
            Value::Null
        }
    }
}

fn apply_constraints(
    constraints: &[Constraint],
    path: &str,
    value: &Value,
    issues: &mut Vec<FieldIssue>,
) {
    for constraint in constraints {
        match constraint {
            Constraint::MinLen(n) => {
                if let Some(s) = value.as_str() {
                    if s.chars().count() < *n {
                        issues.push(FieldIssue::new(
                            path,
                            format!("must be at least {n} characters"),
                        ));
                    }
                }
            }
            Constraint::MaxLen(n) => {
                if let Some(s) = value.as_str() {
                    if s.chars().count() > *n {
                        issues.push(FieldIssue::new(
                            path,
                            format!("must be at most {n} characters"),
                        ));
                    }
                }
            }
            Constraint::Email => {
                if let Some(s) = value.as_str() {
                    if !email_regex().is_match(s) {
                        issues.push(FieldIssue::new(path, "Invalid email"));
                    }
                }
            }
            Constraint::Pattern(regex, message) => {
                if let Some(s) = value.as_str() {
                    if !regex.is_match(s) {
                        issues.push(FieldIssue::new(path, *message));
                    }
                }
            }
            Constraint::OneOf(values) => {
                if let Some(s) = value.as_str() {
                    if !values.contains(&s) {
                        issues.push(FieldIssue::new(
                            path,
                            format!("must be one of {}", values.join(", ")),
                        ));
                    }
                }
            }
            Constraint::Min(n) => {
                if let Some(v) = value.as_f64() {
                    if v < *n {
                        issues.push(FieldIssue::new(path, format!("must be at least {n}")));
                    }
                }
            }
            Constraint::Max(n) => {
                if let Some(v) = value.as_f64() {
                    if v > *n {
                        issues.push(FieldIssue::new(path, format!("must be at most {n}")));
                    }
                }
            }
            Constraint::Uuid => {
                if let Some(s) = value.as_str() {
                    if Uuid::parse_str(s).is_err() {
                        issues.push(FieldIssue::new(path, "Invalid uuid"));
                    }
                }
            }
        }
    }
}

fn apply_transform(transform: &Transform, value: &Value) -> Result<Value, String> {
    match transform {
        Transform::ToNumber => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| "must be a numeric string".to_string()),
            _ => Err("must be a numeric string".to_string()),
        },
        Transform::SplitComma => match value {
            Value::String(s) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            _ => Err("must be a comma-separated string".to_string()),
        },
        Transform::Custom(f) => f(value),
    }
}
