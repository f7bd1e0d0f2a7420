//! Multi-tenant SaaS backend
//!
//! HTTP API with schema-driven request validation, normalized error
//! envelopes, environment-validated configuration, and Supabase-backed
//! auth and tenant provisioning.
//!
//! # Architecture
//!
//! - `config`: environment detection, validation, and cached snapshots
//! - `validation`: the declarative schema engine
//! - `middleware`: request validation, auth, request IDs, and the
//!   terminal error reporter
//! - `services`: the external collaborator traits and the Supabase
//!   client implementing them
//! - `handlers`: route handlers and shared application state
//! - `app`: router assembly

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod schemas;
pub mod services;
pub mod telemetry;
pub mod validation;
