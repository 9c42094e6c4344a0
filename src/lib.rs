//! Layered user service
//!
//! HTTP handlers call a service that validates input and enforces email
//! uniqueness before delegating to a PostgreSQL-backed repository.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod services;
