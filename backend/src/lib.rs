//! Coffee catalog backend service
//!
//! HTTP API for creating, reading, updating and deleting coffee shop catalog
//! items. Every catalog route requires a bearer token issued by the configured
//! identity provider.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs, dead_code)]

/// Bearer token verification
pub mod auth;

/// Request middleware
pub mod middleware;

/// Route handlers
pub mod routes;

/// Server bootstrap
pub mod server;

/// Shared types
pub mod types;

/// Coffee item payload validation
pub mod validation;
