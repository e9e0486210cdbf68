//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Prepare per-request resources (database connections)
//! - Log requests
//! - Short-circuit requests when a resource is unavailable

/// Request-scoped database connection middleware
pub mod connection;
