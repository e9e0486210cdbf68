//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params) and the request's leased connection
//! 2. Runs one SQL statement on that connection
//! 3. Returns the JSON envelope and status code

/// Car CRUD endpoints
pub mod cars;
/// Health check endpoint
pub mod health;
