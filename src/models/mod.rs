//! Data models representing database entities and response bodies.

/// Car entity and request payload
pub mod car;
/// Response envelope shared by every endpoint
pub mod envelope;
