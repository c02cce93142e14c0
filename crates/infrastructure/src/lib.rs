//! Tokio and hickory-proto adapters for the correlation engine.
pub mod dns;
