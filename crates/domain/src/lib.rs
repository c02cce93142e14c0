//! Ferrous Stub Domain Layer
pub mod config;
pub mod dns_protocol;
pub mod errors;
pub mod transaction_id;

pub use config::{
    timeout_from_secs, CliOverrides, Config, ConfigError, IdCollisionPolicy, LoggingConfig,
    QueryConfig, UpstreamConfig,
};
pub use dns_protocol::{TransportProtocol, UpstreamEndpoint, DEFAULT_DNS_PORT};
pub use errors::QueryError;
pub use transaction_id::TransactionId;
