pub mod errors;
pub mod logging;
pub mod query;
pub mod root;
pub mod upstream;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use query::{timeout_from_secs, IdCollisionPolicy, QueryConfig};
pub use root::{CliOverrides, Config};
pub use upstream::UpstreamConfig;
