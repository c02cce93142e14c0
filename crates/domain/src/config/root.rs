use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::query::QueryConfig;
use super::upstream::UpstreamConfig;
use crate::dns_protocol::TransportProtocol;

const LOCAL_CONFIG_PATH: &str = "ferrous-stub.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/ferrous-stub/config.toml";

/// Main configuration structure for Ferrous Stub
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Server to query and local binding
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-query behaviour (timeouts, id collisions)
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-stub.toml in current directory
    /// 3. /etc/ferrous-stub/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(address) = overrides.server {
            self.upstream.address = address;
        }
        if let Some(port) = overrides.port {
            self.upstream.port = port;
        }
        if let Some(protocol) = overrides.protocol {
            self.upstream.protocol = protocol;
        }
        if let Some(source) = overrides.source_address {
            self.upstream.source_address = Some(source);
        }
        if let Some(port) = overrides.source_port {
            self.upstream.source_port = port;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.query.timeout_secs = Some(timeout);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.port == 0 {
            return Err(ConfigError::Validation(
                "Upstream port cannot be 0".to_string(),
            ));
        }

        if self.query.max_udp_payload < 512 {
            return Err(ConfigError::Validation(format!(
                "max_udp_payload must be at least 512 bytes, got {}",
                self.query.max_udp_payload
            )));
        }

        if let Some(source) = self.upstream.source_address {
            if source.is_ipv4() != self.upstream.address.is_ipv4() {
                return Err(ConfigError::Validation(format!(
                    "Source address {} and server address {} belong to different address families",
                    source, self.upstream.address
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub server: Option<IpAddr>,
    pub port: Option<u16>,
    pub protocol: Option<TransportProtocol>,
    pub source_address: Option<IpAddr>,
    pub source_port: Option<u16>,
    pub timeout_secs: Option<f64>,
    pub log_level: Option<String>,
}
