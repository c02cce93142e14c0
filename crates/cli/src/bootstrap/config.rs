use ferrous_stub_domain::{CliOverrides, Config};
use tracing::debug;

/// Loads, overrides and validates the configuration.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// Call once logging is initialised; events emitted earlier have no subscriber.
pub fn log_config(config: &Config) {
    debug!(
        upstream = %config.upstream.endpoint(),
        id_collision = config.query.id_collision.as_str(),
        timeout = ?config.query.timeout(),
        "Configuration loaded"
    );
}
