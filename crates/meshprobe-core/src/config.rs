//! Configuration management for meshprobe tools.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`MESHPROBE__<SECTION>__<KEY>`)
//! 2. Config file (`meshprobe.toml`, or any prefix passed on the command line)
//! 3. Defaults
//!
//! Each crate owns the struct for its own section and hands it to
//! [`load_section`]; a section absent from every source falls back to its
//! `Default` implementation.

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Default config file prefix (`meshprobe.toml`, `meshprobe.yaml`, ...).
pub const DEFAULT_FILE_PREFIX: &str = "meshprobe";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MESHPROBE";

/// Build the layered configuration source.
pub fn build(file_prefix: &str) -> Result<config::Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

/// Load one named section, falling back to defaults when it is absent.
pub fn load_section<T>(file_prefix: &str, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let cfg = build(file_prefix)?;
    from_config(&cfg, section)
}

/// Extract one named section from an already built configuration.
pub fn from_config<T>(cfg: &config::Config, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => {
            tracing::debug!(section, "Config section not found, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}
