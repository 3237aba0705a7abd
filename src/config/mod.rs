// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::collections::HashMap;

/// Environment variables the service reads at startup.
pub const ENV_KEYS: [&str; 4] = ["BACKEND", "PORT", "DEBUG", "BACKEND_TIMEOUT_SECS"];

/// Load configuration from the process environment.
pub fn load_config() -> Result<Config> {
    load_from_vars(std::env::vars())
}

/// Load configuration from an explicit set of `KEY=value` pairs.
///
/// Only the keys in [`ENV_KEYS`] are considered; everything else is ignored
/// so unrelated environment variables can never break startup.
pub fn load_from_vars<I, K, V>(vars: I) -> Result<Config>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let source: HashMap<String, String> = vars
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .filter(|(k, _)| ENV_KEYS.contains(&k.as_str()))
        .collect();

    let environment = ::config::Environment::default()
        .try_parsing(true)
        .source(Some(source));

    let config: Config = ::config::Config::builder()
        .add_source(environment)
        .build()
        .context("Failed to read configuration from environment")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}
