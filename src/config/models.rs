// src/config/models.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Immutable process configuration, built once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the single upstream. `None` is a valid, degraded state.
    #[serde(default)]
    pub backend: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backend_timeout_secs() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            port: DEFAULT_PORT,
            debug: false,
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.backend_timeout_secs == 0 {
            bail!("BACKEND_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }

    /// The configured backend URL, treating blank values as unset.
    pub fn backend_url(&self) -> Option<&str> {
        self.backend
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        ([0, 0, 0, 0], self.port).into()
    }
}
