// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::metrics::MetricsRegistry;
use crate::proxy::{Proxy, ProxyError};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<MetricsRegistry>,
    pub proxy: Arc<Proxy>,
}

impl AppState {
    pub fn new(config: &Config, metrics: Arc<MetricsRegistry>) -> Result<Self, ProxyError> {
        let proxy = Proxy::from_config(config, metrics.collector())?;
        Ok(Self::with_proxy(metrics, proxy))
    }

    pub fn with_proxy(metrics: Arc<MetricsRegistry>, proxy: Proxy) -> Self {
        Self {
            metrics,
            proxy: Arc::new(proxy),
        }
    }
}
