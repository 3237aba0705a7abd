// src/health/status.rs
use serde::Serialize;
use std::collections::BTreeMap;

pub const SERVICE_NAME: &str = "simple-rest-python";
pub const SERVICE_VERSION: &str = "1.0";

/// Body of `GET /health`. The service never checks its backend here.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            service: SERVICE_NAME,
            version: SERVICE_VERSION,
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl ServiceInfo {
    pub fn current() -> Self {
        let endpoints = BTreeMap::from([
            ("/api", "Proxy endpoint - forwards to backend API"),
            ("/health", "Health check endpoint"),
            ("/metrics", "Prometheus metrics endpoint"),
        ]);

        Self {
            service: SERVICE_NAME,
            version: SERVICE_VERSION,
            endpoints,
        }
    }
}
