// src/health/mod.rs
mod status;

pub use status::{HealthStatus, ServiceInfo, SERVICE_NAME, SERVICE_VERSION};

use hyper::{Body, Response, StatusCode};

use crate::error::AppError;
use crate::server::response;

pub fn health_response() -> Result<Response<Body>, AppError> {
    response::json(StatusCode::OK, &HealthStatus::healthy())
}

pub fn info_response() -> Result<Response<Body>, AppError> {
    response::json(StatusCode::OK, &ServiceInfo::current())
}
