// src/server/response.rs
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use serde::Serialize;

use crate::error::AppError;

pub const JSON: &str = "application/json";
pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Response<Body>, AppError> {
    let body = serde_json::to_vec(value)?;
    bytes(status, JSON, body)
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, AppError> {
    json(status, &ErrorBody { error: message })
}

pub fn bytes(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Body>,
) -> Result<Response<Body>, AppError> {
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(body.into())?)
}
