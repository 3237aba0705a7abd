// src/error.rs
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};

pub const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal server error"}"#;

/// Failures while producing a response. None of these are the client's fault.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to encode JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),
}

/// Plain 500 reply that cannot itself fail to build.
pub fn internal_error_response() -> Response<Body> {
    let mut response = Response::new(Body::from(INTERNAL_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn internal_error_is_json_500() {
        let response = internal_error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], INTERNAL_ERROR_BODY.as_bytes());
    }
}
