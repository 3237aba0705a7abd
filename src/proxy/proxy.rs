// ────────────────────────────────
// src/proxy/proxy.rs
// The /api handler: forwards the query string to the backend and relays
// the result, classifying every failure into a status code and metric label.
// ────────────────────────────────

use hyper::{Body, Response, StatusCode, Uri};
use std::sync::Arc;
use tracing::{error, info};

use super::backend::{BackendClient, BackendOutcome, HttpBackend};
use crate::config::Config;
use crate::error::AppError;
use crate::metrics::{MetricsCollector, Timer};
use crate::server::response;

/// Endpoint label used for errors raised by the proxy handler.
pub const API_ENDPOINT: &str = "api";

/// `error_type` label on `errors_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Timeout,
    Connection,
    Http,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection_error",
            ErrorKind::Http => "http_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

pub struct Proxy {
    backend_url: Option<String>,
    client: Arc<dyn BackendClient>,
    metrics: Arc<MetricsCollector>,
}

impl Proxy {
    pub fn new(
        backend_url: Option<String>,
        client: Arc<dyn BackendClient>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            backend_url,
            client,
            metrics,
        }
    }

    /// Build the proxy with a real HTTP client from startup configuration.
    pub fn from_config(config: &Config, metrics: Arc<MetricsCollector>) -> Result<Self, ProxyError> {
        let client = HttpBackend::new(config.backend_timeout())?;
        Ok(Self::new(
            config.backend_url().map(str::to_owned),
            Arc::new(client),
            metrics,
        ))
    }

    pub async fn handle(&self, uri: &Uri) -> Result<Response<Body>, AppError> {
        self.forward(uri.query()).await
    }

    /// Forward `query` to the backend. Exactly one attempt is made.
    pub async fn forward(&self, query: Option<&str>) -> Result<Response<Body>, AppError> {
        let Some(backend_url) = self.backend_url.as_deref() else {
            self.record_error(ErrorKind::Config);
            error!("BACKEND environment variable not set");
            return response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Backend URL not configured",
            );
        };

        info!(backend = %backend_url, "Forwarding request");
        let params = forwarded_params(query);

        let timer = Timer::new();
        let result = self.client.fetch(backend_url, &params).await;
        self.metrics
            .observe_backend_duration(backend_url, timer.elapsed());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_error(ErrorKind::Unknown);
                error!(error = %e, "Unexpected error");
                return response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };

        self.metrics
            .record_backend_request(&outcome.status_label(), backend_url);

        match outcome {
            BackendOutcome::Timeout => {
                self.record_error(ErrorKind::Timeout);
                error!(backend = %backend_url, "Request to backend timed out");
                response::error(StatusCode::GATEWAY_TIMEOUT, "Backend request timed out")
            }
            BackendOutcome::ConnectionFailure => {
                self.record_error(ErrorKind::Connection);
                error!(backend = %backend_url, "Could not connect to backend");
                response::error(StatusCode::BAD_GATEWAY, "Could not connect to backend")
            }
            BackendOutcome::HttpStatusError(status) => {
                self.record_error(ErrorKind::Http);
                error!(backend = %backend_url, %status, "Backend returned HTTP error");
                response::error(status, &format!("Backend error: {}", status.as_u16()))
            }
            BackendOutcome::Success { status, body } => {
                match serde_json::from_slice::<serde_json::Value>(&body) {
                    Ok(value) => response::json(status, &value),
                    Err(_) => response::bytes(status, response::PLAIN_TEXT, body),
                }
            }
        }
    }

    fn record_error(&self, kind: ErrorKind) {
        self.metrics.record_error(kind.as_str(), API_ENDPOINT);
    }
}

/// Flatten a raw query string into unique keys, keeping the first value
/// given for a repeated key and the order keys first appeared in.
pub fn forwarded_params(query: Option<&str>) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    let Some(query) = query else {
        return params;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if params.iter().any(|(existing, _)| *existing == key) {
            continue;
        }
        params.push((key.into_owned(), value.into_owned()));
    }
    params
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsRegistry;
    use async_trait::async_trait;
    use hyper::body::to_bytes;
    use mockito::Matcher;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct Fixture {
        registry: MetricsRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: MetricsRegistry::new().unwrap(),
            }
        }

        fn http_proxy(&self, backend: Option<String>, timeout: Duration) -> Proxy {
            let client = HttpBackend::new(timeout).unwrap();
            Proxy::new(backend, Arc::new(client), self.registry.collector())
        }

        fn errors(&self, kind: &str) -> u64 {
            self.registry
                .collector()
                .errors_total
                .with_label_values(&[kind, API_ENDPOINT])
                .get()
        }

        fn backend_requests(&self, status: &str, url: &str) -> u64 {
            self.registry
                .collector()
                .backend_requests_total
                .with_label_values(&[status, url])
                .get()
        }

        fn backend_observations(&self, url: &str) -> u64 {
            self.registry
                .collector()
                .backend_request_duration_seconds
                .with_label_values(&[url])
                .get_sample_count()
        }
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_backend_is_a_config_error() {
        let fx = Fixture::new();
        let proxy = fx.http_proxy(None, Duration::from_secs(1));

        let response = proxy.forward(Some("x=1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Backend URL not configured"})
        );
        assert_eq!(fx.errors("config_error"), 1);
        let text = String::from_utf8(fx.registry.gather().unwrap()).unwrap();
        assert!(!text.contains("backend_requests_total{"));
    }

    #[tokio::test]
    async fn json_success_is_relayed() {
        let fx = Fixture::new();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("x".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"y":2}"#)
            .create_async()
            .await;
        let url = server.url();
        let proxy = fx.http_proxy(Some(url.clone()), Duration::from_secs(5));

        let response = proxy.forward(Some("x=1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], response::JSON);
        assert_eq!(body_json(response).await, json!({"y": 2}));
        assert_eq!(fx.backend_requests("200", &url), 1);
        assert_eq!(fx.backend_observations(&url), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_json_success_is_relayed_as_text() {
        let fx = Fixture::new();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(202)
            .with_body("plain words")
            .create_async()
            .await;
        let proxy = fx.http_proxy(Some(server.url()), Duration::from_secs(5));

        let response = proxy.forward(None).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], response::PLAIN_TEXT);
        let bytes = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"plain words");
    }

    #[tokio::test]
    async fn backend_error_status_passes_through() {
        let fx = Fixture::new();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;
        let url = server.url();
        let proxy = fx.http_proxy(Some(url.clone()), Duration::from_secs(5));

        let response = proxy.forward(None).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Backend error: 404"}));
        assert_eq!(fx.errors("http_error"), 1);
        assert_eq!(fx.backend_requests("404", &url), 1);
    }

    #[tokio::test]
    async fn unreachable_backend_is_bad_gateway() {
        let fx = Fixture::new();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let proxy = fx.http_proxy(Some(url.clone()), Duration::from_secs(5));

        let response = proxy.forward(None).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Could not connect to backend"})
        );
        assert_eq!(fx.errors("connection_error"), 1);
        assert_eq!(fx.backend_requests("connection_error", &url), 1);
    }

    #[tokio::test]
    async fn slow_backend_is_gateway_timeout() {
        let fx = Fixture::new();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        let proxy = fx.http_proxy(Some(url.clone()), Duration::from_millis(200));

        let response = proxy.forward(None).await.unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Backend request timed out"})
        );
        assert_eq!(fx.errors("timeout"), 1);
        assert_eq!(fx.backend_requests("timeout", &url), 1);
        assert_eq!(fx.backend_observations(&url), 1);
        hold.abort();
    }

    struct FailingClient;

    #[async_trait]
    impl BackendClient for FailingClient {
        async fn fetch(
            &self,
            _url: &str,
            _query: &[(String, String)],
        ) -> Result<BackendOutcome, ProxyError> {
            Err(ProxyError::Other("decoder exploded".into()))
        }
    }

    #[tokio::test]
    async fn unexpected_failure_skips_backend_counter() {
        let fx = Fixture::new();
        let url = "http://backend.test/".to_string();
        let proxy = Proxy::new(
            Some(url.clone()),
            Arc::new(FailingClient),
            fx.registry.collector(),
        );

        let response = proxy.forward(None).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "Internal server error"}));
        assert_eq!(fx.errors("unknown"), 1);
        let text = String::from_utf8(fx.registry.gather().unwrap()).unwrap();
        assert!(!text.contains("backend_requests_total{"));
    }

    #[test]
    fn first_value_wins_for_repeated_keys() {
        let params = forwarded_params(Some("a=1&b=two%20words&a=3&c"));
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two words".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
        assert!(forwarded_params(None).is_empty());
    }

    proptest! {
        #[test]
        fn forwarded_keys_are_unique_and_keep_first_value(
            pairs in proptest::collection::vec(("[a-d]{1,2}", "[a-z0-9]{0,4}"), 0..12)
        ) {
            let query = pairs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            let params = forwarded_params(Some(&query));

            for (i, (key, value)) in params.iter().enumerate() {
                prop_assert!(params[i + 1..].iter().all(|(other, _)| other != key));
                let first = pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v);
                prop_assert_eq!(Some(value), first);
            }
            let mut distinct: Vec<&String> = pairs.iter().map(|(k, _)| k).collect();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(params.len(), distinct.len());
        }
    }
}
