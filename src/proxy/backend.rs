// src/proxy/backend.rs
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::StatusCode;
use reqwest::Client;
use std::time::Duration;

use super::ProxyError;

pub const USER_AGENT: &str = "API-Proxy-Service/1.0";

/// What a single forwarding attempt produced.
#[derive(Debug)]
pub enum BackendOutcome {
    /// 1xx-3xx status with the full response body.
    Success { status: StatusCode, body: Bytes },
    Timeout,
    ConnectionFailure,
    /// The backend answered with a 4xx or 5xx status.
    HttpStatusError(StatusCode),
}

impl BackendOutcome {
    /// Value of the `status_code` label on `backend_requests_total`.
    pub fn status_label(&self) -> String {
        match self {
            Self::Success { status, .. } | Self::HttpStatusError(status) => {
                status.as_u16().to_string()
            }
            Self::Timeout => "timeout".to_string(),
            Self::ConnectionFailure => "connection_error".to_string(),
        }
    }
}

/// Outbound call to the backend. `Err` is reserved for failures that fit
/// none of the [`BackendOutcome`] variants.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<BackendOutcome, ProxyError>;
}

/// `reqwest` backed client with a hard per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<BackendOutcome, ProxyError> {
        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => return classify(e),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Ok(BackendOutcome::HttpStatusError(status));
        }

        // The timeout also covers reading the body.
        match response.bytes().await {
            Ok(body) => Ok(BackendOutcome::Success { status, body }),
            Err(e) => classify(e),
        }
    }
}

fn classify(err: reqwest::Error) -> Result<BackendOutcome, ProxyError> {
    // Connect timeouts report both kinds; they count as timeouts.
    if err.is_timeout() {
        Ok(BackendOutcome::Timeout)
    } else if err.is_connect() || err.is_request() {
        Ok(BackendOutcome::ConnectionFailure)
    } else {
        Err(ProxyError::Request(err))
    }
}
