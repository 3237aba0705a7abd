// ────────────────────────────────
// src/server/middleware.rs
// Request instrumentation: timing, request counters and the
// active-connection gauge around every inbound request.
// ────────────────────────────────
use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::error::internal_error_response;
use crate::metrics::{MetricsCollector, Timer};
use crate::server::routes::Route;

#[derive(Clone)]
pub struct MetricsLayer {
    metrics: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// Never fails: handler errors and panics become a 500 reply, and are
/// counted like any other response.
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    metrics: Arc<MetricsCollector>,
}

impl<S> Service<Request<Body>> for MetricsService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is driven per request by `oneshot`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let metrics = self.metrics.clone();
        let inner = self.inner.clone();
        let method = req.method().as_str().to_owned();
        let endpoint = Route::endpoint_for(req.method(), req.uri().path());
        let span = info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        let fut = async move {
            let in_flight = InFlight::start(metrics.clone());

            let response = match AssertUnwindSafe(inner.oneshot(req)).catch_unwind().await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    error!(error = %e, "Handler failed");
                    internal_error_response()
                }
                Err(_) => {
                    error!("Handler panicked");
                    internal_error_response()
                }
            };

            let status = response.status().as_u16();
            let elapsed = in_flight.elapsed();
            metrics.record_request(&method, endpoint, status, elapsed);
            debug!(status, endpoint, ?elapsed, "Request complete");

            Ok(response)
        };

        Box::pin(fut.instrument(span))
    }
}

/// Holds one unit of `active_connections` for as long as it lives, so the
/// gauge is released even when the request future is dropped mid-flight.
struct InFlight {
    metrics: Arc<MetricsCollector>,
    timer: Timer,
}

impl InFlight {
    fn start(metrics: Arc<MetricsCollector>) -> Self {
        metrics.increment_active_connections();
        Self {
            metrics,
            timer: Timer::new(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.metrics.decrement_active_connections();
    }
}
