// src/server/handler.rs
use hyper::header::{HeaderValue, ALLOW};
use hyper::{Body, Request, Response, StatusCode};
use tower::Service;

use crate::error::AppError;
use crate::health;
use crate::metrics::MetricsRegistry;
use crate::server::response;
use crate::server::routes::{Route, RouteMiss};
use crate::state::AppState;

/// Dispatches a request to the handler of its route.
#[derive(Clone)]
pub struct RequestHandler {
    state: AppState,
}

impl RequestHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = AppError;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        Box::pin(async move { dispatch(state, req).await })
    }
}

async fn dispatch(state: AppState, req: Request<Body>) -> Result<Response<Body>, AppError> {
    match Route::resolve(req.method(), req.uri().path()) {
        Ok(Route::Root) => health::info_response(),
        Ok(Route::Health) => health::health_response(),
        Ok(Route::Metrics) => metrics_response(&state.metrics),
        Ok(Route::Api) => state.proxy.handle(req.uri()).await,
        Err(RouteMiss::NotFound) => response::error(StatusCode::NOT_FOUND, "Not found"),
        Err(RouteMiss::MethodNotAllowed) => {
            let mut response =
                response::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")?;
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            Ok(response)
        }
    }
}

fn metrics_response(registry: &MetricsRegistry) -> Result<Response<Body>, AppError> {
    let body = registry.gather()?;
    response::bytes(StatusCode::OK, registry.content_type(), body)
}
