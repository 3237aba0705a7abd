pub mod builder;
pub mod handler;
pub mod listener;
pub mod middleware;
pub mod response;
pub mod routes;

pub use builder::ServerBuilder;
pub use handler::RequestHandler;
pub use middleware::{MetricsLayer, MetricsService};
pub use routes::{Route, RouteMiss, UNKNOWN_ENDPOINT};

use tower::ServiceBuilder;

use crate::state::AppState;

/// The full service stack: routing wrapped in request instrumentation.
pub fn build_service(state: AppState) -> MetricsService<RequestHandler> {
    let metrics = state.metrics.collector();
    ServiceBuilder::new()
        .layer(MetricsLayer::new(metrics))
        .service(RequestHandler::new(state))
}
