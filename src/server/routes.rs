// src/server/routes.rs
use hyper::Method;

/// Endpoint label for requests that matched no route.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Health,
    Metrics,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMiss {
    NotFound,
    MethodNotAllowed,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Root, Route::Health, Route::Metrics, Route::Api];

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Health => "/health",
            Route::Metrics => "/metrics",
            Route::Api => "/api",
        }
    }

    /// Label used for the `endpoint` dimension of request metrics.
    pub fn endpoint(self) -> &'static str {
        match self {
            Route::Root => "root",
            Route::Health => "health",
            Route::Metrics => "metrics",
            Route::Api => "api",
        }
    }

    /// Every route only answers GET.
    pub fn resolve(method: &Method, path: &str) -> Result<Route, RouteMiss> {
        let route = Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .ok_or(RouteMiss::NotFound)?;

        if method == Method::GET {
            Ok(route)
        } else {
            Err(RouteMiss::MethodNotAllowed)
        }
    }

    pub fn endpoint_for(method: &Method, path: &str) -> &'static str {
        Self::resolve(method, path)
            .map(Route::endpoint)
            .unwrap_or(UNKNOWN_ENDPOINT)
    }
}
