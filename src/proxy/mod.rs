//
// src/proxy/mod.rs
//
mod backend;
mod proxy;

pub use backend::{BackendClient, BackendOutcome, HttpBackend, USER_AGENT};
pub use proxy::{forwarded_params, ErrorKind, Proxy, ProxyError, API_ENDPOINT};
