//! demos/mock_backend.rs
//! A throwaway upstream to point `BACKEND` at.
//! Run: cargo run --example mock_backend -- <port> [name]
//!
//!   /          JSON echo of the query string
//!   /text      plain text body
//!   /status    replies with `?code=` (default 500)
//!   /hang      never answers (exercises the proxy timeout)

use hyper::{
    header::CONTENT_TYPE,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use rand::Rng;
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;

#[derive(Clone)]
struct BackendState {
    name:        String,
    req_counter: Arc<AtomicU64>,
    base_delay:  u64,
    jitter_ms:   u64,
    fail_pct:    f64,
}

fn query_map(req: &Request<Body>) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn reply(status: StatusCode, content_type: &str, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

// ——————————————————————————————————————————
// Request handler
async fn handle(
    req: Request<Body>,
    state: BackendState,
) -> Result<Response<Body>, Infallible> {
    let n = state.req_counter.fetch_add(1, Ordering::SeqCst) + 1;
    let query = query_map(&req);
    println!("[{}] #{} {} {:?}", state.name, n, req.uri().path(), query);

    match req.uri().path() {
        "/hang" => {
            futures::future::pending::<()>().await;
            unreachable!()
        }
        "/text" => {
            return Ok(reply(
                StatusCode::OK,
                "text/plain",
                format!("hello from {}", state.name),
            ))
        }
        "/status" => {
            let code = query
                .get("code")
                .and_then(|c| c.parse::<u16>().ok())
                .and_then(|c| StatusCode::from_u16(c).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Ok(reply(code, "text/plain", code.to_string()));
        }
        _ => {}
    }

    // Simulate latency
    let delay = state.base_delay + rand::thread_rng().gen_range(0..=state.jitter_ms);
    if delay > 0 {
        sleep(Duration::from_millis(delay)).await;
    }

    // Simulate failure
    if state.fail_pct > 0.0 && rand::thread_rng().gen_bool(state.fail_pct / 100.0) {
        return Ok(reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain",
            "Injected failure".to_string(),
        ));
    }

    let body = serde_json::json!({
        "backend": state.name,
        "req": n,
        "query": query,
        "delay_ms": delay,
    });
    Ok(reply(StatusCode::OK, "application/json", body.to_string()))
}

// ——————————————————————————————————————————
// Main
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "8001".into())
        .parse()?;
    let name = std::env::args()
        .nth(2)
        .unwrap_or_else(|| format!("backend-{port}"));

    let base_delay =
        std::env::var("BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(0);
    let jitter_ms =
        std::env::var("JITTER_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(0);
    let fail_pct =
        std::env::var("FAIL_PCT").ok().and_then(|v| v.parse().ok()).unwrap_or(0.0);

    let state = BackendState {
        name: name.clone(),
        req_counter: Arc::new(AtomicU64::new(0)),
        base_delay,
        jitter_ms,
        fail_pct,
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let make_svc = make_service_fn(move |_conn| {
        let st = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(req, st.clone())))
        }
    });

    println!(
        "Mock backend '{}' on http://{}  [delay={}ms±{} fail={} %]",
        name, addr, base_delay, jitter_ms, fail_pct
    );

    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}
