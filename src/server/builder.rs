// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::{bail, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Service;

/// Builder pattern so `main.rs` can inject the instrumented service stack.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    listener: Option<TcpListener>,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            listener: None,
            handler: None,
        }
    }

    /// Serve on an already bound socket (e.g. port 0 in tests).
    pub fn from_listener(listener: TcpListener) -> Result<Self> {
        let addr = listener.local_addr()?;
        Ok(Self {
            addr,
            listener: Some(listener),
            handler: None,
        })
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Serve until the process is killed.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `signal` resolves. Connections already
    /// accepted keep running on their own tasks.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Some(handler) = self.handler else {
            bail!("handler must be set via with_handler()");
        };

        let listener = match self.listener {
            Some(listener) => listener,
            None => bind_tcp(self.addr).await?,
        };
        tracing::info!("HTTP server listening on {}", self.addr);

        tokio::pin!(signal);
        loop {
            tokio::select! {
                _ = &mut signal => {
                    tracing::info!("Stopped accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            tracing::warn!(%err, "accept failed");
                            continue;
                        }
                    };
                    let svc = handler.clone();

                    // One Tokio task per connection.
                    tokio::spawn(async move {
                        let http = Http::new();
                        if let Err(err) = http.serve_connection(stream, svc).await {
                            tracing::warn!(%peer, %err, "connection error");
                        }
                    });
                }
            }
        }
    }
}
