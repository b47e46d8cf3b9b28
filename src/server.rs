//! HTTP server and graceful shutdown.
//!
//! # Shutdown
//!
//! Orchestrators stop a process with **SIGTERM**, then wait out a grace
//! period before killing it. On SIGTERM (or Ctrl-C locally) the server:
//!
//! 1. Stops calling `listener.accept()`. Queued connections are not taken.
//! 2. Lets every connection task already running finish its requests,
//!    including any layout or GraphQL fetch still in progress.
//! 3. Returns from [`Server::serve`] so `main` can exit normally.
//!
//! Editing fetches page through the dictionary and can take several round
//! trips. Set the grace period longer than the slowest of them.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::app::App;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use rendra::Server;
    /// let server = Server::bind("0.0.0.0:3000").unwrap();
    /// ```
    pub fn bind(addr: &str) -> Result<Self> {
        let addr = addr.parse()
            .map_err(|e| Error::Config(format!("invalid socket address `{addr}`: {e}")))?;
        Ok(Self { addr })
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown: a signal arrived and
    /// every in-flight request has been answered.
    pub async fn serve(self, app: App) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;

        // One app, shared read-only by every connection task. Routes, the
        // pipeline and the rendering engine are never cloned per request.
        let app = Arc::new(app);

        info!(addr = %self.addr, stages = ?app.stage_names(), "rendra listening");

        // Every connection task lives in the JoinSet so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        // The signal future is polled on every loop turn, so it has to stay
        // at one address: `tokio::pin!` pins it on this stack frame.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Arms are polled in order, not at random. Shutdown comes
                // first so a pending SIGTERM wins over a queued connection.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    // Bridges tokio's IO traits to hyper's.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on this connection. A
                        // keep-alive connection reuses the same task.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so a long-running server does not
                // keep one JoinSet slot per connection it ever served.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain.
        while tasks.join_next().await.is_some() {}

        info!("rendra stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body and hands the request to the app.
///
/// The error type is [`Infallible`](std::convert::Infallible): an unreadable
/// body becomes a 400, an unknown route a 404 and a failed layout fetch
/// whatever [`IntoResponse`](crate::IntoResponse) maps it to. hyper only
/// ever sees responses.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
) -> std::result::Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let request = Request::from_http(http::Request::from_parts(parts, body));
    Ok(app.handle(request).await.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal.
///
/// Unix listens for both **SIGTERM** (the orchestrator) and **SIGINT**
/// (Ctrl-C while developing). Elsewhere only Ctrl-C exists.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // Never resolves, which disables the SIGTERM arm below.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_rejects_garbage() {
        assert!(matches!(Server::bind("not an address"), Err(Error::Config(_))));
        assert!(Server::bind("127.0.0.1:0").is_ok());
    }
}
