//! HTTP listener and connection lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ReceiverConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AlertHandler;
use crate::writer::LogWriter;

/// Pause after a failed `accept` so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound alert receiver, ready to serve.
#[derive(Debug)]
pub struct AlertServer {
    config: ReceiverConfig,
    listener: TcpListener,
    handler: AlertHandler,
}

impl AlertServer {
    /// Bind the listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the address cannot be bound.
    pub async fn bind(config: ReceiverConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|e| ServerError::BindFailed(config.bind_addr, e))?;

        let writer = Arc::new(LogWriter::new(config.log_dir.clone()));
        let handler = AlertHandler::new(config.alerts_path, writer, config.read_timeout);

        Ok(Self {
            config,
            listener,
            handler,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The receiver configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// The writer alerts are appended through.
    pub fn writer(&self) -> Arc<LogWriter> {
        Arc::clone(self.handler.writer())
    }

    /// Serve connections until `shutdown` flips to `true` or its sender is
    /// dropped.
    ///
    /// After shutdown is requested no new connections are accepted and open
    /// connections are asked to finish their current request. Connections
    /// still open after the grace period are abandoned.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> ServerResult<()> {
        let addr = self.local_addr()?;
        let Self {
            config,
            listener,
            handler,
        } = self;

        info!(
            addr = %addr,
            path = config.alerts_path,
            log_dir = %config.log_dir.display(),
            "alert receiver listening"
        );

        let graceful = GracefulShutdown::new();
        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new())
            .header_read_timeout(config.read_timeout);

        loop {
            tokio::select! {
                accept = listener.accept() => {
                    match accept {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "connection accepted");
                            let handler = handler.clone();
                            let write_timeout = config.write_timeout;
                            let service = service_fn(move |req: Request<Incoming>| {
                                let handler = handler.clone();
                                async move {
                                    tokio::time::timeout(write_timeout, handler.handle(req))
                                        .await
                                        .map_err(|_| ServerError::WriteTimeout(write_timeout))
                                }
                            });
                            let conn = graceful.watch(http.serve_connection(TokioIo::new(stream), service));
                            tokio::spawn(async move {
                                if let Err(e) = conn.await {
                                    // Connection reset / closed by client is normal
                                    if !e.is_incomplete_message() {
                                        warn!(peer = %peer_addr, error = %e, "connection error");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown requested, no longer accepting connections");
                        break;
                    }
                }
            }
        }

        drop(listener);

        tokio::select! {
            () = graceful.shutdown() => {
                info!("all connections closed");
            }
            () = tokio::time::sleep(config.shutdown_grace) => {
                warn!(grace = ?config.shutdown_grace, "grace period elapsed, abandoning open connections");
            }
        }

        Ok(())
    }
}
