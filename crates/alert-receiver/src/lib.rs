//! # alert-receiver
//!
//! Alertmanager webhook receiver that appends every alert as a JSON line to
//! a day-partitioned log file.
//!
//! ## Pipeline
//!
//! ```text
//! POST /alerts ──► AlertPayload ──► LogRecord (per alert) ──► app_hivemq_<date>0001.log
//!                     │                  │                         │
//!                  decode            extract                 append + close
//!              (400 if bad)     (fallback defaults)      (failures swallowed)
//! ```
//!
//! - [`AlertPayload`] / [`Alert`] — decoded webhook body
//! - [`extract`] — hostname / IP / KPI / count / summary with fallbacks
//! - [`LogRecord`] — one line of output
//! - [`LogWriter`] — open-append-close per record, one write per line
//! - [`AlertHandler`] — routing and the request state machine
//! - [`AlertServer`] — listener, timeouts, graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use alert_receiver::{AlertServer, ReceiverConfig};
//!
//! #[tokio::main]
//! async fn main() -> alert_receiver::ServerResult<()> {
//!     let server = AlertServer::bind(ReceiverConfig::default()).await?;
//!     let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let serving = tokio::spawn(server.serve(shutdown_rx));
//!
//!     let _ = tokio::signal::ctrl_c().await;
//!     let _ = shutdown_tx.send(true);
//!     let _ = serving.await;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod record;
pub mod server;
pub mod writer;

// Re-export main types
pub use alert::{Alert, AlertPayload};
pub use config::{
    ALERTS_PATH, DEFAULT_LOG_DIR, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_SHUTDOWN_GRACE,
    DEFAULT_WRITE_TIMEOUT, ReceiverConfig,
};
pub use error::{ServerError, ServerResult, WriteError, WriteResult};
pub use handler::{AlertHandler, record_alerts};
pub use record::LogRecord;
pub use server::AlertServer;
pub use writer::{LogWriter, log_file_name, log_file_path};
