//! Receiver configuration.
//!
//! Every value is a fixed constant in production. The builders exist so tests
//! can bind an ephemeral port and write into a temporary directory.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Port the receiver listens on.
pub const DEFAULT_PORT: u16 = 8080;

/// Path alerts are posted to.
pub const ALERTS_PATH: &str = "/alerts";

/// Time allowed to read a request's headers and body.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed between reading a request's headers and finishing its response.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Time in-flight connections get to finish after shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Directory the daily log files are written to.
pub const DEFAULT_LOG_DIR: &str = "/var/log";

/// Configuration for the alert receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Path the alert handler is routed on.
    pub alerts_path: &'static str,
    /// Bound on reading request headers and body.
    pub read_timeout: Duration,
    /// Bound on handling a request once its headers are read.
    pub write_timeout: Duration,
    /// Bound on waiting for in-flight connections during shutdown.
    pub shutdown_grace: Duration,
    /// Directory holding the daily log files.
    pub log_dir: PathBuf,
}

impl ReceiverConfig {
    /// Create a configuration with the production defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            alerts_path: ALERTS_PATH,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }

    /// Set the bind address.
    #[must_use]
    pub const fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Set the log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::new()
    }
}
