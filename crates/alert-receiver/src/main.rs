//! alert-receiver - Alertmanager webhook to daily JSON log files.
//!
//! Listens on port 8080 for `POST /alerts` and appends one line per alert to
//! `/var/log/app_hivemq_<YYYYMMDD>0001.log`. Ctrl-C shuts down gracefully.

use alert_receiver::{AlertServer, ReceiverConfig};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("alert_receiver=info".parse()?))
        .init();

    let config = ReceiverConfig::default();
    let grace = config.shutdown_grace;
    let server = AlertServer::bind(config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let serving = tokio::spawn(server.serve(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!(grace = ?grace, "received SIGINT, initiating shutdown");
    let _ = shutdown_tx.send(true);

    match serving.await {
        Ok(Ok(())) => info!("alert receiver stopped"),
        Ok(Err(e)) => error!(error = %e, "alert receiver stopped with error"),
        Err(e) => error!(error = %e, "server task failed"),
    }

    Ok(())
}
