//! HTTPS server for the webhook

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tracing::{info, warn};

use crate::webhook::{webhook_router, WebhookState};

/// Time in-flight admission requests get to finish after a shutdown signal
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// PEM certificate chain served to the API server
    pub cert_path: PathBuf,
    /// PEM private key for `cert_path`
    pub key_path: PathBuf,
}

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Certificate or key could not be loaded
    #[error("TLS config error for {cert} / {key}: {source}")]
    Tls {
        /// Certificate path
        cert: String,
        /// Key path
        key: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The listener failed
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serve the webhook over TLS until SIGINT or SIGTERM
pub async fn start_server(config: ServerConfig, state: Arc<WebhookState>) -> Result<(), ServerError> {
    let app = webhook_router(state);

    let tls_config = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(|source| ServerError::Tls {
            cert: config.cert_path.display().to_string(),
            key: config.key_path.display().to_string(),
            source,
        })?;

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    info!(addr = %config.addr, "Starting webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(ServerError::Serve)?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(grace_period = ?SHUTDOWN_GRACE_PERIOD, "Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
