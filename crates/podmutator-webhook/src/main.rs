//! podmutator - Pod mutating admission webhook

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use podmutator_webhook::{
    init_tracing, load_mutation_config, start_server, ConfigPaths, FsConfigSource, LogFormat,
    ServerConfig, WebhookState,
};

/// Mutating admission webhook that injects labels, node selectors and
/// topology spread constraints into Pods
#[derive(Parser, Debug)]
#[command(name = "podmutator", version, about, long_about = None)]
struct Cli {
    /// Address to serve HTTPS on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8443")]
    listen_addr: SocketAddr,

    /// PEM certificate presented to the API server
    #[arg(long, env = "TLS_CERT_FILE", default_value = "/etc/webhook/certs/tls.crt")]
    tls_cert: PathBuf,

    /// PEM private key for the certificate
    #[arg(long, env = "TLS_KEY_FILE", default_value = "/etc/webhook/certs/tls.key")]
    tls_key: PathBuf,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    config: ConfigPaths,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    // Both ring and aws-lc-rs can end up linked; pick one explicitly
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = load_mutation_config(&FsConfigSource, &cli.config);
    info!(
        labels = ?config.labels,
        node_selector = ?config.node_selector,
        pod_selector = ?config.pod_selector,
        topology_spread_constraints = config.topology_spread_constraints.len(),
        "Loaded mutation config"
    );

    let server = ServerConfig {
        addr: cli.listen_addr,
        cert_path: cli.tls_cert,
        key_path: cli.tls_key,
    };

    start_server(server, Arc::new(WebhookState::new(config))).await?;
    Ok(())
}
