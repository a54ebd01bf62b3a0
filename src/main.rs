use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdns::{config::DnsConfig, resolver::DnsResolver, server::run_udp_server};

/// Recursive DNS resolver that walks delegations from a root server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on (overrides WALKDNS_UDP_IP / WALKDNS_UDP_PORT)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Root server to start every resolution from (hostname or IP)
    #[arg(short, long)]
    root_server: Option<String>,

    /// Upstream query timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Maximum delegation steps per resolution chain
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Maximum nesting of name server sub-resolutions
    #[arg(long)]
    max_depth: Option<usize>,

    /// Log filter used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut DnsConfig) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(root_server) = &self.root_server {
            config.root_server = root_server.clone();
        }
        if let Some(timeout) = self.timeout {
            config.upstream_timeout = Duration::from_secs(timeout);
        }
        if self.max_iterations.is_some() {
            config.max_iterations = self.max_iterations;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = DnsConfig::from_env()?;
    args.apply(&mut config);
    config.validate()?;

    if !config.udp_enabled {
        warn!("UDP listener disabled, nothing to do");
        return Ok(());
    }

    let resolver = Arc::new(DnsResolver::new(config.clone()));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    run_udp_server(config, resolver, shutdown_rx).await
}
