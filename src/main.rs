use clap::{Arg, Command};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use mimir::config::MimirConfig;
use mimir::error::ConfigError;
use mimir::server;
use mimir::stats::{self, ChannelSink, StatsRecorder};
use mimir::zone::FileZoneProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("mimir")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Minimal authoritative UDP DNS responder")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDRESS")
                .help("Host address to bind"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("UDP port to bind"),
        )
        .get_matches();

    let mut config = MimirConfig::from_env()?;

    if let Some(host) = matches.get_one::<String>("host") {
        let addr = format!("{}:{}", host, config.bind_addr.port());
        config.bind_addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(addr))?;
    }
    if let Some(port) = matches.get_one::<String>("port") {
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(port.clone()))?;
        config.bind_addr.set_port(port);
    }

    let provider = FileZoneProvider::new(&config.zone_file_path);
    provider.ensure_exists()?;

    let recorder = Arc::new(StatsRecorder::open(&config.stats_file_path)?);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let sink = Arc::new(ChannelSink::new(event_tx));

    let (shutdown_tx, _) = broadcast::channel(1);

    let stats_task = tokio::spawn(stats::run_stats_recorder(
        recorder,
        event_rx,
        config.stats_flush_interval,
        shutdown_tx.subscribe(),
    ));

    let server_shutdown = shutdown_tx.subscribe();
    let mut server_task = tokio::spawn(server::run_udp_server(
        config,
        Arc::new(provider),
        sink,
        server_shutdown,
    ));

    let server_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            let _ = shutdown_tx.send(());
            server_task.await
        }
        result = &mut server_task => {
            let _ = shutdown_tx.send(());
            result
        }
    };

    if let Err(e) = stats_task.await {
        warn!("Stats recorder task failed: {}", e);
    }

    server_result??;
    info!("Shutdown complete");
    Ok(())
}
