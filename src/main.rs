//! Binary entry point: load configuration, wire the processor task to
//! its listeners, and run until a shutdown signal arrives. Grounded in
//! the teacher's `main.rs` config-path resolution and SIGINT/SIGTERM
//! graceful-shutdown pattern, narrowed to the handful of tasks spec.md
//! §5/§6 actually name (no database, history, or services layers).

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

use ircd::config::Config;
use ircd::core::{run_processor, CoreEvent, Irc, StatusSnapshot};
use ircd::network::gateway;

/// Resolve the configuration path from CLI arguments: `-c <path>`,
/// `--config <path>`, or a bare path, falling back to `config.toml`.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("missing path after {flag}");
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_owned(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();
    let config: Config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) if Path::new(&config_path).exists() => {
            eprintln!("ERROR: failed to parse config at {config_path}: {e}");
            return Err(e.into());
        }
        Err(_) => {
            eprintln!("no config file at {config_path}, using defaults");
            toml::from_str("").expect("empty TOML parses to all-default Config")
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).init();

    info!(server = %config.server.name, host = %config.server.host, "starting ircd");

    let irc = Irc::new(config.server.host.clone(), config.server.name.clone(), config.server.version.clone(), config.motd.resolve());

    let (events_tx, events_rx) = mpsc::unbounded_channel::<CoreEvent>();

    let status: Option<Arc<RwLock<StatusSnapshot>>> = config.http.as_ref().map(|_| Arc::new(RwLock::new(StatusSnapshot::default())));

    let processor = tokio::spawn(run_processor(irc, events_rx, status.clone()));

    if let Some(http_config) = &config.http {
        let status = status.clone().expect("status snapshot is set up whenever http config is present");
        let addr = http_config.address;
        tokio::spawn(async move {
            if let Err(e) = ircd::http::run(addr, status).await {
                error!(%addr, error = %e, "http status surface failed");
            }
        });
    }

    {
        let host = config.server.host.clone();
        let addr = config.listen.client;
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway::run_client_listener(addr, host, events_tx).await {
                error!(%addr, error = %e, "client listener failed");
            }
        });
    }

    {
        let host = config.server.host.clone();
        let addr = config.listen.link;
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway::run_link_listener(addr, host, events_tx).await {
                error!(%addr, error = %e, "link listener failed");
            }
        });
    }

    if let Some(ws_config) = &config.websocket {
        let host = config.server.host.clone();
        let addr = ws_config.address;
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway::run_websocket_listener(addr, host, events_tx).await {
                error!(%addr, error = %e, "websocket listener failed");
            }
        });
    }

    if let Some(peer_config) = &config.peer {
        let host = config.server.host.clone();
        let server_name = config.server.name.clone();
        let addr = peer_config.address;
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway::connect_peer(addr, host, server_name, events_tx).await {
                error!(%addr, error = %e, "outbound peer connection failed");
            }
        });
    }

    drop(events_tx);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = processor => info!("processor task exited"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = processor.await;
    }

    Ok(())
}
