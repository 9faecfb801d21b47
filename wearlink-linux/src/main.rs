// Wearlink Linux host: TCP transport, static discovery, stdio control.

mod config;
mod control;
mod discovery;
mod frame;
mod launcher;
mod transport;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wearlink_core::{Node, NodeId, RelayEngine};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("wearlink-linux {}", VERSION);
            return Ok(());
        }
    }

    let cfg = config::load()?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log filter")?;
    // Logs go to stderr; stdout carries the control protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let peers: HashMap<NodeId, std::net::SocketAddr> = cfg
        .peers
        .iter()
        .map(|p| (NodeId::from(p.id.as_str()), p.addr))
        .collect();
    let transport = Arc::new(transport::TcpTransport::new(
        NodeId::from(cfg.node_id.as_str()),
        peers,
    ));
    let discovery = Arc::new(discovery::StaticDiscovery::new(
        Node::local(cfg.node_id.as_str(), cfg.display_name.clone()),
        cfg.peers.clone(),
    ));
    let engine = RelayEngine::new(
        cfg.engine.clone(),
        transport.clone(),
        discovery,
        Arc::new(launcher::CommandLauncher::new(cfg.launch_command.clone())),
        Arc::new(launcher::ServiceCommand::new(cfg.service_command.clone())),
    );

    let rt = tokio::runtime::Runtime::new().context("starting runtime")?;
    rt.block_on(async {
        let serving = transport.clone();
        let port = cfg.listen_port;
        tokio::spawn(async move {
            if let Err(e) = serving.serve(port).await {
                error!(error = %e, "transport stopped");
            }
        });

        engine.attach().await?;
        let output = Arc::new(control::LineOutput::new(std::io::stdout()));
        if engine.subscribe(output.clone()).is_err() {
            warn!("stdout sink already subscribed");
        }
        info!(node = %cfg.node_id, port, "wearlink host running");

        let control_engine = engine.clone();
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = control::run(&control_engine, stdin, &output).await {
                error!(error = %e, "control channel failed");
            }
            // Application gone: stop events, keep the listener for local commands.
            control_engine.unsubscribe();
            control_engine.detach();
        });

        shutdown_signal().await?;
        engine.teardown().await?;
        info!("shut down");
        anyhow::Ok(())
    })
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
