// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Nexus Devnet Node
//!
//! Entry point for the `nexus-node` binary. Parses CLI arguments,
//! initializes logging and metrics, builds the devnet from a topology,
//! starts the relayer and serves the HTTP/WS API.
//!
//! - `run`      — start the devnet
//! - `validate` — check a topology file without serving anything
//! - `version`  — print build version information

mod api;
mod cli;
mod devnet;
mod logging;
mod metrics;
mod topology;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;

use cli::{Commands, NexusNodeCli};
use devnet::Devnet;
use logging::LogFormat;
use metrics::NodeMetrics;
use topology::Topology;

/// Broadcast channel capacity for live event streaming.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NexusNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Validate(args) => validate_topology(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the devnet, the API server, the metrics endpoint and the relayer.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "nexus_node=info,nexus_contracts=info,nexus_protocol=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    // --- Topology ---
    let topology = match &args.topology {
        Some(path) => Topology::load(path)?,
        None => Topology::devnet(),
    };
    tracing::info!(
        name = %topology.name,
        chains = topology.chains.len(),
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        "starting nexus-node"
    );

    let devnet = Devnet::build(&topology).context("failed to build devnet")?;
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            nexus_protocol::config::PROTOCOL_VERSION,
        ),
        devnet: Arc::new(Mutex::new(devnet)),
        event_tx,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = metrics::router(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Relayer ---
    let relayer = (args.relay_interval_ms > 0).then(|| {
        let state = app_state.clone();
        let period = Duration::from_millis(args.relay_interval_ms);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match api::relay(&state) {
                    Ok(reports) if !reports.is_empty() => {
                        tracing::debug!(legs = reports.len(), "relayer flushed");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("relayer failed: {}", e),
                }
            }
        })
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    if let Some(relayer) = relayer {
        relayer.abort();
    }
    tracing::info!("nexus-node stopped");
    Ok(())
}

/// Loads a topology and builds the network from it, then prints a summary.
fn validate_topology(args: cli::ValidateArgs) -> Result<()> {
    logging::init_logging("nexus_node=warn", LogFormat::Pretty);

    let topology = Topology::load(&args.topology)?;
    let devnet = Devnet::build(&topology).context("topology is valid but cannot be deployed")?;
    let status = devnet.status().context("failed to read devnet status")?;

    println!("Topology {} is valid.", args.topology.display());
    println!("  Name      : {}", status.name);
    println!("  Hub chain : {}", status.hub_chain);
    for chain in &status.chains {
        println!(
            "  Chain {:<6}: {:<12} entry={} vaults={}",
            chain.id.to_string(),
            chain.name,
            chain.entry.is_some() || chain.hub,
            chain.vaults
        );
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("nexus-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", nexus_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed the node keeps running until the other signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
