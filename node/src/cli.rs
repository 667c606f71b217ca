//! # CLI Interface
//!
//! Defines the command-line argument structure for `nexus-node` using
//! `clap` derive. Three subcommands: `run`, `validate` and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Nexus cross-chain vault devnet.
///
/// Runs every chain of a topology in one process, relays legs between
/// them, serves a JSON API for deposits, withdrawals and refunds, and
/// exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "nexus-node",
    about = "Nexus cross-chain vault devnet",
    version,
    propagate_version = true
)]
pub struct NexusNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Nexus node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the devnet and its API.
    Run(RunArgs),
    /// Load a topology file, build the network from it and report problems.
    Validate(ValidateArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to a JSON topology file.
    ///
    /// When omitted, the built-in three-chain devnet is used.
    #[arg(long, short = 't', env = "NEXUS_TOPOLOGY")]
    pub topology: Option<PathBuf>,

    /// Port for the JSON API.
    #[arg(long, env = "NEXUS_API_PORT", default_value_t = 8645)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "NEXUS_METRICS_PORT", default_value_t = 8646)]
    pub metrics_port: u16,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "NEXUS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// How often the relayer delivers pending legs, in milliseconds.
    ///
    /// Zero disables the relayer; legs then move only on `POST /deliver`.
    #[arg(long, env = "NEXUS_RELAY_INTERVAL_MS", default_value_t = 1_000)]
    pub relay_interval_ms: u64,
}

/// Arguments for the `validate` subcommand.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the JSON topology file to check.
    #[arg(env = "NEXUS_TOPOLOGY")]
    pub topology: PathBuf,
}
