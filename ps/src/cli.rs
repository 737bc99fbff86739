//! CLI command definitions for the planstore binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PlanStore - storage tooling for the planning daemon
#[derive(Parser)]
#[command(
    name = "planstore",
    about = "Inspect and initialize plandaemon storage",
    version
)]
pub struct Cli {
    /// Store directory (defaults to the daemon's data directory)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Create a fresh, empty store
    Init {
        /// Wipe an existing database instead of keeping it
        #[arg(long)]
        force: bool,
    },

    /// Show row counts for an existing store
    Status,
}

/// Default store directory: `<data dir>/plandaemon/store`.
pub fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plandaemon")
        .join("store")
}
