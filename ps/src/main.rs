use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use planstore::Store;
use planstore::cli::{Cli, Command, default_store_dir};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let dir = cli.dir.unwrap_or_else(default_store_dir);

    info!("planstore starting");

    match cli.command {
        Command::Init { force } => {
            let store = Store::init(&dir, force).context("Failed to initialize store")?;
            println!("{} Initialized store at {}", "✓".green(), store.dir().display().to_string().cyan());
        }
        Command::Status => {
            let store = Store::open(&dir).context("Failed to open store")?;
            let counts = store.counts().context("Failed to read counts")?;
            println!("Store: {}", store.dir().display().to_string().cyan());
            println!("  Plannings: {}", counts.plannings);
            println!("  Options:   {}", counts.options);
            println!("  Votes:     {}", counts.votes);
        }
    }

    Ok(())
}
