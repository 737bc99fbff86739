//! PlanDaemon - group decision engine
//!
//! CLI entry point for running and inspecting planning sessions.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use plandaemon::cli::{Cli, Command, OutputFormat, get_log_path};
use plandaemon::config::Config;
use plandaemon::daemon::DaemonManager;
use plandaemon::engine::PlanningEngine;
use plandaemon::persist::SqliteStore;
use plandaemon::session::Session;
use plandaemon::transport::ConsoleTransport;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file, not stdout - stdout belongs to the console
    // transport.
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Serve { scope, user }) => cmd_serve(&config, scope, user).await,
        Some(Command::Stop) => cmd_stop().await,
        Some(Command::Status) => cmd_status().await,
        Some(Command::List { scope, format }) => cmd_list(&config, scope, format).await,
        Some(Command::Logs { lines }) => cmd_logs(lines).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Run an interactive session bound to the console transport
async fn cmd_serve(config: &Config, scope: Option<String>, user: Option<String>) -> Result<()> {
    let daemon = DaemonManager::new();
    if daemon.is_running() {
        return Err(eyre::eyre!(
            "A session is already running (PID: {})",
            daemon.running_pid().unwrap_or_default()
        ));
    }

    let store_dir = PathBuf::from(&config.storage.store_dir);
    let store = SqliteStore::open(&store_dir).context("Failed to open planning store")?;
    let engine = PlanningEngine::load(Arc::new(store), config.engine.clone()).await?;

    daemon.register_self()?;

    let scope = scope.unwrap_or_else(|| config.transport.scope.clone());
    let user = user
        .or_else(|| config.transport.display_name.clone())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "me".to_string());

    let known = engine.planning_count().await;
    if known > 0 {
        println!("Loaded {} planning(s) from {}", known, store_dir.display());
    }
    println!(
        "Planning session in scope {} as {}. Type {} for commands.",
        scope.cyan(),
        user.cyan(),
        "help".bold()
    );

    let transport = Arc::new(ConsoleTransport::new(engine.clone(), scope, user));
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let mut session = tokio::spawn(Session::new(engine).run(transport, shutdown_rx));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = &mut session => {}
            _ = sigint.recv() => {
                info!("SIGINT received");
                let _ = shutdown_tx.send(()).await;
                let _ = session.await;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received");
                let _ = shutdown_tx.send(()).await;
                let _ = session.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = &mut session => {}
            _ = tokio::signal::ctrl_c() => {
                let _ = shutdown_tx.send(()).await;
                let _ = session.await;
            }
        }
    }

    daemon.clear()?;
    info!("session ended");
    Ok(())
}

/// Stop a running session
async fn cmd_stop() -> Result<()> {
    let daemon = DaemonManager::new();

    if !daemon.is_running() {
        println!("No session is running");
        return Ok(());
    }

    let pid = daemon.running_pid().unwrap_or_default();
    daemon.stop()?;
    println!("Session stopped (was PID: {})", pid);
    Ok(())
}

/// Show session status
async fn cmd_status() -> Result<()> {
    let daemon = DaemonManager::new();
    let status = daemon.status();

    if status.running {
        println!("Status: {}", "running".green());
        println!("PID: {}", status.pid.unwrap_or_default());
    } else {
        println!("Status: {}", "stopped".red());
    }
    println!("PID file: {}", status.pid_file.display());
    Ok(())
}

/// List plannings straight from the store
async fn cmd_list(config: &Config, scope: Option<String>, format: OutputFormat) -> Result<()> {
    let scope = scope.unwrap_or_else(|| config.transport.scope.clone());

    let store_dir = PathBuf::from(&config.storage.store_dir);
    if !store_dir.exists() {
        println!("No store found at {}. Has a session run?", store_dir.display());
        return Ok(());
    }

    let store = SqliteStore::open(&store_dir).context("Failed to open planning store")?;
    let engine = PlanningEngine::load(Arc::new(store), config.engine.clone()).await?;
    let summaries = engine.list(&scope).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Text => {
            if summaries.is_empty() {
                println!("No plannings in scope '{}'", scope);
                return Ok(());
            }
            for (num, summary) in summaries.iter().enumerate() {
                let created = chrono::DateTime::from_timestamp_millis(summary.created_at)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{}  {} voters, created {}  [{}]",
                    summary.short_description(num),
                    summary.participants,
                    created,
                    summary.id.dimmed()
                );
            }
        }
    }

    Ok(())
}

/// Show recent log output
async fn cmd_logs(lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    let file = fs::File::open(&log_path).context("Failed to open log file")?;
    let reader = BufReader::new(file);
    let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    let start = all_lines.len().saturating_sub(lines);
    for line in &all_lines[start..] {
        println!("{}", line);
    }

    Ok(())
}
