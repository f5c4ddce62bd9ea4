//! # cleanout-sync
//!
//! Command-line driver for the Cleanout offline sync queue.
//!
//! ## Commands
//!
//! - `enqueue`: Queue a room upload, job, customer or delete
//! - `status`: Show pending operations
//! - `sync`: Replay the queue once
//! - `watch`: Replay whenever the backend is reachable
//! - `clear`: Drop synced (or all) operations
//! - `login` / `logout`: Manage the backend auth token
//!
//! ## Example
//!
//! ```bash
//! # Capture a room while offline
//! cleanout-sync enqueue room --job J1 --name Garage --number 3 --image garage.jpg
//!
//! # See what is waiting
//! cleanout-sync status --verbose
//!
//! # Replay once the backend is back
//! cleanout-sync sync
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod app;
mod commands;
mod config;

use app::App;
use commands::{clear, enqueue, login, status, sync, watch};
use config::Config;

/// Command-line driver for the Cleanout offline sync queue.
#[derive(Parser, Debug)]
#[command(name = "cleanout-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the queue, token and config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/cleanout-sync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    log_level: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue an operation for later replay
    Enqueue {
        #[command(subcommand)]
        what: enqueue::EnqueueCommand,
    },

    /// Show pending operations
    Status {
        /// List every pending operation
        #[arg(long)]
        verbose: bool,
    },

    /// Replay the queue once
    Sync,

    /// Check connectivity periodically and replay when online
    Watch {
        /// Seconds between checks (default: from config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Drop synced operations
    Clear {
        /// Discard the whole queue, including pending operations
        #[arg(long)]
        all: bool,
    },

    /// Store the backend auth token
    Login {
        /// Bearer token
        #[arg(long)]
        token: String,
    },

    /// Remove the stored auth token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let config = Config::load(cli.config.as_deref(), &data_dir)?;
    let app = App::open(config, &data_dir).await?;

    match cli.command {
        Commands::Enqueue { what } => {
            enqueue::run(&app.service, what).await?;
        }
        Commands::Status { verbose } => {
            status::run(&app.service, verbose).await?;
        }
        Commands::Sync => {
            sync::run(&app.service).await?;
        }
        Commands::Watch { interval } => {
            let every = match interval {
                Some(secs) => Duration::from_secs(secs.max(1)),
                None => app.config.monitor.interval(),
            };
            watch::run(app.service.clone(), every).await?;
        }
        Commands::Clear { all } => {
            clear::run(&app.service, all).await?;
        }
        Commands::Login { token } => {
            login::login(app.kv.as_ref(), &token).await?;
        }
        Commands::Logout => {
            login::logout(app.kv.as_ref()).await?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "cleanout_sync=info",
        1 => "cleanout_sync=debug",
        _ => "cleanout_sync=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for cleanout-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "cleanoutpro", "cleanout-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_enqueue_room() {
        let cli = Cli::parse_from([
            "cleanout-sync",
            "enqueue",
            "room",
            "--job",
            "J1",
            "--name",
            "Garage",
            "--number",
            "3",
            "--image",
            "garage.jpg",
        ]);
        match cli.command {
            Commands::Enqueue {
                what: enqueue::EnqueueCommand::Room { job, number, .. },
            } => {
                assert_eq!(job, "J1");
                assert_eq!(number, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn verbosity_flag_is_global() {
        let cli = Cli::parse_from(["cleanout-sync", "status", "-vv", "--verbose"]);
        assert_eq!(cli.log_level, 2);
        assert!(matches!(cli.command, Commands::Status { verbose: true }));
    }

    #[test]
    fn rejects_unknown_entity_for_delete() {
        let result = Cli::try_parse_from(["cleanout-sync", "enqueue", "delete", "truck", "T1"]);
        assert!(result.is_err());
    }
}
