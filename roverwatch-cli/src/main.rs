//! Roverwatch CLI - terminal dashboard for the telemetry engine.
//!
//! # Usage
//!
//! ```bash
//! # Simulated rover with the terminal dashboard
//! roverwatch run
//!
//! # Live feed from rosbridge, one JSON snapshot per second
//! roverwatch run --mode live --json
//!
//! # Configuration
//! roverwatch config set transport.url ws://rover.local:9090
//! roverwatch config list
//! ```

mod commands;
mod error;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roverwatch::config::config_file_path;
use roverwatch::source::SourceMode;

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "roverwatch")]
#[command(version, about = "Live map and status dashboard for a ground rover", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.roverwatch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine and the dashboard
    Run {
        /// Telemetry source: simulated or live
        #[arg(long, default_value = "simulated")]
        mode: SourceMode,

        /// Print status lines instead of drawing the dashboard
        #[arg(long)]
        headless: bool,

        /// Print one JSON snapshot per second (implies --headless)
        #[arg(long)]
        json: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file_path);

    let result = match cli.command {
        Commands::Run {
            mode,
            headless,
            json,
            debug,
        } => commands::run::run(RunArgs {
            config_path,
            mode,
            headless,
            json,
            debug,
        }),
        Commands::Config { command } => commands::config::run(command, &config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
