// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agrobot - a chat assistant that matches farmers' buy and sell offers.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod seed;
mod shell;

use std::path::PathBuf;

use agrobot_config::model::AgrobotConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Agrobot - matches buy and sell offers for farm produce.
#[derive(Parser, Debug)]
#[command(name = "agrobot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the bot in the terminal.
    Shell,
    /// Load products, measurements and locations into the catalog.
    Seed {
        /// Directory holding the catalog JSON files.
        #[arg(long)]
        data: PathBuf,
    },
    /// Check configuration and catalog health.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => agrobot_config::load_and_validate_path(path),
        None => agrobot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            agrobot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Seed { data }) => seed::run_seed(&config, &data).await,
        Some(Commands::Check { plain }) => check::run_check(&config, plain).await,
        None => {
            println!("agrobot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &AgrobotConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("agrobot={},warn", config.agent.log_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
