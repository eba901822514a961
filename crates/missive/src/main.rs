// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Missive - personal messaging backend.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use missive_config::MissiveConfig;

/// Missive - personal messaging backend.
#[derive(Parser, Debug)]
#[command(name = "missive", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the messaging API server.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> MissiveConfig {
    let loaded = match path {
        Some(path) => missive_config::load_and_validate_path(path),
        None => missive_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            missive_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("missive: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            println!("{}", serve::summarize(&config));
        }
        None => {
            println!("missive: use --help for available commands");
        }
    }
}
