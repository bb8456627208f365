// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! crib - process harness CLI
//!
//! Launches a configured unit of work under the supervising harness, either
//! in the current environment or inside a named isolated runtime.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crib_launcher::{EnvSwitchingLauncher, RepoLauncher};

#[derive(Parser)]
#[command(
    name = "crib",
    version,
    about = "Process harness: supervises a unit of work behind an HTTP control plane"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check out, select an entry point, and launch; switches into the
    /// configured isolated runtime when the config names one
    Launch {
        /// Inline JSON config, a path to a config file, or a consul
        /// descriptor
        #[arg(long)]
        config: String,
        /// Exit with the child's code instead of reporting it
        #[arg(long)]
        exit_on_completion: bool,
    },

    /// Launch in the current environment (used by the env switcher itself)
    LaunchFile {
        #[arg(long)]
        config: String,
    },

    /// Print the ranked entry points of a source file
    Scan {
        file: PathBuf,
        /// Check that this entry point would be selected
        #[arg(long)]
        entry_point: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Launch {
            config,
            exit_on_completion,
        } => {
            let code = EnvSwitchingLauncher::launch(config.as_str())?;
            if exit_on_completion {
                std::process::exit(code);
            }
            println!("exit code: {code}");
            Ok(())
        }

        Commands::LaunchFile { config } => {
            let code = RepoLauncher::launch(config.as_str())?;
            std::process::exit(code);
        }

        Commands::Scan { file, entry_point } => {
            let report = crib_scan::scan(&file)?;
            for ep in &report.entry_points {
                println!("[{}] {:<12} {}", ep.priority, ep.name, ep.description);
            }
            if let Some(requested) = entry_point.as_deref() {
                let chosen = crib_scan::select(&report.entry_points, Some(requested))?;
                println!("selected: {}", chosen.name);
            }
            Ok(())
        }
    }
}
