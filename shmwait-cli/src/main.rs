// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shmwait CLI
//!
//! Command-line interface for shared-memory wait sets.

use clap::{Parser, Subcommand};

mod commands;

/// Shmwait - cross-process wait sets over shared memory
#[derive(Parser)]
#[command(name = "shmwait")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "shmwait.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// Create the configured wait set and print events until Ctrl+C
    Listen {
        /// Print each event as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Notify one slot of a wait set segment
    Notify {
        /// Segment name of the wait set
        segment: String,

        /// Slot index to notify
        slot: u32,

        /// Number of notifications to send
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },

    /// Show the slot table of a wait set segment
    Inspect {
        /// Segment name of the wait set
        segment: String,

        /// Also list free slots
        #[arg(short, long)]
        all: bool,
    },

    /// Remove a segment left behind by a listener that did not shut down
    Clean {
        /// Segment name of the wait set
        segment: String,
    },

    /// Run an in-process demo with user triggers and a timer
    Demo {
        /// Number of wake-ups to print before exiting
        #[arg(short, long, default_value_t = 10)]
        rounds: usize,

        /// Timer period in milliseconds
        #[arg(long, default_value_t = 250)]
        period_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Listen { json } => commands::listen::execute(&cli.config, json).await,
        Commands::Notify {
            segment,
            slot,
            count,
        } => commands::notify::execute(&segment, slot, count).await,
        Commands::Inspect { segment, all } => commands::inspect::execute(&segment, all).await,
        Commands::Clean { segment } => commands::clean::execute(&segment).await,
        Commands::Demo { rounds, period_ms } => commands::demo::execute(rounds, period_ms).await,
    }
}
