//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runway - See how far your money goes
#[derive(Parser)]
#[command(name = "runway")]
#[command(about = "Cash-flow projection, risk scoring and spending recommendations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Financial snapshot (JSON)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Transaction history CSV, merged into the snapshot
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Override the snapshot date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub as_of: Option<String>,

    /// Engine config file (defaults to the data-dir override, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Project the balance day by day
    Project {
        /// Days to project (defaults to the snapshot's horizon; ignored when
        /// current-month history selects the month-end projection)
        #[arg(short, long)]
        days: Option<i64>,

        /// Only show days that fall below the emergency buffer
        #[arg(long)]
        risk_only: bool,
    },

    /// Forecast month end and the months after
    Forecast {
        /// Months to roll forward
        #[arg(short, long, default_value = "3")]
        months: u32,
    },

    /// Show the risk score and stress level
    Risk,

    /// Generate spending recommendations
    Recommend {
        /// Which rules to run: budget, transactions, all
        #[arg(long, default_value = "all")]
        variant: String,
    },

    /// Simulate a hypothetical purchase
    WhatIf {
        /// Amount to spend
        #[arg(short, long)]
        amount: f64,

        /// Day offset from the snapshot date
        #[arg(short, long, default_value = "0")]
        day: i64,

        /// Spread the amount evenly over this many days
        #[arg(long)]
        duration: Option<u32>,

        /// Spending category (informational)
        #[arg(short, long, default_value = "")]
        category: String,
    },

    /// Show the effective engine configuration
    Config {
        /// Print the override file location instead
        #[arg(long)]
        path: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}
