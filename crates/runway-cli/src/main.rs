//! Runway CLI - Cash-flow projection and spending advice
//!
//! Usage:
//!   runway --snapshot me.json project            Day-by-day balance
//!   runway --history bank.csv forecast           Month end from history
//!   runway --snapshot me.json what-if -a 20000   Try a purchase
//!   runway serve --port 3000                     Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(config, &host, port, allowed_origins).await,
        Commands::Config { path } => commands::cmd_config(&config, path, cli.json),
        command => {
            let snapshot = commands::load_snapshot(
                cli.snapshot.as_deref(),
                cli.history.as_deref(),
                cli.as_of.as_deref(),
            )?;

            match command {
                Commands::Project { days, risk_only } => {
                    commands::cmd_project(&snapshot, &config, days, risk_only, cli.json)
                }
                Commands::Forecast { months } => {
                    commands::cmd_forecast(&snapshot, &config, months, cli.json)
                }
                Commands::Risk => commands::cmd_risk(&snapshot, &config, cli.json),
                Commands::Recommend { variant } => {
                    commands::cmd_recommend(&snapshot, &config, &variant, cli.json)
                }
                Commands::WhatIf {
                    amount,
                    day,
                    duration,
                    category,
                } => commands::cmd_what_if(
                    &snapshot,
                    &config,
                    amount,
                    day,
                    duration,
                    &category,
                    cli.json,
                ),
                Commands::Serve { .. } | Commands::Config { .. } => Ok(()),
            }
        }
    }
}
