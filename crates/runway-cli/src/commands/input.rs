//! Input loading and output helpers shared by commands
//!
//! This module contains:
//! - `load_config` - Resolve the engine config (--config, override, built-in)
//! - `load_snapshot` - Build a snapshot from --snapshot / --history / --as-of
//! - `print_json` - Pretty JSON output for --json

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use runway_core::{parse_history_csv, EngineConfig, FinancialSnapshot};
use serde::Serialize;

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(path).context("Failed to load engine config")
}

/// Build the snapshot commands run against
///
/// History rows are appended to any transactions already in the snapshot.
pub fn load_snapshot(
    snapshot: Option<&Path>,
    history: Option<&Path>,
    as_of: Option<&str>,
) -> Result<FinancialSnapshot> {
    if snapshot.is_none() && history.is_none() {
        anyhow::bail!("No input given. Pass --snapshot FILE and/or --history CSV");
    }

    let mut result = match snapshot {
        Some(path) => FinancialSnapshot::load(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?,
        None => FinancialSnapshot::default(),
    };

    if let Some(path) = history {
        let file = File::open(path)
            .with_context(|| format!("Failed to open history {}", path.display()))?;
        let transactions = parse_history_csv(file)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        tracing::debug!(
            count = transactions.len(),
            file = %path.display(),
            "Merged history"
        );
        result.transactions.extend(transactions);
        result.transactions.sort_by_key(|t| t.date);
    }

    if let Some(date) = as_of {
        result.as_of = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .context("Invalid --as-of date format (use YYYY-MM-DD)")?;
    }

    Ok(result)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
