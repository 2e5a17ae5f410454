//! Projection command

use anyhow::Result;
use runway_core::recommendations::format_amount;
use runway_core::{select_projector, EngineConfig, FinancialSnapshot, RiskLevel};
use serde::Serialize;

use super::{print_json, RULE};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionOutput<'a> {
    projector: &'static str,
    start_balance: f64,
    end_balance: f64,
    days: &'a [runway_core::ProjectionDay],
}

fn risk_marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Safe => "  ",
        RiskLevel::Warning => "⚠️",
        RiskLevel::Danger => "🚨",
    }
}

/// Note shown when `--days` cannot apply to the chosen projector
pub(crate) fn ignored_days_note(days: Option<i64>, projector: &str) -> Option<String> {
    match days {
        Some(days) if projector == "historical" => Some(format!(
            "--days {} ignored: history-based projection runs to month end",
            days
        )),
        _ => None,
    }
}

pub fn cmd_project(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    days: Option<i64>,
    risk_only: bool,
    json: bool,
) -> Result<()> {
    let mut snapshot = snapshot.clone();
    if days.is_some() {
        snapshot.horizon_days = days;
    }

    let projector = select_projector(&snapshot, config);
    let note = ignored_days_note(days, projector.name());
    if let Some(note) = &note {
        tracing::warn!("{}", note);
    }
    let timeline = projector.timeline();
    let start_balance = projector.start_balance();
    let end_balance = timeline.last().map(|d| d.balance).unwrap_or(start_balance);

    if json {
        return print_json(&ProjectionOutput {
            projector: projector.name(),
            start_balance,
            end_balance,
            days: &timeline,
        });
    }

    println!();
    println!("📈 Balance Projection ({})", projector.name());
    match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => println!(
            "   {} to {} ({} days)",
            first.date,
            last.date,
            timeline.len()
        ),
        _ => {
            println!("   Nothing to project (horizon is 0 days).");
            return Ok(());
        }
    }
    if let Some(note) = &note {
        println!("   ℹ️  {}", note);
    }
    println!("{}", RULE);
    println!("   Start balance: {}", format_amount(start_balance));
    println!();
    println!(
        "   {:10} │ {:>14} │ {:>12} │ {:>12} │ Risk",
        "Date", "Balance", "In", "Out"
    );
    println!("   ───────────┼────────────────┼──────────────┼──────────────┼──────");

    for day in timeline.iter().filter(|d| !risk_only || d.is_risk_zone) {
        let outflow = day.fixed_outflow + day.variable_outflow + day.hypothetical_outflow;
        println!(
            "   {:10} │ {:>14} │ {:>12} │ {:>12} │ {} {}",
            day.date.to_string(),
            format_amount(day.balance),
            format_amount(day.inflow),
            format_amount(outflow),
            risk_marker(day.risk_level),
            day.risk_level
        );
    }

    println!();
    println!("   End balance: {}", format_amount(end_balance));

    let risk_days = timeline.iter().filter(|d| d.is_risk_zone).count();
    if let Some(first) = timeline.iter().find(|d| d.risk_level == RiskLevel::Danger) {
        println!("   🚨 Balance goes negative on {}", first.date);
    }
    if risk_days > 0 {
        println!(
            "   ⚠️  {} day(s) below the emergency buffer of {}",
            risk_days,
            format_amount(snapshot.emergency_buffer)
        );
    } else {
        println!("   ✅ Balance stays above the emergency buffer");
    }

    Ok(())
}
