//! Forecast command

use anyhow::Result;
use runway_core::recommendations::format_amount;
use runway_core::{forecast, BurnStatus, EngineConfig, FinancialSnapshot};

use super::{print_json, RULE};

fn burn_icon(status: BurnStatus) -> &'static str {
    match status {
        BurnStatus::Low => "🟢",
        BurnStatus::Moderate => "🟡",
        BurnStatus::High => "🔴",
    }
}

pub fn cmd_forecast(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    months: u32,
    json: bool,
) -> Result<()> {
    let summary = forecast(snapshot, config, months);
    if json {
        return print_json(&summary);
    }

    println!();
    println!("🔮 Forecast ({} projector)", summary.projector);
    println!("   As of {}", snapshot.as_of);
    println!("{}", RULE);
    println!(
        "   Predicted month-end balance: {}",
        format_amount(summary.predicted_end_balance)
    );

    if let Some(eom) = &summary.end_of_month {
        println!(
            "   Day {} of {} ({} remaining)",
            eom.current_day, eom.days_in_month, eom.days_remaining
        );
        println!("   Current balance:        {:>14}", format_amount(eom.current_balance));
        println!(
            "   + Income still due:     {:>14}",
            format_amount(eom.expected_income_remaining)
        );
        println!(
            "   - Fixed still due:      {:>14}",
            format_amount(eom.fixed_expenses_remaining)
        );
        println!(
            "   - Predicted spending:   {:>14}  ({}/day)",
            format_amount(eom.predicted_variable_expenses),
            format_amount(eom.average_daily_spending)
        );
    }

    let burn = &summary.burn_rate;
    println!();
    println!(
        "   {} Burn rate: {}/day, {:.0}% of income ({})",
        burn_icon(burn.status),
        format_amount(burn.daily_burn_rate),
        burn.burn_ratio * 100.0,
        burn.status.as_str()
    );

    if summary.next_months.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "   {:7} │ {:>14} │ {:>12} │ {:>12} │ {:>14}",
        "Month", "Start", "Income", "Expenses", "End"
    );
    println!("   ────────┼────────────────┼──────────────┼──────────────┼────────────────");
    for month in &summary.next_months {
        println!(
            "   {:7} │ {:>14} │ {:>12} │ {:>12} │ {:>14}",
            month.month,
            format_amount(month.starting_balance),
            format_amount(month.income),
            format_amount(month.fixed_expenses + month.variable_expenses),
            format_amount(month.ending_balance)
        );
    }

    Ok(())
}
