//! What-if command

use anyhow::Result;
use runway_core::recommendations::format_amount;
use runway_core::{what_if, EngineConfig, FinancialSnapshot, WhatIfScenario};

use super::{print_json, RULE};

#[allow(clippy::too_many_arguments)]
pub fn cmd_what_if(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    amount: f64,
    day: i64,
    duration: Option<u32>,
    category: &str,
    json: bool,
) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        anyhow::bail!("Amount must be a non-negative number, got {}", amount);
    }

    let scenario = WhatIfScenario {
        amount,
        day,
        duration,
        category: category.to_string(),
    };
    let report = what_if(snapshot, config, &scenario);

    if json {
        return print_json(&report);
    }

    println!();
    println!("🧪 What if you spend {}?", format_amount(amount));
    if !category.is_empty() {
        println!("   Category: {}", category);
    }
    println!("{}", RULE);
    println!(
        "   {:18} {:>14} {:>14}",
        "", "Baseline", "What-if"
    );
    println!(
        "   {:18} {:>14} {:>14}",
        "End balance",
        format_amount(report.baseline_end_balance),
        format_amount(report.what_if_end_balance)
    );
    println!(
        "   {:18} {:>14.0} {:>14.0}",
        "Risk score", report.baseline_risk.score, report.what_if_risk.score
    );
    println!(
        "   {:18} {:>14} {:>14}",
        "Stress",
        report.baseline_stress.level.to_string(),
        report.what_if_stress.level.to_string()
    );
    println!();
    println!("   Balance change: {}", format_amount(report.balance_change));

    if let Some(goal) = &report.goal_impact {
        if !goal.stalled {
            println!(
                "   🎯 {}: {:.1} month(s) later",
                goal.goal_name, goal.delay_months
            );
        }
    }

    println!();
    println!("   {}", report.explanation);

    Ok(())
}
