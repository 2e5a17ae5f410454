//! Risk command

use anyhow::Result;
use runway_core::{
    calculate_risk_score, calculate_stress_level, EngineConfig, FinancialSnapshot,
    RiskScoreResult, StressBand, StressLevel,
};
use serde::Serialize;

use super::{print_json, RULE};

#[derive(Serialize)]
struct RiskOutput {
    risk: RiskScoreResult,
    stress: StressLevel,
}

pub fn cmd_risk(snapshot: &FinancialSnapshot, config: &EngineConfig, json: bool) -> Result<()> {
    let risk = calculate_risk_score(&snapshot.risk_inputs());
    let stress = calculate_stress_level(risk.score, &config.risk);

    if json {
        return print_json(&RiskOutput { risk, stress });
    }

    let icon = match stress.level {
        StressBand::Low => "🟢",
        StressBand::Moderate => "🟡",
        StressBand::High => "🔴",
    };

    println!();
    println!("🩺 Financial Health");
    println!("{}", RULE);
    println!("   Score: {:.0}/100 {} {} stress", risk.score, icon, stress.level);
    println!();
    let f = &risk.factors;
    println!("   Balance adequacy        {:>5.1} / 40", f.balance_adequacy);
    println!("   Income stability        {:>5.1} / 30", f.income_stability);
    println!("   Expense predictability  {:>5.1} / 20", f.expense_predictability);
    println!("   Safety margin           {:>5.1} / 10", f.safety_margin);
    println!();
    if risk.months_of_runway > 0.0 {
        println!(
            "   Runway: {:.1} months at current spending",
            risk.months_of_runway
        );
    }
    println!("   {}", stress.message);

    Ok(())
}
