//! Config command

use anyhow::Result;
use runway_core::config::default_config_path;
use runway_core::EngineConfig;

use super::{print_json, RULE};

pub fn cmd_config(config: &EngineConfig, path_only: bool, json: bool) -> Result<()> {
    if path_only {
        match default_config_path() {
            Some(path) => {
                let state = if path.exists() { "present" } else { "not created" };
                println!("{} ({})", path.display(), state);
            }
            None => println!("No data directory available on this platform"),
        }
        return Ok(());
    }

    if json {
        return print_json(config);
    }

    let p = &config.projection;
    let r = &config.risk;
    let rules = &config.rules;

    println!();
    println!("⚙️  Engine Configuration");
    println!("{}", RULE);
    println!("   Projection");
    println!("      Default horizon:      {} days", p.default_horizon_days);
    println!("      Max horizon:          {} days", p.max_horizon_days);
    println!("      Variable divisor:     {}", p.variable_divisor);
    println!("      Default salary day:   {}", p.default_salary_day);
    println!("      Max forecast months:  {}", p.max_forecast_months);
    println!();
    println!("   Stress bands");
    println!("      Low stress from:      {}", r.low_stress_min);
    println!("      Moderate stress from: {}", r.moderate_stress_min);
    println!();
    println!("   Rules");
    println!(
        "      Burn rate bands:      moderate {:.0}%, high {:.0}%",
        rules.burn_rate_moderate * 100.0,
        rules.burn_rate_high * 100.0
    );
    println!(
        "      Fixed expense ratio:  {:.0}%",
        rules.fixed_expense_ratio * 100.0
    );
    println!(
        "      Savings rate target:  {:.0}%",
        rules.savings_rate_target * 100.0
    );
    println!("      Max subscriptions:    {}", rules.max_subscriptions);
    for (category, share) in &rules.category_budgets {
        println!("      Budget {:14} {:.0}% of income", category, share * 100.0);
    }

    Ok(())
}
