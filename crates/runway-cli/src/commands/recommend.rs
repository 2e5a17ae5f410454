//! Recommendation command

use anyhow::Result;
use runway_core::recommendations::format_amount;
use runway_core::{
    recommend, EngineConfig, FinancialSnapshot, Priority, RecommendationType,
    RecommendationVariant,
};

use super::{print_json, RULE};

pub fn cmd_recommend(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    variant: &str,
    json: bool,
) -> Result<()> {
    let variant: RecommendationVariant = variant.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let recommendations = recommend(snapshot, config, variant);

    if json {
        return print_json(&recommendations);
    }

    println!();
    println!("💡 Recommendations ({})", variant);
    println!("{}", RULE);

    for rec in &recommendations {
        let icon = match (rec.recommendation_type, rec.priority) {
            (RecommendationType::Positive, _) => "✅",
            (_, Priority::High) => "🔴",
            (_, Priority::Moderate) => "🟡",
            (_, Priority::Low) => "🟢",
        };
        println!();
        println!("   {} {} [{}]", icon, rec.title, rec.priority);
        println!("      {}", rec.message);
        for action in &rec.actions {
            println!("      • {}", action);
        }
        if rec.impact.balance_change != 0.0 {
            println!(
                "      Impact: {} balance, {:.0} risk points",
                format_amount(rec.impact.balance_change),
                rec.impact.risk_reduction
            );
        }
    }

    Ok(())
}
