//! Budget-driven rules
//!
//! Works from what the user declared (fixed bills, goals, category budgets)
//! plus the month-end forecast and burn rate. Rules run in this order:
//!
//! 1. Low projected balance
//! 2. High burn rate
//! 3. Category over budget
//! 4. Goal contribution shortfall
//! 5. Fixed-expense ratio, then subscription count

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::RuleConfig;
use crate::error::{ensure_finite, Result};
use crate::models::{amount_or_zero, FixedExpenseItem, SavingsGoal, Total};
use crate::projection::{months_until, BurnRate, BurnStatus};

use super::engine::{Rule, RuleContext, RuleEngine};
use super::types::{format_amount, Priority, Recommendation, RecommendationType};

/// Everything the budget rules look at
#[derive(Debug, Clone)]
pub struct BudgetContext<'a> {
    pub as_of: NaiveDate,
    pub monthly_income: f64,
    pub emergency_buffer: f64,
    pub predicted_end_balance: f64,
    pub burn_rate: BurnRate,
    /// Lower-cased category -> spend this month
    pub category_spend: BTreeMap<String, f64>,
    pub goals: &'a [SavingsGoal],
    pub fixed_expenses: &'a [FixedExpenseItem],
    pub rules: &'a RuleConfig,
}

impl<'a> BudgetContext<'a> {
    /// Balance the month should not end below
    pub fn minimum_balance(&self) -> f64 {
        if self.emergency_buffer > 0.0 {
            self.emergency_buffer
        } else {
            self.rules.minimum_balance
        }
    }

    fn active_fixed(&self) -> Vec<&'a FixedExpenseItem> {
        self.fixed_expenses.iter().filter(|f| f.is_active).collect()
    }
}

impl RuleContext for BudgetContext<'_> {
    fn fallback(&self) -> Option<Recommendation> {
        if self.burn_rate.status != BurnStatus::Low {
            return None;
        }
        Some(
            Recommendation::new(
                "budget:on-track",
                Priority::Low,
                RecommendationType::Positive,
                "You're on track",
                format!(
                    "Spending is {:.0}% of income and the month should end at {}. Keep it up.",
                    self.burn_rate.burn_ratio * 100.0,
                    format_amount(self.predicted_end_balance)
                ),
            )
            .with_actions(["Consider moving part of the surplus into a savings goal"])
            .with_confidence(0.7),
        )
    }
}

/// Predicted month-end balance under the minimum
pub struct LowBalanceRule;

impl Rule<BudgetContext<'_>> for LowBalanceRule {
    fn id(&self) -> &'static str {
        "low_balance"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        let predicted = ensure_finite(ctx.predicted_end_balance, "predicted end balance")?;
        let minimum = ctx.minimum_balance();
        if predicted >= minimum {
            return Ok(vec![]);
        }

        let shortfall = minimum - predicted;
        Ok(vec![Recommendation::new(
            "budget:low-balance",
            Priority::High,
            RecommendationType::Warning,
            "Low balance projected",
            format!(
                "Your balance is projected to end the month at {}, which is {} below your minimum of {}.",
                format_amount(predicted),
                format_amount(shortfall),
                format_amount(minimum)
            ),
        )
        .with_impact(shortfall, 20.0)
        .with_actions([
            "Pause non-essential purchases until payday".to_string(),
            format!("Find {} in cuts before month end", format_amount(shortfall)),
            "Postpone any optional transfers to goals this month".to_string(),
        ])
        .with_confidence(0.9)])
    }
}

/// Projected spend above the high burn band
pub struct HighBurnRateRule;

impl Rule<BudgetContext<'_>> for HighBurnRateRule {
    fn id(&self) -> &'static str {
        "high_burn_rate"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        if ctx.burn_rate.status != BurnStatus::High {
            return Ok(vec![]);
        }

        let target_monthly = ctx.monthly_income * ctx.rules.burn_rate_target;
        let excess = ctx.burn_rate.projected_monthly_burn - target_monthly;
        let daily_reduction = ensure_finite(excess / 30.0, "daily reduction")?.max(0.0);

        Ok(vec![Recommendation::new(
            "budget:high-burn-rate",
            Priority::High,
            RecommendationType::Warning,
            "Spending is outpacing income",
            format!(
                "At {} per day you will spend {} this month, {:.0}% of your income. Cut {} per day to get back to {:.0}%.",
                format_amount(ctx.burn_rate.daily_burn_rate),
                format_amount(ctx.burn_rate.projected_monthly_burn),
                ctx.burn_rate.burn_ratio * 100.0,
                format_amount(daily_reduction),
                ctx.rules.burn_rate_target * 100.0
            ),
        )
        .with_impact(daily_reduction * 30.0, 15.0)
        .with_actions([
            format!(
                "Keep daily discretionary spend under {}",
                format_amount(ctx.burn_rate.daily_burn_rate - daily_reduction)
            ),
            "Review the largest purchases from this month".to_string(),
        ])
        .with_confidence(0.85)])
    }
}

/// Category spend above its share of income
pub struct CategoryBudgetRule;

impl Rule<BudgetContext<'_>> for CategoryBudgetRule {
    fn id(&self) -> &'static str {
        "category_budget"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        if ctx.monthly_income <= 0.0 {
            return Ok(vec![]);
        }

        let mut found = Vec::new();
        for (category, spend) in &ctx.category_spend {
            let Some(share) = ctx.rules.category_budget(category) else {
                continue;
            };
            let limit = ctx.monthly_income * share;
            let excess = ensure_finite(spend - limit, "category excess")?;
            if excess <= 0.0 {
                continue;
            }

            found.push(
                Recommendation::new(
                    format!("budget:category:{}", category),
                    Priority::Moderate,
                    RecommendationType::Suggestion,
                    format!("{} over budget", capitalize(category)),
                    format!(
                        "You've spent {} on {}, {} over the {:.0}% budget of {}.",
                        format_amount(*spend),
                        category,
                        format_amount(excess),
                        share * 100.0,
                        format_amount(limit)
                    ),
                )
                .with_impact(excess, 5.0)
                .with_actions([
                    format!("Hold {} spending for the rest of the month", category),
                    format!("Set a weekly cap of {} for {}", format_amount(limit / 4.0), category),
                ])
                .with_confidence(0.75),
            );
        }
        Ok(found)
    }
}

/// Declared contribution too small to reach a goal by its date
pub struct GoalContributionRule;

impl Rule<BudgetContext<'_>> for GoalContributionRule {
    fn id(&self) -> &'static str {
        "goal_contribution"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        let mut found = Vec::new();
        for goal in ctx.goals {
            let remaining = goal.remaining();
            let Some(target_date) = goal.target_date else {
                continue;
            };
            if remaining <= 0.0 {
                continue;
            }

            // A goal due now (or overdue) needs the whole remainder this month
            let months = months_until(ctx.as_of, target_date).max(1);
            let required = ensure_finite(remaining / months as f64, "required contribution")?;
            let declared = amount_or_zero(goal.monthly_contribution).max(0.0);
            if required <= declared {
                continue;
            }

            let shortfall = required - declared;
            let key = if goal.id.is_empty() { &goal.name } else { &goal.id };
            found.push(
                Recommendation::new(
                    format!("budget:goal:{}", key),
                    Priority::from(goal.priority),
                    RecommendationType::Suggestion,
                    format!("Increase savings for {}", goal.name),
                    format!(
                        "To reach {} by {} you need {} per month over {} month(s), but only {} is planned. Add {} per month.",
                        goal.name,
                        target_date,
                        format_amount(required),
                        months,
                        format_amount(declared),
                        format_amount(shortfall)
                    ),
                )
                .with_impact(-shortfall, 0.0)
                .with_actions([
                    format!("Raise the monthly contribution to {}", format_amount(required)),
                    "Or move the target date out".to_string(),
                ])
                .with_confidence(0.8),
            );
        }
        Ok(found)
    }
}

/// Fixed obligations taking too much of income
pub struct FixedExpenseRatioRule;

impl Rule<BudgetContext<'_>> for FixedExpenseRatioRule {
    fn id(&self) -> &'static str {
        "fixed_expense_ratio"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        if ctx.monthly_income <= 0.0 {
            return Ok(vec![]);
        }

        let fixed: f64 = ctx
            .active_fixed()
            .iter()
            .map(|f| amount_or_zero(f.amount))
            .total();
        let ratio = ensure_finite(fixed / ctx.monthly_income, "fixed expense ratio")?;
        if ratio <= ctx.rules.fixed_expense_ratio {
            return Ok(vec![]);
        }

        let excess = fixed - ctx.monthly_income * ctx.rules.fixed_expense_ratio;
        Ok(vec![Recommendation::new(
            "budget:fixed-ratio",
            Priority::Moderate,
            RecommendationType::Suggestion,
            "Fixed costs are high",
            format!(
                "Fixed expenses of {} take {:.0}% of your income (guideline {:.0}%). Reducing them by {} would restore the balance.",
                format_amount(fixed),
                ratio * 100.0,
                ctx.rules.fixed_expense_ratio * 100.0,
                format_amount(excess)
            ),
        )
        .with_impact(excess, 10.0)
        .with_actions([
            "Renegotiate or refinance the largest fixed bill",
            "Look for cheaper plans on utilities and insurance",
        ])
        .with_confidence(0.7)])
    }
}

/// Too many active subscriptions
pub struct SubscriptionCountRule;

impl Rule<BudgetContext<'_>> for SubscriptionCountRule {
    fn id(&self) -> &'static str {
        "subscription_count"
    }

    fn evaluate(&self, ctx: &BudgetContext<'_>) -> Result<Vec<Recommendation>> {
        let subscriptions: Vec<&FixedExpenseItem> = ctx
            .active_fixed()
            .into_iter()
            .filter(|f| ctx.rules.is_subscription(&f.category))
            .collect();
        if subscriptions.len() <= ctx.rules.max_subscriptions {
            return Ok(vec![]);
        }

        let monthly: f64 = subscriptions.iter().map(|f| amount_or_zero(f.amount)).total();
        Ok(vec![Recommendation::new(
            "budget:subscriptions",
            Priority::Low,
            RecommendationType::Suggestion,
            "Review your subscriptions",
            format!(
                "You have {} active subscriptions costing {} per month.",
                subscriptions.len(),
                format_amount(monthly)
            ),
        )
        .with_impact(monthly / subscriptions.len() as f64, 2.0)
        .with_actions([
            "Cancel services you haven't used in the last month",
            "Switch to annual billing for the ones you keep",
        ])
        .with_confidence(0.6)])
    }
}

/// Budget rules in evaluation order
pub fn budget_engine<'a>() -> RuleEngine<BudgetContext<'a>> {
    RuleEngine::empty()
        .with_rule(Box::new(LowBalanceRule))
        .with_rule(Box::new(HighBurnRateRule))
        .with_rule(Box::new(CategoryBudgetRule))
        .with_rule(Box::new(GoalContributionRule))
        .with_rule(Box::new(FixedExpenseRatioRule))
        .with_rule(Box::new(SubscriptionCountRule))
}

/// Run the budget rules over a context
pub fn generate_budget_recommendations(ctx: &BudgetContext<'_>) -> Vec<Recommendation> {
    budget_engine().evaluate(ctx)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn burn(daily: f64, income: f64) -> BurnRate {
        let projected = daily * 30.0;
        let ratio = if income > 0.0 { projected / income } else { 0.0 };
        let status = if ratio >= 0.9 {
            BurnStatus::High
        } else if ratio >= 0.7 {
            BurnStatus::Moderate
        } else {
            BurnStatus::Low
        };
        BurnRate {
            daily_burn_rate: daily,
            projected_monthly_burn: projected,
            burn_ratio: ratio,
            status,
        }
    }

    fn ctx<'a>(
        rules: &'a RuleConfig,
        goals: &'a [SavingsGoal],
        fixed: &'a [FixedExpenseItem],
    ) -> BudgetContext<'a> {
        BudgetContext {
            as_of: date(2024, 6, 10),
            monthly_income: 75000.0,
            emergency_buffer: 30000.0,
            predicted_end_balance: 60000.0,
            burn_rate: burn(500.0, 75000.0),
            category_spend: BTreeMap::new(),
            goals,
            fixed_expenses: fixed,
            rules,
        }
    }

    fn subscription(n: u32) -> FixedExpenseItem {
        FixedExpenseItem {
            name: format!("sub-{}", n),
            amount: 200.0,
            day_of_month: n,
            category: "Subscription".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_healthy_budget_gets_positive_fallback() {
        let rules = RuleConfig::default();
        let recs = generate_budget_recommendations(&ctx(&rules, &[], &[]));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, "budget:on-track");
        assert_eq!(recs[0].priority, Priority::Low);
        assert!(recs[0].is_positive());
    }

    #[test]
    fn test_no_fallback_when_burn_moderate() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.burn_rate = burn(1800.0, 75000.0);
        assert_eq!(c.burn_rate.status, BurnStatus::Moderate);
        assert!(generate_budget_recommendations(&c).is_empty());
    }

    #[test]
    fn test_low_balance_uses_buffer_then_floor() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.predicted_end_balance = 25000.0;
        let recs = generate_budget_recommendations(&c);
        assert_eq!(recs[0].id, "budget:low-balance");
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].message.contains("5,000.00 below"));

        // Without a buffer the configured floor (0) applies
        c.emergency_buffer = 0.0;
        assert!(generate_budget_recommendations(&c)
            .iter()
            .all(|r| r.id != "budget:low-balance"));
        c.predicted_end_balance = -100.0;
        assert_eq!(generate_budget_recommendations(&c)[0].id, "budget:low-balance");
    }

    #[test]
    fn test_high_burn_daily_target() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        // 2500/day -> 75000/month against 75000 income
        c.burn_rate = burn(2500.0, 75000.0);
        let recs = generate_budget_recommendations(&c);
        let burn_rec = recs.iter().find(|r| r.id == "budget:high-burn-rate").unwrap();
        // (75000 - 60000) / 30 = 500
        assert!(burn_rec.message.contains("Cut 500.00 per day"));
        assert_eq!(burn_rec.impact.balance_change, 15000.0);
    }

    #[test]
    fn test_category_over_budget_names_excess() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.category_spend.insert("food".into(), 18000.0);
        c.category_spend.insert("travel".into(), 1000.0);
        c.category_spend.insert("rent".into(), 99999.0);

        let recs = generate_budget_recommendations(&c);
        assert_eq!(recs.len(), 1);
        // 20% of 75000 = 15000
        assert_eq!(recs[0].id, "budget:category:food");
        assert_eq!(recs[0].priority, Priority::Moderate);
        assert!(recs[0].message.contains("3,000.00 over"));
        assert_eq!(recs[0].title, "Food over budget");
    }

    #[test]
    fn test_goal_shortfall_follows_goal_priority() {
        let rules = RuleConfig::default();
        let goals = vec![
            SavingsGoal {
                id: "car".into(),
                name: "Car".into(),
                target_amount: 120000.0,
                current_amount: 60000.0,
                monthly_contribution: 5000.0,
                target_date: Some(date(2024, 12, 10)),
                priority: crate::models::GoalPriority::High,
            },
            SavingsGoal {
                id: "trip".into(),
                name: "Trip".into(),
                target_amount: 10000.0,
                current_amount: 0.0,
                monthly_contribution: 5000.0,
                target_date: Some(date(2024, 12, 10)),
                ..Default::default()
            },
            SavingsGoal {
                id: "someday".into(),
                target_amount: 50000.0,
                ..Default::default()
            },
        ];
        let recs = generate_budget_recommendations(&ctx(&rules, &goals, &[]));
        assert_eq!(recs.len(), 1);
        // 60000 over 6 months = 10000 needed vs 5000 planned
        assert_eq!(recs[0].id, "budget:goal:car");
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].message.contains("Add 5,000.00 per month"));
    }

    #[test]
    fn test_overdue_goal_needs_full_remainder() {
        let rules = RuleConfig::default();
        let goals = vec![SavingsGoal {
            name: "Laptop".into(),
            target_amount: 8000.0,
            monthly_contribution: 1000.0,
            target_date: Some(date(2024, 5, 1)),
            priority: crate::models::GoalPriority::Low,
            ..Default::default()
        }];
        let recs = generate_budget_recommendations(&ctx(&rules, &goals, &[]));
        assert_eq!(recs[0].id, "budget:goal:Laptop");
        assert_eq!(recs[0].priority, Priority::Low);
        assert!(recs[0].message.contains("8,000.00 per month"));
    }

    #[test]
    fn test_fixed_ratio_and_subscriptions() {
        let rules = RuleConfig::default();
        let mut fixed: Vec<FixedExpenseItem> = (1..=6).map(subscription).collect();
        fixed.push(FixedExpenseItem {
            name: "Rent".into(),
            amount: 40000.0,
            day_of_month: 5,
            ..Default::default()
        });
        fixed.push(FixedExpenseItem {
            name: "Old gym".into(),
            amount: 90000.0,
            day_of_month: 5,
            is_active: false,
            ..Default::default()
        });

        let recs = generate_budget_recommendations(&ctx(&rules, &[], &fixed));
        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["budget:fixed-ratio", "budget:subscriptions"]);
        assert!(recs[1].message.contains("6 active subscriptions"));
    }

    #[test]
    fn test_zero_income_generates_without_error() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.monthly_income = 0.0;
        c.burn_rate = burn(500.0, 0.0);
        c.category_spend.insert("food".into(), 5000.0);
        let recs = generate_budget_recommendations(&c);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].is_positive());
    }

    #[test]
    fn test_non_finite_forecast_skips_rule() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.predicted_end_balance = f64::NAN;
        let recs = generate_budget_recommendations(&c);
        assert!(recs.iter().all(|r| r.id != "budget:low-balance"));
    }

    #[test]
    fn test_engine_order() {
        assert_eq!(
            budget_engine().rule_ids(),
            vec![
                "low_balance",
                "high_burn_rate",
                "category_budget",
                "goal_contribution",
                "fixed_expense_ratio",
                "subscription_count"
            ]
        );
    }
}
