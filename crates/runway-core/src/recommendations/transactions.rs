//! Transaction-driven rules
//!
//! Mirrors the budget rules against what was actually spent in the analysis
//! window (usually the trailing month).

use crate::config::RuleConfig;
use crate::error::{ensure_finite, Result};
use crate::models::{amount_or_zero, SavingsGoal, Total, Transaction};

use super::engine::{Rule, RuleContext, RuleEngine};
use super::types::{format_amount, Priority, Recommendation, RecommendationType};

/// Observed transactions plus the figures they are judged against
#[derive(Debug, Clone)]
pub struct TransactionContext<'a> {
    pub monthly_income: f64,
    pub current_balance: f64,
    pub emergency_buffer: f64,
    /// Transactions inside the analysis window
    pub transactions: &'a [Transaction],
    pub goals: &'a [SavingsGoal],
    pub rules: &'a RuleConfig,
}

impl<'a> TransactionContext<'a> {
    fn expenses(&self) -> Vec<&'a Transaction> {
        self.transactions.iter().filter(|t| t.is_expense()).collect()
    }

    pub fn total_spend(&self) -> f64 {
        self.expenses().into_iter().map(Transaction::amount).total()
    }

    pub fn lifestyle_spend(&self) -> f64 {
        self.expenses()
            .into_iter()
            .filter(|t| self.rules.is_lifestyle(&t.category))
            .map(Transaction::amount)
            .total()
    }

    /// Income minus all spending in the window
    pub fn net_savings(&self) -> f64 {
        amount_or_zero(self.monthly_income) - self.total_spend()
    }

    /// Share of income kept (0 when there is no income)
    pub fn savings_rate(&self) -> f64 {
        if self.monthly_income <= 0.0 {
            0.0
        } else {
            self.net_savings() / self.monthly_income
        }
    }

    /// Monthly contributions promised to unfinished goals
    pub fn committed_contributions(&self) -> f64 {
        self.goals
            .iter()
            .filter(|g| g.remaining() > 0.0)
            .map(|g| amount_or_zero(g.monthly_contribution).max(0.0))
            .total()
    }
}

impl RuleContext for TransactionContext<'_> {
    fn fallback(&self) -> Option<Recommendation> {
        let message = if self.monthly_income > 0.0 {
            format!(
                "You kept {:.0}% of your income this period. Nice work.",
                self.savings_rate() * 100.0
            )
        } else {
            "No spending issues found in your recent transactions.".to_string()
        };
        Some(
            Recommendation::new(
                "spending:healthy",
                Priority::Low,
                RecommendationType::Positive,
                "Healthy spending habits",
                message,
            )
            .with_actions(["Keep tracking transactions to stay on course"])
            .with_confidence(0.7),
        )
    }
}

/// Lifestyle categories dominating total spend
pub struct LifestyleShareRule;

impl Rule<TransactionContext<'_>> for LifestyleShareRule {
    fn id(&self) -> &'static str {
        "lifestyle_share"
    }

    fn evaluate(&self, ctx: &TransactionContext<'_>) -> Result<Vec<Recommendation>> {
        let total = ctx.total_spend();
        if total <= 0.0 {
            return Ok(vec![]);
        }

        let lifestyle = ctx.lifestyle_spend();
        let share = ensure_finite(lifestyle / total, "lifestyle share")?;
        if share <= ctx.rules.lifestyle_share {
            return Ok(vec![]);
        }

        let excess = lifestyle - total * ctx.rules.lifestyle_share;
        Ok(vec![Recommendation::new(
            "spending:lifestyle",
            Priority::Moderate,
            RecommendationType::Suggestion,
            "Lifestyle spending is high",
            format!(
                "{} of your {} spending ({:.0}%) went to {}. Bringing it to {:.0}% frees {}.",
                format_amount(lifestyle),
                format_amount(total),
                share * 100.0,
                ctx.rules.lifestyle_categories.join(", "),
                ctx.rules.lifestyle_share * 100.0,
                format_amount(excess)
            ),
        )
        .with_impact(excess, 5.0)
        .with_actions([
            "Plan meals and cook at home more often",
            "Wait 48 hours before non-essential purchases",
        ])
        .with_confidence(0.75)])
    }
}

/// Many small purchases adding up
pub struct SmallPurchasesRule;

impl Rule<TransactionContext<'_>> for SmallPurchasesRule {
    fn id(&self) -> &'static str {
        "small_purchases"
    }

    fn evaluate(&self, ctx: &TransactionContext<'_>) -> Result<Vec<Recommendation>> {
        if ctx.monthly_income <= 0.0 {
            return Ok(vec![]);
        }

        let threshold = ctx.rules.small_purchase_threshold;
        let small: Vec<f64> = ctx
            .transactions
            .iter()
            .filter(|t| t.is_variable_expense() && t.amount() > 0.0 && t.amount() < threshold)
            .map(Transaction::amount)
            .collect();
        if small.len() < ctx.rules.small_purchase_min_count {
            return Ok(vec![]);
        }

        let total: f64 = small.iter().copied().total();
        let share = ensure_finite(total / ctx.monthly_income, "small purchase share")?;
        if share <= ctx.rules.small_purchase_income_share {
            return Ok(vec![]);
        }

        Ok(vec![Recommendation::new(
            "spending:small-purchases",
            Priority::Moderate,
            RecommendationType::Suggestion,
            "Small purchases add up",
            format!(
                "{} purchases under {} totalled {}, {:.0}% of your income.",
                small.len(),
                format_amount(threshold),
                format_amount(total),
                share * 100.0
            ),
        )
        .with_impact(total / 2.0, 5.0)
        .with_actions([
            "Batch small purchases into one weekly trip",
            "Set a weekly allowance for snacks and impulse buys",
        ])
        .with_confidence(0.65)])
    }
}

/// Keeping less than the target share of income
pub struct SavingsRateRule;

impl Rule<TransactionContext<'_>> for SavingsRateRule {
    fn id(&self) -> &'static str {
        "savings_rate"
    }

    fn evaluate(&self, ctx: &TransactionContext<'_>) -> Result<Vec<Recommendation>> {
        if ctx.monthly_income <= 0.0 {
            return Ok(vec![]);
        }

        let rate = ensure_finite(ctx.savings_rate(), "savings rate")?;
        let target = ctx.rules.savings_rate_target;
        if rate >= target {
            return Ok(vec![]);
        }

        let gap = (target - rate) * ctx.monthly_income;
        let priority = if rate < 0.0 {
            Priority::High
        } else {
            Priority::Moderate
        };
        Ok(vec![Recommendation::new(
            "spending:savings-rate",
            priority,
            RecommendationType::Warning,
            "Savings rate below target",
            format!(
                "You are saving {:.0}% of your income against a {:.0}% target. Saving {} more per month closes the gap.",
                rate * 100.0,
                target * 100.0,
                format_amount(gap)
            ),
        )
        .with_impact(gap, 10.0)
        .with_actions([
            "Set up an automatic transfer on payday".to_string(),
            format!("Trim {} from discretionary categories", format_amount(gap)),
        ])
        .with_confidence(0.8)])
    }
}

/// Net savings not covering what goals need each month
pub struct GoalFundingRule;

impl Rule<TransactionContext<'_>> for GoalFundingRule {
    fn id(&self) -> &'static str {
        "goal_funding"
    }

    fn evaluate(&self, ctx: &TransactionContext<'_>) -> Result<Vec<Recommendation>> {
        let committed = ctx.committed_contributions();
        if committed <= 0.0 {
            return Ok(vec![]);
        }

        let net = ensure_finite(ctx.net_savings(), "net savings")?;
        if net >= committed {
            return Ok(vec![]);
        }

        let gap = committed - net;
        Ok(vec![Recommendation::new(
            "spending:goal-funding",
            Priority::High,
            RecommendationType::Warning,
            "Goals are underfunded",
            format!(
                "Your goals need {} per month but you only saved {}. You are {} short.",
                format_amount(committed),
                format_amount(net),
                format_amount(gap)
            ),
        )
        .with_impact(gap, 8.0)
        .with_actions([
            "Reduce discretionary spending to cover goal contributions",
            "Lower contributions on low-priority goals",
        ])
        .with_confidence(0.8)])
    }
}

/// Balance below the emergency buffer
pub struct EmergencyBufferRule;

impl Rule<TransactionContext<'_>> for EmergencyBufferRule {
    fn id(&self) -> &'static str {
        "emergency_buffer"
    }

    fn evaluate(&self, ctx: &TransactionContext<'_>) -> Result<Vec<Recommendation>> {
        let buffer = amount_or_zero(ctx.emergency_buffer);
        let balance = ensure_finite(ctx.current_balance, "current balance")?;
        if buffer <= 0.0 || balance >= buffer {
            return Ok(vec![]);
        }

        let gap = buffer - balance;
        Ok(vec![Recommendation::new(
            "spending:emergency-buffer",
            Priority::High,
            RecommendationType::Warning,
            "Emergency buffer depleted",
            format!(
                "Your balance of {} is {} below your emergency buffer of {}.",
                format_amount(balance),
                format_amount(gap),
                format_amount(buffer)
            ),
        )
        .with_impact(gap, 15.0)
        .with_actions([
            "Rebuild the buffer before adding to other goals",
            "Avoid large purchases until the buffer is restored",
        ])
        .with_confidence(0.9)])
    }
}

/// Transaction rules in evaluation order
pub fn transaction_engine<'a>() -> RuleEngine<TransactionContext<'a>> {
    RuleEngine::empty()
        .with_rule(Box::new(LifestyleShareRule))
        .with_rule(Box::new(SmallPurchasesRule))
        .with_rule(Box::new(SavingsRateRule))
        .with_rule(Box::new(GoalFundingRule))
        .with_rule(Box::new(EmergencyBufferRule))
}

/// Run the transaction rules over a context
pub fn generate_transaction_recommendations(ctx: &TransactionContext<'_>) -> Vec<Recommendation> {
    transaction_engine().evaluate(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn spend(amount: f64, category: &str) -> Transaction {
        Transaction {
            amount,
            kind: TransactionKind::Expense,
            category: category.to_string(),
            ..Default::default()
        }
    }

    fn ctx<'a>(
        rules: &'a RuleConfig,
        txs: &'a [Transaction],
        goals: &'a [SavingsGoal],
    ) -> TransactionContext<'a> {
        TransactionContext {
            monthly_income: 50000.0,
            current_balance: 80000.0,
            emergency_buffer: 30000.0,
            transactions: txs,
            goals,
            rules,
        }
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_healthy_spending_gets_fallback() {
        let rules = RuleConfig::default();
        let txs = vec![spend(15000.0, "rent"), spend(3000.0, "food")];
        let recs = generate_transaction_recommendations(&ctx(&rules, &txs, &[]));
        assert_eq!(ids(&recs), vec!["spending:healthy"]);
        assert!(recs[0].message.contains("64%"));
    }

    #[test]
    fn test_lifestyle_share() {
        let rules = RuleConfig::default();
        let txs = vec![
            spend(10000.0, "rent"),
            spend(4000.0, "Food"),
            spend(2000.0, "shopping"),
        ];
        let recs = generate_transaction_recommendations(&ctx(&rules, &txs, &[]));
        assert_eq!(ids(&recs), vec!["spending:lifestyle"]);
        // 6000 of 16000 = 37.5%; 30% would be 4800
        assert!(recs[0].message.contains("38%"));
        assert_eq!(recs[0].impact.balance_change, 1200.0);
    }

    #[test]
    fn test_small_purchases() {
        let rules = RuleConfig::default();
        let mut txs: Vec<Transaction> = (0..12).map(|_| spend(450.0, "misc")).collect();
        txs.push(spend(20000.0, "rent"));
        let recs = generate_transaction_recommendations(&ctx(&rules, &txs, &[]));
        // 12 x 450 = 5400 > 10% of 50000
        assert_eq!(ids(&recs), vec!["spending:small-purchases"]);
        assert!(recs[0].message.starts_with("12 purchases under 500.00"));

        let few: Vec<Transaction> = (0..4).map(|_| spend(450.0, "misc")).collect();
        let recs = generate_transaction_recommendations(&ctx(&rules, &few, &[]));
        assert_eq!(ids(&recs), vec!["spending:healthy"]);
    }

    #[test]
    fn test_savings_rate_and_goal_funding() {
        let rules = RuleConfig::default();
        let txs = vec![spend(46000.0, "rent")];
        let goals = vec![SavingsGoal {
            id: "house".into(),
            target_amount: 500000.0,
            monthly_contribution: 10000.0,
            ..Default::default()
        }];
        let recs = generate_transaction_recommendations(&ctx(&rules, &txs, &goals));
        assert_eq!(ids(&recs), vec!["spending:goal-funding", "spending:savings-rate"]);
        // Saved 4000 = 8%: moderate, not negative
        assert_eq!(recs[1].priority, Priority::Moderate);
        assert!(recs[0].message.contains("6,000.00 short"));
    }

    #[test]
    fn test_negative_savings_is_high_priority() {
        let rules = RuleConfig::default();
        let txs = vec![spend(60000.0, "rent")];
        let recs = generate_transaction_recommendations(&ctx(&rules, &txs, &[]));
        assert_eq!(recs[0].id, "spending:savings-rate");
        assert_eq!(recs[0].priority, Priority::High);
    }

    #[test]
    fn test_emergency_buffer() {
        let rules = RuleConfig::default();
        let mut c = ctx(&rules, &[], &[]);
        c.current_balance = 12000.0;
        let recs = generate_transaction_recommendations(&c);
        assert_eq!(ids(&recs), vec!["spending:emergency-buffer"]);
        assert!(recs[0].message.contains("18,000.00 below"));
    }

    #[test]
    fn test_zero_income() {
        let rules = RuleConfig::default();
        let txs: Vec<Transaction> = (0..10).map(|_| spend(100.0, "food")).collect();
        let mut c = ctx(&rules, &txs, &[]);
        c.monthly_income = 0.0;
        assert_eq!(c.savings_rate(), 0.0);

        let recs = generate_transaction_recommendations(&c);
        // Lifestyle share still applies; income-based rules are skipped
        assert_eq!(ids(&recs), vec!["spending:lifestyle"]);
    }

    #[test]
    fn test_income_transactions_are_not_spend() {
        let rules = RuleConfig::default();
        let txs = vec![
            Transaction {
                amount: 50000.0,
                kind: TransactionKind::Income,
                category: "food".into(),
                ..Default::default()
            },
            spend(1000.0, "rent"),
        ];
        let c = ctx(&rules, &txs, &[]);
        assert_eq!(c.total_spend(), 1000.0);
        assert_eq!(c.lifestyle_spend(), 0.0);
    }
}
