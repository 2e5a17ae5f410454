//! Data models for Runway
//!
//! Field names serialize as camelCase to match the snapshot shape produced by
//! the expense-tracking clients. Every field has a default so that a partial
//! snapshot deserializes with zeros and empty lists instead of failing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Replace NaN/infinite amounts with 0
pub(crate) fn amount_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Summing over money amounts
///
/// `Iterator::sum` over `f64` starts from `-0.0`, so an empty set prints as
/// `-0`. Folding from `0.0` keeps empty totals a plain zero.
pub trait Total: Iterator<Item = f64> + Sized {
    fn total(self) -> f64 {
        self.fold(0.0, |acc, v| acc + v)
    }
}

impl<I: Iterator<Item = f64>> Total for I {}

/// Whether an income item is a fixed salary or varies month to month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeType {
    #[default]
    Fixed,
    Variable,
}

impl IncomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
        }
    }
}

/// A recurring monthly income source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeItem {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub day_of_month: u32,
    #[serde(rename = "type")]
    pub income_type: IncomeType,
}

/// A scheduled monthly expense (rent, EMI, subscriptions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedExpenseItem {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub day_of_month: u32,
    pub category: String,
    pub is_active: bool,
}

impl Default for FixedExpenseItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            amount: 0.0,
            day_of_month: 0,
            category: String::new(),
            is_active: true,
        }
    }
}

/// A monthly budget for discretionary spending, spread evenly across days
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableExpenseItem {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub category: String,
}

/// A one-off spend injected into a projection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HypotheticalSpend {
    pub amount: f64,
    /// Offset in days from the projection start
    pub day: i64,
    /// Spread the amount over this many days (None or 1 = single day)
    pub duration: Option<u32>,
}

/// Savings goal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Numeric rank for ordering (higher = more important)
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl fmt::Display for GoalPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GoalPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown goal priority: {}", s)),
        }
    }
}

/// A savings goal with a monthly contribution plan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub monthly_contribution: f64,
    pub target_date: Option<NaiveDate>,
    pub priority: GoalPriority,
}

impl SavingsGoal {
    /// Amount still missing to reach the target (never negative)
    pub fn remaining(&self) -> f64 {
        (amount_or_zero(self.target_amount) - amount_or_zero(self.current_amount)).max(0.0)
    }
}

/// Direction of money in an observed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" => Ok(Self::Income),
            "expense" | "debit" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

/// An observed, dated transaction from the user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Always a positive whole-unit amount; direction is in `kind`
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    /// Recorded payment of a declared fixed expense (excluded from
    /// variable-spend statistics)
    pub recurring: bool,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            id: String::new(),
            date: NaiveDate::default(),
            description: String::new(),
            amount: 0.0,
            kind: TransactionKind::Expense,
            category: String::new(),
            recurring: false,
        }
    }
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Discretionary spend that feeds burn-rate statistics
    pub fn is_variable_expense(&self) -> bool {
        self.is_expense() && !self.recurring
    }

    pub fn amount(&self) -> f64 {
        amount_or_zero(self.amount).abs()
    }

    /// Amount as it moves the balance (income positive, expenses negative)
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount(),
            TransactionKind::Expense => -self.amount(),
        }
    }
}

/// Risk classification of a projected balance relative to the emergency buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// danger below zero, warning below the buffer, safe otherwise
    pub fn classify(balance: f64, emergency_buffer: f64) -> Self {
        if balance < 0.0 {
            Self::Danger
        } else if balance < amount_or_zero(emergency_buffer) {
            Self::Warning
        } else {
            Self::Safe
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One simulated day of a balance trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionDay {
    pub day: u32,
    pub date: NaiveDate,
    pub balance: f64,
    pub inflow: f64,
    pub fixed_outflow: f64,
    pub variable_outflow: f64,
    pub hypothetical_outflow: f64,
    pub is_risk_zone: bool,
    pub risk_level: RiskLevel,
}

impl ProjectionDay {
    /// Build a day entry, deriving the risk fields from the balance
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        day: u32,
        date: NaiveDate,
        balance: f64,
        inflow: f64,
        fixed_outflow: f64,
        variable_outflow: f64,
        hypothetical_outflow: f64,
        emergency_buffer: f64,
    ) -> Self {
        let risk_level = RiskLevel::classify(balance, emergency_buffer);
        Self {
            day,
            date,
            balance,
            inflow,
            fixed_outflow,
            variable_outflow,
            hypothetical_outflow,
            is_risk_zone: risk_level != RiskLevel::Safe,
            risk_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_classify() {
        assert_eq!(RiskLevel::classify(-0.01, 30000.0), RiskLevel::Danger);
        assert_eq!(RiskLevel::classify(0.0, 30000.0), RiskLevel::Warning);
        assert_eq!(RiskLevel::classify(29999.0, 30000.0), RiskLevel::Warning);
        assert_eq!(RiskLevel::classify(30000.0, 30000.0), RiskLevel::Safe);
        // No buffer: anything non-negative is safe
        assert_eq!(RiskLevel::classify(0.0, 0.0), RiskLevel::Safe);
    }

    #[test]
    fn test_partial_snapshot_items_deserialize_with_defaults() {
        let item: FixedExpenseItem =
            serde_json::from_str(r#"{"name": "Rent", "amount": 15000, "dayOfMonth": 5}"#).unwrap();
        assert!(item.is_active);
        assert_eq!(item.day_of_month, 5);
        assert_eq!(item.category, "");

        let income: IncomeItem = serde_json::from_str(r#"{"type": "variable"}"#).unwrap();
        assert_eq!(income.income_type, IncomeType::Variable);
        assert_eq!(income.amount, 0.0);
    }

    #[test]
    fn test_projection_day_serializes_camel_case() {
        let day = ProjectionDay::new(
            0,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            100.0,
            0.0,
            0.0,
            10.0,
            0.0,
            500.0,
        );
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["riskLevel"], "warning");
        assert_eq!(json["isRiskZone"], true);
        assert_eq!(json["variableOutflow"], 10.0);
        assert_eq!(json["date"], "2024-01-01");
    }

    #[test]
    fn test_goal_priority_parse() {
        assert_eq!("high".parse::<GoalPriority>().unwrap(), GoalPriority::High);
        assert!("urgent".parse::<GoalPriority>().is_err());
        assert!(GoalPriority::High.rank() > GoalPriority::Low.rank());
    }

    #[test]
    fn test_transaction_amount_sanitized() {
        let tx = Transaction {
            amount: -250.0,
            ..Default::default()
        };
        assert_eq!(tx.amount(), 250.0);
        let bad = Transaction {
            amount: f64::NAN,
            ..Default::default()
        };
        assert_eq!(bad.amount(), 0.0);
    }
}
