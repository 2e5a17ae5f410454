//! Core types for recommendations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::GoalPriority;

/// How urgently a recommendation should be acted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Moderate,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Moderate => "moderate",
            Priority::Low => "low",
        }
    }

    /// Numeric rank for sorting (higher = more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Moderate => 2,
            Priority::Low => 1,
        }
    }
}

impl From<GoalPriority> for Priority {
    fn from(priority: GoalPriority) -> Self {
        match priority {
            GoalPriority::High => Priority::High,
            GoalPriority::Medium => Priority::Moderate,
            GoalPriority::Low => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "moderate" => Ok(Priority::Moderate),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Kind of recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    /// Something is going wrong and needs action
    Warning,
    /// An adjustment that would improve the outlook
    Suggestion,
    /// Positive feedback, nothing to fix
    Positive,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Warning => "warning",
            RecommendationType::Suggestion => "suggestion",
            RecommendationType::Positive => "positive",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which rule battery to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationVariant {
    /// Declared budgets, goals and the month-end forecast
    Budget,
    /// Observed categorized transactions
    Transactions,
    /// Both, merged and sorted
    #[default]
    All,
}

impl RecommendationVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationVariant::Budget => "budget",
            RecommendationVariant::Transactions => "transactions",
            RecommendationVariant::All => "all",
        }
    }
}

impl fmt::Display for RecommendationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecommendationVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget" => Ok(RecommendationVariant::Budget),
            "transactions" => Ok(RecommendationVariant::Transactions),
            "all" => Ok(RecommendationVariant::All),
            _ => Err(format!("Unknown recommendation variant: {}", s)),
        }
    }
}

/// Estimated effect of following a recommendation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    /// Money freed up (or at stake) per month
    pub balance_change: f64,
    /// Risk score points recovered
    pub risk_reduction: f64,
}

/// An explainable, prioritized recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Stable key for deduplication (e.g. "category:food")
    pub id: String,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub message: String,
    pub impact: Impact,
    /// Ordered steps, most effective first
    pub actions: Vec<String>,
    /// 0.0 - 1.0
    pub confidence: f64,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        priority: Priority,
        recommendation_type: RecommendationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            priority,
            recommendation_type,
            title: title.into(),
            message: message.into(),
            impact: Impact::default(),
            actions: Vec::new(),
            confidence: 1.0,
        }
    }

    pub fn with_impact(mut self, balance_change: f64, risk_reduction: f64) -> Self {
        self.impact = Impact {
            balance_change,
            risk_reduction,
        };
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Set confidence (clamped to 0-1)
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn is_positive(&self) -> bool {
        self.recommendation_type == RecommendationType::Positive
    }
}

/// Sort high > moderate > low, keeping generation order within a priority
pub fn sort_by_priority(recommendations: &mut [Recommendation]) {
    // slice::sort_by is stable
    recommendations.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
}

/// Format a whole-unit amount with two decimals and thousands separators
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{}", grouped, frac)
    } else {
        format!("{}.{}", grouped, frac)
    }
}
