//! Composite risk score and stress bands
//!
//! The score is built from four factors (max 100):
//!
//! | Factor                 | Max | Source                                   |
//! |------------------------|-----|------------------------------------------|
//! | balance adequacy       | 40  | balance relative to one month of income  |
//! | income stability       | 30  | flat placeholder                         |
//! | expense predictability | 20  | 1 - coefficient of variation of history  |
//! | safety margin          | 10  | balance relative to the emergency buffer |
//!
//! The score does not look at any projected trajectory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::RiskConfig;
use crate::models::{amount_or_zero, Total};

const BALANCE_ADEQUACY_MAX: f64 = 40.0;
const INCOME_STABILITY_SCORE: f64 = 30.0;
const EXPENSE_PREDICTABILITY_MAX: f64 = 20.0;
const SAFETY_MARGIN_MAX: f64 = 10.0;

/// Inputs to [`calculate_risk_score`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskInputs {
    pub current_balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub emergency_buffer: f64,
    /// Monthly expense totals, oldest first
    pub expense_history: Vec<f64>,
}

/// Per-factor breakdown of a risk score
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub balance_adequacy: f64,
    pub income_stability: f64,
    pub expense_predictability: f64,
    pub safety_margin: f64,
}

impl RiskFactors {
    pub fn total(&self) -> f64 {
        self.balance_adequacy
            + self.income_stability
            + self.expense_predictability
            + self.safety_margin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreResult {
    /// 0-100, higher is healthier
    pub score: f64,
    pub factors: RiskFactors,
    /// Months the balance lasts at the current expense level (0 without expenses)
    pub months_of_runway: f64,
}

/// Stress band derived from a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressBand {
    Low,
    Moderate,
    High,
}

impl StressBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for StressBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StressBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown stress level: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressLevel {
    pub level: StressBand,
    pub message: String,
}

/// Population coefficient of variation (stddev / mean)
///
/// None with fewer than two values or a non-positive mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let values: Vec<f64> = values.iter().copied().map(amount_or_zero).collect();
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().copied().total() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).total() / n;
    Some(variance.sqrt() / mean)
}

fn balance_adequacy(balance: f64, income: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    BALANCE_ADEQUACY_MAX * (balance.max(0.0) / income).min(1.0)
}

fn expense_predictability(history: &[f64]) -> f64 {
    match coefficient_of_variation(history) {
        Some(cv) => EXPENSE_PREDICTABILITY_MAX * (1.0 - cv).max(0.0),
        None => 0.0,
    }
}

/// Balance as a percentage of the emergency buffer, clamped to 0-100
pub fn buffer_adequacy(balance: f64, buffer: f64) -> f64 {
    if buffer <= 0.0 {
        return if balance >= 0.0 { 100.0 } else { 0.0 };
    }
    (balance / buffer * 100.0).clamp(0.0, 100.0)
}

/// Score financial health on a 0-100 scale
pub fn calculate_risk_score(inputs: &RiskInputs) -> RiskScoreResult {
    let balance = amount_or_zero(inputs.current_balance);
    let income = amount_or_zero(inputs.monthly_income);
    let expenses = amount_or_zero(inputs.monthly_expenses);
    let buffer = amount_or_zero(inputs.emergency_buffer);

    let factors = RiskFactors {
        balance_adequacy: balance_adequacy(balance, income),
        income_stability: INCOME_STABILITY_SCORE,
        expense_predictability: expense_predictability(&inputs.expense_history),
        safety_margin: SAFETY_MARGIN_MAX * buffer_adequacy(balance, buffer) / 100.0,
    };

    let score = amount_or_zero(factors.total()).clamp(0.0, 100.0);
    let months_of_runway = if expenses > 0.0 {
        (balance / expenses).max(0.0)
    } else {
        0.0
    };

    tracing::debug!(
        score,
        balance_adequacy = factors.balance_adequacy,
        expense_predictability = factors.expense_predictability,
        safety_margin = factors.safety_margin,
        "Risk score calculated"
    );

    RiskScoreResult {
        score,
        factors,
        months_of_runway,
    }
}

/// Map a risk score to a stress band with an explanatory message
pub fn calculate_stress_level(score: f64, config: &RiskConfig) -> StressLevel {
    let score = amount_or_zero(score);
    if score >= config.low_stress_min {
        StressLevel {
            level: StressBand::Low,
            message: format!(
                "Financial stress is low (score {:.0}/100). Your balance and buffer comfortably cover upcoming expenses.",
                score
            ),
        }
    } else if score >= config.moderate_stress_min {
        StressLevel {
            level: StressBand::Moderate,
            message: format!(
                "Financial stress is moderate (score {:.0}/100). Keep an eye on discretionary spending this month.",
                score
            ),
        }
    } else {
        StressLevel {
            level: StressBand::High,
            message: format!(
                "Financial stress is high (score {:.0}/100). Your balance is thin relative to income and obligations.",
                score
            ),
        }
    }
}
