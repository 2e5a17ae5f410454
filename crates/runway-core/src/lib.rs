//! Runway Core Library
//!
//! Cash-flow engine for the Runway personal finance tool:
//! - Day-by-day balance projection from declared income and expenses
//! - Month-end and multi-month forecasts from transaction history
//! - Composite risk score and stress bands
//! - Rule-based budget and spending recommendations
//! - What-if simulation of hypothetical purchases
//! - Snapshot state that recomputes derived results on every update
//! - CSV import of transaction history

pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod projection;
pub mod recommendations;
pub mod risk;
pub mod snapshot;
pub mod whatif;

/// Sample snapshots for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{EngineConfig, ProjectionConfig, RiskConfig, RuleConfig};
pub use error::{Error, Result};
pub use import::parse_history_csv;
pub use models::{
    FixedExpenseItem, GoalPriority, HypotheticalSpend, IncomeItem, IncomeType, ProjectionDay,
    RiskLevel, SavingsGoal, Transaction, TransactionKind, VariableExpenseItem,
};
pub use projection::{
    project, select_projector, BurnRate, BurnStatus, EndOfMonthForecast, HistoricalForecaster,
    MonthForecast, Projector, ScheduleConfig, ScheduleProjector,
};
pub use recommendations::{
    merge_recommendations, Priority, Recommendation, RecommendationType, RecommendationVariant,
};
pub use risk::{
    calculate_risk_score, calculate_stress_level, RiskFactors, RiskInputs, RiskScoreResult,
    StressBand, StressLevel,
};
pub use snapshot::{
    forecast, recommend, recompute, what_if, DerivedResults, FinancialSnapshot, FinancialState,
    ForecastSummary, SubscriptionId,
};
pub use whatif::{
    explain_impact, GoalImpact, WhatIfReport, WhatIfScenario, WhatIfSimulator, WhatIfState,
};
