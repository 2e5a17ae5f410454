//! Schedule-based projector
//!
//! Simulates a balance day by day from declared recurring items:
//! - income and active fixed expenses land on their day of month
//! - the monthly variable budget is spread evenly over a fixed 30-day divisor
//! - an optional hypothetical spend is taken out on its day offset
//!
//! The output is a pure function of the input; degenerate input gives an
//! empty or zero-filled trajectory rather than an error.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::ProjectionConfig;
use crate::models::{
    amount_or_zero, FixedExpenseItem, HypotheticalSpend, IncomeItem, ProjectionDay, Total,
    VariableExpenseItem,
};

use super::Projector;

/// Input to the schedule projector
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    pub start_balance: f64,
    pub start_date: NaiveDate,
    pub days: i64,
    pub income: Vec<IncomeItem>,
    pub fixed_expenses: Vec<FixedExpenseItem>,
    pub variable_expenses: Vec<VariableExpenseItem>,
    pub emergency_buffer: f64,
    pub hypothetical_spend: Option<HypotheticalSpend>,
}

impl ScheduleConfig {
    /// Copy of this config with a hypothetical spend injected
    pub fn with_hypothetical(&self, spend: HypotheticalSpend) -> Self {
        Self {
            hypothetical_spend: Some(spend),
            ..self.clone()
        }
    }

    /// Sum of monthly variable budgets
    pub fn variable_total(&self) -> f64 {
        self.variable_expenses
            .iter()
            .map(|v| amount_or_zero(v.amount))
            .total()
    }
}

/// Day-by-day projector over declared recurring items
#[derive(Debug, Clone)]
pub struct ScheduleProjector {
    config: ScheduleConfig,
    max_horizon_days: i64,
    variable_divisor: f64,
}

impl ScheduleProjector {
    pub fn new(config: ScheduleConfig) -> Self {
        Self::with_settings(config, &ProjectionConfig::default())
    }

    pub fn with_settings(config: ScheduleConfig, settings: &ProjectionConfig) -> Self {
        Self {
            config,
            max_horizon_days: settings.max_horizon_days,
            variable_divisor: settings.variable_divisor,
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Number of days that will be projected after clamping
    fn horizon(&self) -> i64 {
        let days = self.config.days;
        if days > self.max_horizon_days {
            tracing::warn!(
                requested = days,
                max = self.max_horizon_days,
                "Projection horizon clamped"
            );
            self.max_horizon_days
        } else {
            days.max(0)
        }
    }

    fn daily_variable(&self) -> f64 {
        if self.variable_divisor > 0.0 {
            self.config.variable_total() / self.variable_divisor
        } else {
            0.0
        }
    }

    /// Run the simulation
    pub fn project(&self) -> Vec<ProjectionDay> {
        let horizon = self.horizon();
        if horizon == 0 {
            return Vec::new();
        }

        let buffer = amount_or_zero(self.config.emergency_buffer);
        let variable_outflow = self.daily_variable();
        let mut balance = amount_or_zero(self.config.start_balance);
        let mut days = Vec::with_capacity(horizon as usize);

        for d in 0..horizon {
            let Some(date) = self.config.start_date.checked_add_days(Days::new(d as u64)) else {
                break;
            };
            let dom = date.day();

            let inflow: f64 = self
                .config
                .income
                .iter()
                .filter(|i| i.day_of_month == dom)
                .map(|i| amount_or_zero(i.amount))
                .total();

            let fixed_outflow: f64 = self
                .config
                .fixed_expenses
                .iter()
                .filter(|f| f.is_active && f.day_of_month == dom)
                .map(|f| amount_or_zero(f.amount))
                .total();

            let hypothetical_outflow = self
                .config
                .hypothetical_spend
                .as_ref()
                .map(|h| hypothetical_outflow(h, d))
                .unwrap_or(0.0);

            balance += inflow - fixed_outflow - variable_outflow - hypothetical_outflow;

            days.push(ProjectionDay::new(
                d as u32,
                date,
                balance,
                inflow,
                fixed_outflow,
                variable_outflow,
                hypothetical_outflow,
                buffer,
            ));
        }

        days
    }
}

impl Projector for ScheduleProjector {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn start_balance(&self) -> f64 {
        amount_or_zero(self.config.start_balance)
    }

    fn timeline(&self) -> Vec<ProjectionDay> {
        self.project()
    }
}

/// Project with default settings
pub fn project(config: &ScheduleConfig) -> Vec<ProjectionDay> {
    ScheduleProjector::new(config.clone()).project()
}

/// Outflow of a hypothetical spend on day `d`.
///
/// Negative and non-finite amounts count as 0. A duration spreads the amount
/// evenly over consecutive days starting at `spend.day`.
fn hypothetical_outflow(spend: &HypotheticalSpend, d: i64) -> f64 {
    let amount = amount_or_zero(spend.amount).max(0.0);
    if amount == 0.0 {
        return 0.0;
    }
    let duration = spend.duration.unwrap_or(1).max(1) as i64;
    if d >= spend.day && d < spend.day.saturating_add(duration) {
        amount / duration as f64
    } else {
        0.0
    }
}
