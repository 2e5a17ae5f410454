//! Financial snapshot and derived results
//!
//! A [`FinancialSnapshot`] is everything the engine knows about one user at
//! one point in time. [`recompute`] turns it into [`DerivedResults`]
//! (trajectory, forecast, risk, stress, recommendations) as a pure function.
//!
//! [`FinancialState`] owns a snapshot together with its derived results and
//! recomputes synchronously whenever the snapshot is updated, notifying any
//! subscribers with the fresh results.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{
    amount_or_zero, FixedExpenseItem, IncomeItem, IncomeType, ProjectionDay, SavingsGoal, Total,
    Transaction, TransactionKind, VariableExpenseItem,
};
use crate::projection::{
    add_months, days_in_month, select_projector, BurnRate, EndOfMonthForecast,
    HistoricalForecaster, MonthForecast, ScheduleConfig, ScheduleProjector,
};
use crate::recommendations::{
    generate_budget_recommendations, generate_transaction_recommendations,
    merge_recommendations, BudgetContext, Recommendation, RecommendationVariant,
    TransactionContext,
};
use crate::risk::{
    calculate_risk_score, calculate_stress_level, RiskInputs, RiskScoreResult, StressLevel,
};
use crate::whatif::{WhatIfReport, WhatIfScenario, WhatIfSimulator, WhatIfState};

/// Months rolled forward by [`recompute`]
pub const DEFAULT_FORECAST_MONTHS: u32 = 3;

/// Days of history the transaction rules look at
const ANALYSIS_WINDOW_DAYS: u64 = 30;

/// Everything known about a user's finances at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialSnapshot {
    pub as_of: NaiveDate,
    /// Balance on `as_of` (None = replay the transaction history)
    pub current_balance: Option<f64>,
    pub emergency_buffer: f64,
    /// Days to project (None = configured default)
    pub horizon_days: Option<i64>,
    pub salary_day: Option<u32>,
    pub income: Vec<IncomeItem>,
    pub fixed_expenses: Vec<FixedExpenseItem>,
    pub variable_expenses: Vec<VariableExpenseItem>,
    pub goals: Vec<SavingsGoal>,
    pub transactions: Vec<Transaction>,
    /// Monthly expense totals, oldest first
    pub expense_history: Vec<f64>,
}

impl Default for FinancialSnapshot {
    fn default() -> Self {
        Self {
            as_of: chrono::Local::now().date_naive(),
            current_balance: None,
            emergency_buffer: 0.0,
            horizon_days: None,
            salary_day: None,
            income: Vec::new(),
            fixed_expenses: Vec::new(),
            variable_expenses: Vec::new(),
            goals: Vec::new(),
            transactions: Vec::new(),
            expense_history: Vec::new(),
        }
    }
}

impl FinancialSnapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Transactions in the trailing analysis window ending on `as_of`
    pub fn window_transactions(&self) -> Vec<Transaction> {
        let start = self
            .as_of
            .checked_sub_days(Days::new(ANALYSIS_WINDOW_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);
        self.transactions
            .iter()
            .filter(|t| t.date >= start && t.date <= self.as_of)
            .cloned()
            .collect()
    }

    fn in_current_month(&self, date: NaiveDate) -> bool {
        date.year() == self.as_of.year() && date.month() == self.as_of.month() && date <= self.as_of
    }

    /// Supplied balance, or observed income minus expenses up to `as_of`
    pub fn balance(&self) -> f64 {
        match self.current_balance {
            Some(balance) => amount_or_zero(balance),
            None => self
                .transactions
                .iter()
                .filter(|t| t.date <= self.as_of)
                .map(Transaction::signed_amount)
                .total(),
        }
    }

    /// Observed transactions exist for the as-of month
    pub fn has_current_month_history(&self) -> bool {
        self.transactions.iter().any(|t| self.in_current_month(t.date))
    }

    /// Declared monthly income, or observed income over the trailing window
    pub fn monthly_income(&self) -> f64 {
        let declared: f64 = self.income.iter().map(|i| amount_or_zero(i.amount)).total();
        if declared > 0.0 {
            return declared;
        }
        self.window_transactions()
            .iter()
            .filter(|t| t.kind == TransactionKind::Income)
            .map(Transaction::amount)
            .total()
    }

    pub fn fixed_total(&self) -> f64 {
        self.fixed_expenses
            .iter()
            .filter(|f| f.is_active)
            .map(|f| amount_or_zero(f.amount))
            .total()
    }

    pub fn variable_total(&self) -> f64 {
        self.variable_expenses
            .iter()
            .map(|v| amount_or_zero(v.amount))
            .total()
    }

    /// Declared monthly outgoings, or observed spend over the trailing window
    pub fn monthly_expenses(&self) -> f64 {
        let declared = self.fixed_total() + self.variable_total();
        if declared > 0.0 {
            return declared;
        }
        self.window_transactions()
            .iter()
            .filter(|t| t.is_expense())
            .map(Transaction::amount)
            .total()
    }

    /// Explicit salary day, else the first fixed income day, else the default
    pub fn effective_salary_day(&self, config: &EngineConfig) -> u32 {
        self.salary_day
            .or_else(|| {
                self.income
                    .iter()
                    .find(|i| i.income_type == IncomeType::Fixed && i.day_of_month > 0)
                    .map(|i| i.day_of_month)
            })
            .unwrap_or(config.projection.default_salary_day)
    }

    pub fn horizon(&self, config: &EngineConfig) -> i64 {
        self.horizon_days
            .unwrap_or(config.projection.default_horizon_days)
    }

    /// Supplied expense history, or complete months derived from transactions
    pub fn monthly_expense_history(&self) -> Vec<f64> {
        if !self.expense_history.is_empty() {
            return self.expense_history.clone();
        }
        let current = (self.as_of.year(), self.as_of.month());
        let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for t in self.transactions.iter().filter(|t| t.is_expense()) {
            let key = (t.date.year(), t.date.month());
            if key < current {
                *totals.entry(key).or_insert(0.0) += t.amount();
            }
        }
        totals.into_values().collect()
    }

    pub fn risk_inputs(&self) -> RiskInputs {
        RiskInputs {
            current_balance: self.balance(),
            monthly_income: self.monthly_income(),
            monthly_expenses: self.monthly_expenses(),
            emergency_buffer: self.emergency_buffer,
            expense_history: self.monthly_expense_history(),
        }
    }

    /// Schedule projector input starting on `as_of`
    pub fn schedule_config(&self, config: &EngineConfig) -> ScheduleConfig {
        ScheduleConfig {
            start_balance: self.balance(),
            start_date: self.as_of,
            days: self.horizon(config),
            income: self.income.clone(),
            fixed_expenses: self.fixed_expenses.clone(),
            variable_expenses: self.variable_expenses.clone(),
            emergency_buffer: self.emergency_buffer,
            hypothetical_spend: None,
        }
    }

    pub fn historical_forecaster(&self, config: &EngineConfig) -> HistoricalForecaster<'_> {
        HistoricalForecaster::new(
            self.monthly_income(),
            &self.fixed_expenses,
            &self.transactions,
            self.as_of,
        )
        .with_opening_balance(self.balance())
        .with_salary_day(self.effective_salary_day(config))
        .with_emergency_buffer(self.emergency_buffer)
        .with_max_months(config.projection.max_forecast_months)
        .with_burn_bands(config.rules.burn_rate_high, config.rules.burn_rate_moderate)
    }

    /// Lower-cased category -> spend this month
    ///
    /// Observed variable spend when there is history for the month, declared
    /// variable budgets otherwise.
    pub fn category_spend(&self) -> BTreeMap<String, f64> {
        let mut spend: BTreeMap<String, f64> = BTreeMap::new();
        if self.has_current_month_history() {
            for t in self
                .transactions
                .iter()
                .filter(|t| t.is_variable_expense() && self.in_current_month(t.date))
            {
                *spend.entry(t.category.trim().to_lowercase()).or_insert(0.0) += t.amount();
            }
        } else {
            for v in &self.variable_expenses {
                *spend.entry(v.category.trim().to_lowercase()).or_insert(0.0) +=
                    amount_or_zero(v.amount);
            }
        }
        spend.remove("");
        spend
    }
}

/// Month-end and multi-month outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    /// "historical" or "schedule"
    pub projector: String,
    pub predicted_end_balance: f64,
    /// Present for the historical projector
    pub end_of_month: Option<EndOfMonthForecast>,
    pub burn_rate: BurnRate,
    pub next_months: Vec<MonthForecast>,
}

/// Build the month-end and `months`-ahead forecast for a snapshot
pub fn forecast(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    months: u32,
) -> ForecastSummary {
    let forecaster = snapshot.historical_forecaster(config);

    if snapshot.has_current_month_history() {
        let burn_rate = forecaster.calculate_burn_rate();
        let end_of_month = forecaster.predict_end_of_month(forecaster.current_day());
        return ForecastSummary {
            projector: "historical".to_string(),
            predicted_end_balance: end_of_month.predicted_end_balance,
            end_of_month: Some(end_of_month),
            burn_rate,
            next_months: forecaster.predict_next_months(months),
        };
    }

    // Declared schedule through the last day of the month
    let remaining = days_in_month(snapshot.as_of) - snapshot.as_of.day() + 1;
    let month_config = ScheduleConfig {
        days: remaining as i64,
        ..snapshot.schedule_config(config)
    };
    let predicted_end_balance = ScheduleProjector::with_settings(month_config, &config.projection)
        .project()
        .last()
        .map(|d| d.balance)
        .unwrap_or_else(|| snapshot.balance());

    let burn_rate = forecaster.budgeted_burn_rate(snapshot.variable_total());
    ForecastSummary {
        projector: "schedule".to_string(),
        predicted_end_balance,
        end_of_month: None,
        burn_rate,
        next_months: schedule_months(snapshot, config, predicted_end_balance, months),
    }
}

/// Roll declared monthly totals forward from a starting balance
fn schedule_months(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    start: f64,
    months: u32,
) -> Vec<MonthForecast> {
    let months = months.min(config.projection.max_forecast_months);
    let income: f64 = snapshot.income.iter().map(|i| amount_or_zero(i.amount)).total();
    let fixed = snapshot.fixed_total();
    let variable = snapshot.variable_total();

    let mut balance = start;
    let mut forecasts = Vec::with_capacity(months as usize);
    for offset in 1..=months {
        let Some(month_start) = add_months(snapshot.as_of, offset) else {
            break;
        };
        let starting_balance = balance;
        balance += income - fixed - variable;
        forecasts.push(MonthForecast {
            month: month_start.format("%Y-%m").to_string(),
            starting_balance,
            income,
            fixed_expenses: fixed,
            variable_expenses: variable,
            ending_balance: balance,
        });
    }
    forecasts
}

/// Run one or both rule batteries over a snapshot
pub fn recommend(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    variant: RecommendationVariant,
) -> Vec<Recommendation> {
    let summary = forecast(snapshot, config, 0);
    recommend_with_forecast(snapshot, config, variant, &summary)
}

fn recommend_with_forecast(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    variant: RecommendationVariant,
    summary: &ForecastSummary,
) -> Vec<Recommendation> {
    let budget = || {
        generate_budget_recommendations(&BudgetContext {
            as_of: snapshot.as_of,
            monthly_income: snapshot.monthly_income(),
            emergency_buffer: snapshot.emergency_buffer,
            predicted_end_balance: summary.predicted_end_balance,
            burn_rate: summary.burn_rate.clone(),
            category_spend: snapshot.category_spend(),
            goals: &snapshot.goals,
            fixed_expenses: &snapshot.fixed_expenses,
            rules: &config.rules,
        })
    };

    let window = snapshot.window_transactions();
    let transactions = || {
        generate_transaction_recommendations(&TransactionContext {
            monthly_income: snapshot.monthly_income(),
            current_balance: snapshot.balance(),
            emergency_buffer: snapshot.emergency_buffer,
            transactions: &window,
            goals: &snapshot.goals,
            rules: &config.rules,
        })
    };

    match variant {
        RecommendationVariant::Budget => budget(),
        RecommendationVariant::Transactions => transactions(),
        RecommendationVariant::All => merge_recommendations(budget(), transactions()),
    }
}

/// Run a what-if scenario against the snapshot's declared schedule
pub fn what_if(
    snapshot: &FinancialSnapshot,
    config: &EngineConfig,
    scenario: &WhatIfScenario,
) -> WhatIfReport {
    WhatIfSimulator::new(
        snapshot.schedule_config(config),
        &config.projection,
        &config.risk,
    )
    .with_risk_inputs(snapshot.risk_inputs())
    .with_goals(&snapshot.goals)
    .simulate(scenario)
}

/// Everything derived from a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedResults {
    /// Projector that produced `projection`
    pub projector: String,
    pub projection: Vec<ProjectionDay>,
    pub forecast: ForecastSummary,
    pub risk: RiskScoreResult,
    pub stress: StressLevel,
    pub recommendations: Vec<Recommendation>,
}

/// Derive all results from a snapshot
pub fn recompute(snapshot: &FinancialSnapshot, config: &EngineConfig) -> DerivedResults {
    let projector = select_projector(snapshot, config);
    let projection = projector.timeline();
    let summary = forecast(snapshot, config, DEFAULT_FORECAST_MONTHS);
    let risk = calculate_risk_score(&snapshot.risk_inputs());
    let stress = calculate_stress_level(risk.score, &config.risk);
    let recommendations =
        recommend_with_forecast(snapshot, config, RecommendationVariant::All, &summary);

    tracing::debug!(
        projector = projector.name(),
        days = projection.len(),
        score = risk.score,
        recommendations = recommendations.len(),
        "Snapshot recomputed"
    );

    DerivedResults {
        projector: projector.name().to_string(),
        projection,
        forecast: summary,
        risk,
        stress,
        recommendations,
    }
}

type Subscriber = Box<dyn Fn(&DerivedResults) + Send + Sync>;

/// Handle returned by [`FinancialState::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// A snapshot with its derived results kept current
pub struct FinancialState {
    config: EngineConfig,
    snapshot: FinancialSnapshot,
    derived: DerivedResults,
    what_if: WhatIfState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: usize,
}

impl FinancialState {
    pub fn new(snapshot: FinancialSnapshot, config: EngineConfig) -> Self {
        let derived = recompute(&snapshot, &config);
        Self {
            config,
            snapshot,
            derived,
            what_if: WhatIfState::new(),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn snapshot(&self) -> &FinancialSnapshot {
        &self.snapshot
    }

    pub fn derived(&self) -> &DerivedResults {
        &self.derived
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutate the snapshot, recompute and notify subscribers
    ///
    /// Any stored what-if report is cleared since it no longer matches.
    pub fn update<F>(&mut self, f: F) -> &DerivedResults
    where
        F: FnOnce(&mut FinancialSnapshot),
    {
        f(&mut self.snapshot);
        self.derived = recompute(&self.snapshot, &self.config);
        self.what_if.clear();

        for (_, subscriber) in &self.subscribers {
            subscriber(&self.derived);
        }
        &self.derived
    }

    /// Register a callback run after every update
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&DerivedResults) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Simulate a scenario and keep the report
    pub fn run_what_if(&mut self, scenario: &WhatIfScenario) -> &WhatIfReport {
        let report = what_if(&self.snapshot, &self.config, scenario);
        self.what_if.set(report)
    }

    pub fn what_if(&self) -> Option<&WhatIfReport> {
        self.what_if.report()
    }

    pub fn clear_what_if(&mut self) {
        self.what_if.clear();
    }
}
