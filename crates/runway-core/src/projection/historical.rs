//! Historical-average forecaster
//!
//! Extrapolates from what the user actually spent rather than from a declared
//! budget:
//! - end-of-month balance from the month-to-date average daily spend
//! - multi-month roll-forward from the average of past complete months
//! - burn rate (projected monthly spend as a share of income)

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{amount_or_zero, FixedExpenseItem, ProjectionDay, Total, Transaction};

use super::{add_months, days_in_month, Projector};

/// End-of-month prediction and its components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfMonthForecast {
    pub current_day: u32,
    pub days_in_month: u32,
    pub days_remaining: u32,
    pub current_balance: f64,
    pub fixed_expenses_remaining: f64,
    pub average_daily_spending: f64,
    pub predicted_variable_expenses: f64,
    pub expected_income_remaining: f64,
    pub predicted_end_balance: f64,
}

/// One month of a multi-month roll-forward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthForecast {
    /// "YYYY-MM"
    pub month: String,
    pub starting_balance: f64,
    pub income: f64,
    pub fixed_expenses: f64,
    pub variable_expenses: f64,
    pub ending_balance: f64,
}

/// Burn-rate band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnStatus {
    Low,
    Moderate,
    High,
}

impl BurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// How fast discretionary money is leaving relative to income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnRate {
    pub daily_burn_rate: f64,
    pub projected_monthly_burn: f64,
    pub burn_ratio: f64,
    pub status: BurnStatus,
}

/// Forecaster over observed transaction history
#[derive(Debug, Clone)]
pub struct HistoricalForecaster<'a> {
    monthly_income: f64,
    fixed_expenses: &'a [FixedExpenseItem],
    transactions: &'a [Transaction],
    as_of: NaiveDate,
    opening_balance: Option<f64>,
    salary_day: u32,
    emergency_buffer: f64,
    max_months: u32,
    burn_high: f64,
    burn_moderate: f64,
}

impl<'a> HistoricalForecaster<'a> {
    pub fn new(
        monthly_income: f64,
        fixed_expenses: &'a [FixedExpenseItem],
        transactions: &'a [Transaction],
        as_of: NaiveDate,
    ) -> Self {
        Self {
            monthly_income: amount_or_zero(monthly_income),
            fixed_expenses,
            transactions,
            as_of,
            opening_balance: None,
            salary_day: 1,
            emergency_buffer: 0.0,
            max_months: 60,
            burn_high: 0.9,
            burn_moderate: 0.7,
        }
    }

    /// Known balance at the start of `as_of`, used instead of replaying the
    /// ledger. The as-of day's own bills, salary and spend are then still
    /// ahead, as in the schedule projector.
    pub fn with_opening_balance(mut self, balance: f64) -> Self {
        self.opening_balance = Some(amount_or_zero(balance));
        self
    }

    /// Day of month the salary is expected
    pub fn with_salary_day(mut self, day: u32) -> Self {
        self.salary_day = day;
        self
    }

    pub fn with_emergency_buffer(mut self, buffer: f64) -> Self {
        self.emergency_buffer = amount_or_zero(buffer);
        self
    }

    pub fn with_max_months(mut self, months: u32) -> Self {
        self.max_months = months;
        self
    }

    /// Burn-ratio thresholds for the high and moderate bands
    pub fn with_burn_bands(mut self, high: f64, moderate: f64) -> Self {
        self.burn_high = high;
        self.burn_moderate = moderate;
        self
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn monthly_income(&self) -> f64 {
        self.monthly_income
    }

    pub fn current_day(&self) -> u32 {
        self.as_of.day()
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.as_of)
    }

    /// Opening balance when known, otherwise observed income minus observed
    /// expenses up to the end of `as_of`
    pub fn current_balance(&self) -> f64 {
        match self.opening_balance {
            Some(balance) => balance,
            None => self
                .transactions
                .iter()
                .filter(|t| t.date <= self.as_of)
                .map(Transaction::signed_amount)
                .total(),
        }
    }

    fn in_current_month(&self, date: NaiveDate) -> bool {
        date.year() == self.as_of.year() && date.month() == self.as_of.month() && date <= self.as_of
    }

    /// Discretionary spend so far this month
    pub fn this_month_variable_total(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.is_variable_expense() && self.in_current_month(t.date))
            .map(|t| t.amount())
            .total()
    }

    /// Sum of all active fixed expenses
    pub fn fixed_total(&self) -> f64 {
        self.fixed_expenses
            .iter()
            .filter(|f| f.is_active)
            .map(|f| amount_or_zero(f.amount))
            .total()
    }

    /// Due day clamped into the current month (a 31st bill lands on the 30th)
    fn effective_day(&self, day: u32) -> u32 {
        day.min(self.days_in_month())
    }

    /// First day of the month whose flows are not yet in the balance
    fn first_pending_day(&self, current_day: u32) -> u32 {
        if self.opening_balance.is_some() {
            current_day.max(1)
        } else {
            current_day + 1
        }
    }

    fn average_daily(&self, current_day: u32) -> f64 {
        if current_day == 0 {
            0.0
        } else {
            self.this_month_variable_total() / current_day as f64
        }
    }

    /// Predict the balance on the last day of the current month
    pub fn predict_end_of_month(&self, current_day: u32) -> EndOfMonthForecast {
        let days_in_month = self.days_in_month();
        let current_day = current_day.min(days_in_month);
        let pending_from = self.first_pending_day(current_day);
        let days_remaining = days_in_month + 1 - pending_from;
        let current_balance = self.current_balance();

        let fixed_expenses_remaining: f64 = self
            .fixed_expenses
            .iter()
            .filter(|f| f.is_active && self.effective_day(f.day_of_month) >= pending_from)
            .map(|f| amount_or_zero(f.amount))
            .total();

        let average_daily_spending = self.average_daily(current_day);
        let predicted_variable_expenses = average_daily_spending * days_remaining as f64;

        let expected_income_remaining = if self.effective_day(self.salary_day) >= pending_from {
            self.monthly_income
        } else {
            0.0
        };

        let predicted_end_balance = current_balance - fixed_expenses_remaining
            - predicted_variable_expenses
            + expected_income_remaining;

        EndOfMonthForecast {
            current_day,
            days_in_month,
            days_remaining,
            current_balance,
            fixed_expenses_remaining,
            average_daily_spending,
            predicted_variable_expenses,
            expected_income_remaining,
            predicted_end_balance,
        }
    }

    /// Variable spend per complete month before the current one
    pub fn monthly_variable_totals(&self) -> BTreeMap<(i32, u32), f64> {
        let current = (self.as_of.year(), self.as_of.month());
        let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for t in self.transactions.iter().filter(|t| t.is_variable_expense()) {
            let key = (t.date.year(), t.date.month());
            if key < current {
                *totals.entry(key).or_insert(0.0) += t.amount();
            }
        }
        totals
    }

    /// Average monthly variable spend, falling back to this month's projected burn
    pub fn average_monthly_variable(&self) -> f64 {
        let totals = self.monthly_variable_totals();
        if totals.is_empty() {
            self.calculate_burn_rate().projected_monthly_burn
        } else {
            totals.values().copied().total() / totals.len() as f64
        }
    }

    /// Roll the balance forward `months` months past the current one
    pub fn predict_next_months(&self, months: u32) -> Vec<MonthForecast> {
        let months = if months > self.max_months {
            tracing::warn!(requested = months, max = self.max_months, "Forecast months clamped");
            self.max_months
        } else {
            months
        };

        let income = self.monthly_income;
        let fixed = self.fixed_total();
        let variable = self.average_monthly_variable();
        let mut balance = self.predict_end_of_month(self.current_day()).predicted_end_balance;

        let mut forecasts = Vec::with_capacity(months as usize);
        for offset in 1..=months {
            let Some(month_start) = add_months(self.as_of, offset) else {
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

    /// Day-by-day walk over the rest of the current month
    pub fn generate_daily_timeline(&self) -> Vec<ProjectionDay> {
        let current_day = self.current_day();
        let days_in_month = self.days_in_month();
        let daily_spend = self.average_daily(current_day);
        let salary_day = self.effective_day(self.salary_day);
        let mut balance = self.current_balance();
        let mut timeline = Vec::new();

        for (index, dom) in (self.first_pending_day(current_day)..=days_in_month).enumerate() {
            let Some(date) = self.as_of.with_day(dom) else {
                break;
            };

            let fixed_outflow: f64 = self
                .fixed_expenses
                .iter()
                .filter(|f| f.is_active && self.effective_day(f.day_of_month) == dom)
                .map(|f| amount_or_zero(f.amount))
                .total();
            let inflow = if dom == salary_day {
                self.monthly_income
            } else {
                0.0
            };

            balance += inflow - fixed_outflow - daily_spend;
            timeline.push(ProjectionDay::new(
                index as u32,
                date,
                balance,
                inflow,
                fixed_outflow,
                daily_spend,
                0.0,
                self.emergency_buffer,
            ));
        }

        timeline
    }

    /// Month-to-date burn extrapolated to a full month
    pub fn calculate_burn_rate(&self) -> BurnRate {
        let daily_burn_rate = self.average_daily(self.current_day());
        self.burn_rate(daily_burn_rate, daily_burn_rate * self.days_in_month() as f64)
    }

    /// Burn implied by a declared monthly variable budget, for months with
    /// no observed spending yet
    pub fn budgeted_burn_rate(&self, monthly_budget: f64) -> BurnRate {
        let projected_monthly_burn = amount_or_zero(monthly_budget).max(0.0);
        self.burn_rate(
            projected_monthly_burn / self.days_in_month() as f64,
            projected_monthly_burn,
        )
    }

    fn burn_rate(&self, daily_burn_rate: f64, projected_monthly_burn: f64) -> BurnRate {
        let burn_ratio = if self.monthly_income > 0.0 {
            projected_monthly_burn / self.monthly_income
        } else {
            0.0
        };

        let status = if burn_ratio >= self.burn_high {
            BurnStatus::High
        } else if burn_ratio >= self.burn_moderate {
            BurnStatus::Moderate
        } else {
            BurnStatus::Low
        };

        BurnRate {
            daily_burn_rate,
            projected_monthly_burn,
            burn_ratio,
            status,
        }
    }
}

impl Projector for HistoricalForecaster<'_> {
    fn name(&self) -> &'static str {
        "historical"
    }

    fn start_balance(&self) -> f64 {
        self.current_balance()
    }

    fn timeline(&self) -> Vec<ProjectionDay> {
        self.generate_daily_timeline()
    }

    fn end_balance(&self) -> f64 {
        self.predict_end_of_month(self.current_day())
            .predicted_end_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(d: NaiveDate, amount: f64, kind: TransactionKind, category: &str) -> Transaction {
        Transaction {
            date: d,
            amount,
            kind,
            category: category.to_string(),
            ..Default::default()
        }
    }

    fn fixed(amount: f64, day: u32) -> FixedExpenseItem {
        FixedExpenseItem {
            name: format!("bill-{}", day),
            amount,
            day_of_month: day,
            ..Default::default()
        }
    }

    /// June 2024 (30 days), as of the 10th: 50k in, 3k variable spent so far
    fn history() -> Vec<Transaction> {
        vec![
            tx(date(2024, 4, 1), 50000.0, TransactionKind::Income, "salary"),
            tx(date(2024, 4, 12), 9000.0, TransactionKind::Expense, "food"),
            tx(date(2024, 5, 1), 50000.0, TransactionKind::Income, "salary"),
            tx(date(2024, 5, 20), 11000.0, TransactionKind::Expense, "shopping"),
            tx(date(2024, 6, 1), 50000.0, TransactionKind::Income, "salary"),
            tx(date(2024, 6, 3), 1000.0, TransactionKind::Expense, "food"),
            tx(date(2024, 6, 8), 2000.0, TransactionKind::Expense, "travel"),
            Transaction {
                recurring: true,
                ..tx(date(2024, 6, 5), 15000.0, TransactionKind::Expense, "rent")
            },
        ]
    }

    #[test]
    fn test_current_balance_and_variable_total() {
        let txs = history();
        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10));
        assert_eq!(f.current_balance(), 150000.0 - 9000.0 - 11000.0 - 3000.0 - 15000.0);
        // Recurring rent is not discretionary
        assert_eq!(f.this_month_variable_total(), 3000.0);
    }

    #[test]
    fn test_current_balance_ignores_transactions_after_as_of() {
        let txs = vec![
            tx(date(2024, 6, 5), 1000.0, TransactionKind::Income, "salary"),
            tx(date(2024, 6, 6), 100.0, TransactionKind::Expense, "food"),
            tx(date(2024, 9, 1), 50000.0, TransactionKind::Expense, "travel"),
        ];
        let f = HistoricalForecaster::new(0.0, &[], &txs, date(2024, 6, 10));
        assert_eq!(f.current_balance(), 900.0);
    }

    #[test]
    fn test_opening_balance_replaces_ledger() {
        let txs = history();
        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10))
            .with_opening_balance(52500.0);
        assert_eq!(f.current_balance(), 52500.0);
        assert_eq!(f.start_balance(), 52500.0);

        let eom = f.predict_end_of_month(10);
        assert_eq!(eom.current_balance, 52500.0);
        // The 10th is still ahead: 300/day over 21 days
        assert_eq!(eom.days_remaining, 21);
        assert_eq!(eom.predicted_end_balance, 52500.0 - 6300.0);

        let timeline = f.generate_daily_timeline();
        assert_eq!(timeline[0].date, date(2024, 6, 10));
        assert_eq!(timeline.len(), 21);
        assert!((timeline.last().unwrap().balance - eom.predicted_end_balance).abs() < 1e-6);
    }

    #[test]
    fn test_opening_balance_keeps_as_of_bills_pending() {
        let bills = vec![fixed(15000.0, 1), fixed(2000.0, 15)];
        let f = HistoricalForecaster::new(75000.0, &bills, &[], date(2024, 1, 1))
            .with_salary_day(1)
            .with_opening_balance(52500.0);
        let eom = f.predict_end_of_month(1);
        assert_eq!(eom.fixed_expenses_remaining, 17000.0);
        assert_eq!(eom.expected_income_remaining, 75000.0);
        assert_eq!(eom.predicted_end_balance, 52500.0 + 75000.0 - 17000.0);
    }

    #[test]
    fn test_predict_end_of_month() {
        let txs = history();
        let bills = vec![fixed(15000.0, 5), fixed(4000.0, 20), fixed(1000.0, 25)];
        let f = HistoricalForecaster::new(50000.0, &bills, &txs, date(2024, 6, 10))
            .with_salary_day(1);

        let eom = f.predict_end_of_month(10);
        assert_eq!(eom.days_in_month, 30);
        assert_eq!(eom.days_remaining, 20);
        assert_eq!(eom.fixed_expenses_remaining, 5000.0);
        assert_eq!(eom.average_daily_spending, 300.0);
        assert_eq!(eom.predicted_variable_expenses, 6000.0);
        // Salary on the 1st already arrived
        assert_eq!(eom.expected_income_remaining, 0.0);
        assert_eq!(
            eom.predicted_end_balance,
            eom.current_balance - 5000.0 - 6000.0
        );
    }

    #[test]
    fn test_salary_after_current_day_is_expected() {
        let txs = history();
        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10))
            .with_salary_day(25);
        assert_eq!(f.predict_end_of_month(10).expected_income_remaining, 50000.0);
    }

    #[test]
    fn test_day_zero_does_not_divide_by_zero() {
        let txs = history();
        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10));
        let eom = f.predict_end_of_month(0);
        assert_eq!(eom.average_daily_spending, 0.0);
        assert!(eom.predicted_end_balance.is_finite());
    }

    #[test]
    fn test_timeline_ends_at_predicted_balance() {
        let txs = history();
        let bills = vec![fixed(4000.0, 20), fixed(1000.0, 31)];
        let f = HistoricalForecaster::new(50000.0, &bills, &txs, date(2024, 6, 10))
            .with_salary_day(28)
            .with_emergency_buffer(10000.0);

        let timeline = f.generate_daily_timeline();
        assert_eq!(timeline.len(), 20);
        assert_eq!(timeline[0].date, date(2024, 6, 11));
        assert_eq!(timeline[0].day, 0);
        // The 31st bill lands on June 30th
        assert_eq!(timeline.last().unwrap().fixed_outflow, 1000.0);
        assert_eq!(timeline[17].inflow, 50000.0);

        let predicted = f.predict_end_of_month(10).predicted_end_balance;
        assert!((timeline.last().unwrap().balance - predicted).abs() < 1e-6);
        assert!((f.end_balance() - predicted).abs() < 1e-6);
    }

    #[test]
    fn test_burn_rate_bands() {
        let txs = history();
        let f = HistoricalForecaster::new(10000.0, &[], &txs, date(2024, 6, 10));
        let burn = f.calculate_burn_rate();
        assert_eq!(burn.daily_burn_rate, 300.0);
        assert_eq!(burn.projected_monthly_burn, 9000.0);
        assert!((burn.burn_ratio - 0.9).abs() < 1e-12);
        assert_eq!(burn.status, BurnStatus::High);

        let f = HistoricalForecaster::new(12000.0, &[], &txs, date(2024, 6, 10));
        assert_eq!(f.calculate_burn_rate().status, BurnStatus::Moderate);

        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10));
        assert_eq!(f.calculate_burn_rate().status, BurnStatus::Low);
    }

    #[test]
    fn test_budgeted_burn_rate() {
        let f = HistoricalForecaster::new(75000.0, &[], &[], date(2024, 6, 10));
        let burn = f.budgeted_burn_rate(76000.0);
        assert_eq!(burn.projected_monthly_burn, 76000.0);
        assert!((burn.daily_burn_rate - 76000.0 / 30.0).abs() < 1e-9);
        assert_eq!(burn.status, BurnStatus::High);

        assert_eq!(f.budgeted_burn_rate(18000.0).status, BurnStatus::Low);
        assert_eq!(f.budgeted_burn_rate(f64::NAN).projected_monthly_burn, 0.0);
    }

    #[test]
    fn test_burn_rate_zero_income() {
        let txs = history();
        let f = HistoricalForecaster::new(0.0, &[], &txs, date(2024, 6, 10));
        let burn = f.calculate_burn_rate();
        assert_eq!(burn.burn_ratio, 0.0);
        assert_eq!(burn.status, BurnStatus::Low);
    }

    #[test]
    fn test_predict_next_months_compounds() {
        let txs = history();
        let bills = vec![fixed(15000.0, 5)];
        let f = HistoricalForecaster::new(50000.0, &bills, &txs, date(2024, 6, 10));

        // Average of April (9k) and May (11k)
        assert_eq!(f.average_monthly_variable(), 10000.0);

        let months = f.predict_next_months(3);
        assert_eq!(months.len(), 3);
        assert_eq!(months[0].month, "2024-07");
        assert_eq!(months[2].month, "2024-09");
        for m in &months {
            assert_eq!(m.ending_balance - m.starting_balance, 50000.0 - 15000.0 - 10000.0);
        }
        assert_eq!(months[1].starting_balance, months[0].ending_balance);
        assert!(f.predict_next_months(0).is_empty());
        assert_eq!(f.with_max_months(2).predict_next_months(12).len(), 2);
    }

    #[test]
    fn test_average_variable_falls_back_to_burn() {
        let txs = vec![tx(date(2024, 6, 5), 600.0, TransactionKind::Expense, "food")];
        let f = HistoricalForecaster::new(50000.0, &[], &txs, date(2024, 6, 10));
        assert_eq!(f.average_monthly_variable(), 60.0 * 30.0);
    }

    #[test]
    fn test_empty_history() {
        let f = HistoricalForecaster::new(0.0, &[], &[], date(2024, 6, 30));
        assert_eq!(f.current_balance(), 0.0);
        assert!(f.current_balance().is_sign_positive());
        let burn = f.calculate_burn_rate();
        assert!(burn.daily_burn_rate.is_sign_positive());
        assert_eq!(
            serde_json::to_value(&burn).unwrap()["dailyBurnRate"].to_string(),
            "0.0"
        );
        assert!(f.generate_daily_timeline().is_empty());
        assert_eq!(f.end_balance(), 0.0);
    }
}
