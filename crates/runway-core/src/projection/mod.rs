//! Balance projection
//!
//! Two strategies share the [`Projector`] capability:
//!
//! - **Schedule** ([`ScheduleProjector`]) - deterministic day-by-day simulation
//!   from declared recurring income and expenses
//! - **Historical** ([`HistoricalForecaster`]) - extrapolates the rest of the
//!   month (and following months) from observed transactions
//!
//! Callers usually go through [`select_projector`], which picks the historical
//! strategy when the snapshot carries spending for the current month.

pub mod historical;
pub mod schedule;

use chrono::{Datelike, NaiveDate};

use crate::config::EngineConfig;
use crate::models::ProjectionDay;
use crate::snapshot::FinancialSnapshot;

pub use historical::{BurnRate, BurnStatus, EndOfMonthForecast, HistoricalForecaster, MonthForecast};
pub use schedule::{project, ScheduleConfig, ScheduleProjector};

/// A strategy that turns a snapshot into a balance trajectory
pub trait Projector {
    /// Short identifier ("schedule", "historical")
    fn name(&self) -> &'static str;

    /// Balance before the first projected day
    fn start_balance(&self) -> f64;

    /// Day-by-day trajectory
    fn timeline(&self) -> Vec<ProjectionDay>;

    /// Balance at the end of the trajectory
    fn end_balance(&self) -> f64 {
        self.timeline()
            .last()
            .map(|d| d.balance)
            .unwrap_or_else(|| self.start_balance())
    }
}

/// Pick the projector that fits the data in a snapshot
pub fn select_projector<'a>(
    snapshot: &'a FinancialSnapshot,
    config: &EngineConfig,
) -> Box<dyn Projector + 'a> {
    if snapshot.has_current_month_history() {
        tracing::debug!(as_of = %snapshot.as_of, "Using historical projector");
        Box::new(snapshot.historical_forecaster(config))
    } else {
        tracing::debug!(as_of = %snapshot.as_of, "Using schedule projector");
        Box::new(ScheduleProjector::with_settings(
            snapshot.schedule_config(config),
            &config.projection,
        ))
    }
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// First day of the month `offset` months after the month containing `date`
pub(crate) fn add_months(date: NaiveDate, offset: u32) -> Option<NaiveDate> {
    let months = date.year() * 12 + date.month0() as i32 + offset as i32;
    NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)
}

/// Whole months from `from` until `to`, rounded up (0 when `to` is not after `from`)
pub(crate) fn months_until(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    let months = if to.day() > from.day() { months + 1 } else { months };
    months.max(1) as u32
}
