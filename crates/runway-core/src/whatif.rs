//! What-if simulation
//!
//! Re-runs the schedule projector with a hypothetical spend injected and
//! diffs the result against the baseline trajectory: end balance, risk score,
//! stress band and, when goals are present, the delay to the primary goal.

use serde::{Deserialize, Serialize};

use crate::config::{ProjectionConfig, RiskConfig};
use crate::models::{amount_or_zero, HypotheticalSpend, ProjectionDay, RiskLevel, SavingsGoal};
use crate::projection::{Projector, ScheduleConfig, ScheduleProjector};
use crate::recommendations::format_amount;
use crate::risk::{
    calculate_risk_score, calculate_stress_level, RiskInputs, RiskScoreResult, StressLevel,
};

/// A hypothetical spend to test
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhatIfScenario {
    pub amount: f64,
    /// Offset in days from the projection start
    pub day: i64,
    pub duration: Option<u32>,
    pub category: String,
}

impl WhatIfScenario {
    /// Amount actually simulated (negative and non-finite become 0)
    pub fn effective_amount(&self) -> f64 {
        amount_or_zero(self.amount).max(0.0)
    }

    fn to_spend(&self) -> HypotheticalSpend {
        HypotheticalSpend {
            amount: self.effective_amount(),
            day: self.day,
            duration: self.duration,
        }
    }
}

/// Effect of a spend on one savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalImpact {
    pub goal_id: String,
    pub goal_name: String,
    pub amount: f64,
    pub monthly_contribution: f64,
    /// Months added to the goal (negative = reached sooner); 0 when stalled
    pub delay_months: f64,
    pub months_to_goal_before: Option<f64>,
    pub months_to_goal_after: Option<f64>,
    /// Current balance covers the spend
    pub affordable: bool,
    /// No monthly contribution, so the goal never completes
    pub stalled: bool,
}

/// Estimate how a spend moves a goal's completion
pub fn calculate_goal_impact(
    goal: &SavingsGoal,
    amount: f64,
    current_balance: f64,
) -> GoalImpact {
    let amount = amount_or_zero(amount);
    let contribution = amount_or_zero(goal.monthly_contribution);
    let remaining = goal.remaining();
    let affordable = amount_or_zero(current_balance) >= amount;

    if contribution <= 0.0 {
        return GoalImpact {
            goal_id: goal.id.clone(),
            goal_name: goal.name.clone(),
            amount,
            monthly_contribution: 0.0,
            delay_months: 0.0,
            months_to_goal_before: None,
            months_to_goal_after: None,
            affordable,
            stalled: true,
        };
    }

    GoalImpact {
        goal_id: goal.id.clone(),
        goal_name: goal.name.clone(),
        amount,
        monthly_contribution: contribution,
        delay_months: amount / contribution,
        months_to_goal_before: Some(remaining / contribution),
        months_to_goal_after: Some((remaining + amount).max(0.0) / contribution),
        affordable,
        stalled: false,
    }
}

/// Highest-priority goal, first one wins ties
pub fn primary_goal(goals: &[SavingsGoal]) -> Option<&SavingsGoal> {
    let mut best: Option<&SavingsGoal> = None;
    for goal in goals {
        match best {
            Some(b) if b.priority.rank() >= goal.priority.rank() => {}
            _ => best = Some(goal),
        }
    }
    best
}

/// Baseline versus what-if comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfReport {
    pub scenario: WhatIfScenario,
    pub baseline_end_balance: f64,
    pub what_if_end_balance: f64,
    /// what-if minus baseline (never positive)
    pub balance_change: f64,
    pub baseline_risk: RiskScoreResult,
    pub what_if_risk: RiskScoreResult,
    /// Score delta, what-if minus baseline
    pub risk_level_change: f64,
    pub baseline_stress: StressLevel,
    pub what_if_stress: StressLevel,
    /// 1 when the stress band differs, else 0
    pub stress_change: u8,
    /// First day index of the what-if trajectory in danger
    pub first_danger_day: Option<u32>,
    pub risk_zone_days: usize,
    pub goal_impact: Option<GoalImpact>,
    pub explanation: String,
}

/// Runs scenarios against a fixed baseline
#[derive(Debug, Clone)]
pub struct WhatIfSimulator<'a> {
    base: ScheduleConfig,
    settings: &'a ProjectionConfig,
    risk_config: &'a RiskConfig,
    risk_inputs: RiskInputs,
    goals: &'a [SavingsGoal],
}

impl<'a> WhatIfSimulator<'a> {
    pub fn new(
        base: ScheduleConfig,
        settings: &'a ProjectionConfig,
        risk_config: &'a RiskConfig,
    ) -> Self {
        let risk_inputs = RiskInputs {
            current_balance: base.start_balance,
            emergency_buffer: base.emergency_buffer,
            ..Default::default()
        };
        Self {
            base: ScheduleConfig {
                hypothetical_spend: None,
                ..base
            },
            settings,
            risk_config,
            risk_inputs,
            goals: &[],
        }
    }

    /// Income, expense and history figures for the risk re-derivation
    ///
    /// The balance is replaced by each trajectory's end balance.
    pub fn with_risk_inputs(mut self, inputs: RiskInputs) -> Self {
        self.risk_inputs = inputs;
        self
    }

    pub fn with_goals(mut self, goals: &'a [SavingsGoal]) -> Self {
        self.goals = goals;
        self
    }

    fn run(&self, config: ScheduleConfig) -> (Vec<ProjectionDay>, f64) {
        let projector = ScheduleProjector::with_settings(config, self.settings);
        let timeline = projector.timeline();
        let end = timeline
            .last()
            .map(|d| d.balance)
            .unwrap_or_else(|| projector.start_balance());
        (timeline, end)
    }

    fn risk_at(&self, balance: f64) -> RiskScoreResult {
        calculate_risk_score(&RiskInputs {
            current_balance: balance,
            ..self.risk_inputs.clone()
        })
    }

    pub fn simulate(&self, scenario: &WhatIfScenario) -> WhatIfReport {
        let (_, baseline_end_balance) = self.run(self.base.clone());
        let (timeline, what_if_end_balance) =
            self.run(self.base.with_hypothetical(scenario.to_spend()));

        let baseline_risk = self.risk_at(baseline_end_balance);
        let what_if_risk = self.risk_at(what_if_end_balance);
        let baseline_stress = calculate_stress_level(baseline_risk.score, self.risk_config);
        let what_if_stress = calculate_stress_level(what_if_risk.score, self.risk_config);
        let stress_change = u8::from(baseline_stress.level != what_if_stress.level);

        let first_danger_day = timeline
            .iter()
            .find(|d| d.risk_level == RiskLevel::Danger)
            .map(|d| d.day);
        let risk_zone_days = timeline.iter().filter(|d| d.is_risk_zone).count();

        let goal_impact = primary_goal(self.goals).map(|goal| {
            calculate_goal_impact(goal, scenario.effective_amount(), self.base.start_balance)
        });

        let mut report = WhatIfReport {
            scenario: scenario.clone(),
            baseline_end_balance,
            what_if_end_balance,
            balance_change: what_if_end_balance - baseline_end_balance,
            risk_level_change: what_if_risk.score - baseline_risk.score,
            baseline_risk,
            what_if_risk,
            baseline_stress,
            what_if_stress,
            stress_change,
            first_danger_day,
            risk_zone_days,
            goal_impact,
            explanation: String::new(),
        };
        report.explanation = explain_impact(&report);

        tracing::debug!(
            amount = scenario.effective_amount(),
            balance_change = report.balance_change,
            risk_change = report.risk_level_change,
            "What-if simulated"
        );
        report
    }
}

/// Plain-language summary of a what-if report
///
/// Deterministic: the same report always gives the same text.
pub fn explain_impact(report: &WhatIfReport) -> String {
    let mut parts = Vec::new();
    let amount = report.scenario.effective_amount();

    if report.balance_change == 0.0 {
        parts.push(format!(
            "This spend does not change your projected end balance of {}.",
            format_amount(report.baseline_end_balance)
        ));
    } else {
        let scale = if report.baseline_end_balance.abs() > 0.0 {
            report.balance_change.abs() / report.baseline_end_balance.abs()
        } else {
            1.0
        };
        let severity = if scale >= 0.25 {
            "a major hit"
        } else if scale >= 0.05 {
            "a noticeable dent"
        } else {
            "a small dent"
        };
        parts.push(format!(
            "Spending {} lowers your projected end balance from {} to {}, {}.",
            format_amount(amount),
            format_amount(report.baseline_end_balance),
            format_amount(report.what_if_end_balance),
            severity
        ));
    }

    let delta = report.risk_level_change;
    if delta < 0.0 {
        parts.push(format!(
            "Your risk score drops by {:.1} points ({:.0} to {:.0}).",
            -delta, report.baseline_risk.score, report.what_if_risk.score
        ));
    } else if delta > 0.0 {
        parts.push(format!(
            "Your risk score rises by {:.1} points ({:.0} to {:.0}).",
            delta, report.baseline_risk.score, report.what_if_risk.score
        ));
    } else {
        parts.push(format!(
            "Your risk score stays at {:.0}.",
            report.what_if_risk.score
        ));
    }

    if report.stress_change == 1 {
        parts.push(format!(
            "Financial stress moves from {} to {}.",
            report.baseline_stress.level, report.what_if_stress.level
        ));
    }

    if let Some(day) = report.first_danger_day {
        parts.push(format!(
            "Your balance would go negative on day {} of the projection.",
            day + 1
        ));
    } else if report.risk_zone_days > 0 {
        parts.push(format!(
            "Your balance would sit below the emergency buffer for {} day(s).",
            report.risk_zone_days
        ));
    }

    if let Some(goal) = &report.goal_impact {
        if goal.stalled {
            parts.push(format!(
                "{} has no monthly contribution, so its timeline can't be estimated.",
                goal.goal_name
            ));
        } else if goal.delay_months > 0.0 {
            parts.push(format!(
                "This delays {} by {:.1} month(s).",
                goal.goal_name, goal.delay_months
            ));
        }
        if !goal.affordable {
            parts.push("Your current balance does not cover this spend.".to_string());
        }
    }

    parts.join(" ")
}

/// Holds the latest what-if report, if any
#[derive(Debug, Clone, Default)]
pub struct WhatIfState {
    report: Option<WhatIfReport>,
}

impl WhatIfState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report, replacing any previous one
    pub fn set(&mut self, report: WhatIfReport) -> &WhatIfReport {
        self.report.insert(report)
    }

    pub fn report(&self) -> Option<&WhatIfReport> {
        self.report.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.report.is_some()
    }

    pub fn clear(&mut self) {
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixedExpenseItem, GoalPriority, IncomeItem, VariableExpenseItem};
    use chrono::NaiveDate;

    fn base() -> ScheduleConfig {
        ScheduleConfig {
            start_balance: 52500.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days: 30,
            income: vec![IncomeItem {
                name: "Salary".into(),
                amount: 75000.0,
                day_of_month: 1,
                ..Default::default()
            }],
            fixed_expenses: vec![FixedExpenseItem {
                name: "Rent".into(),
                amount: 27000.0,
                day_of_month: 5,
                ..Default::default()
            }],
            variable_expenses: vec![VariableExpenseItem {
                name: "Groceries".into(),
                amount: 18000.0,
                ..Default::default()
            }],
            emergency_buffer: 30000.0,
            hypothetical_spend: None,
        }
    }

    fn risk_inputs() -> RiskInputs {
        RiskInputs {
            monthly_income: 75000.0,
            monthly_expenses: 45000.0,
            emergency_buffer: 30000.0,
            ..Default::default()
        }
    }

    fn scenario(amount: f64, day: i64) -> WhatIfScenario {
        WhatIfScenario {
            amount,
            day,
            category: "shopping".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_balance_change_equals_amount() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk).with_risk_inputs(risk_inputs());

        let report = sim.simulate(&scenario(20000.0, 3));
        assert!((report.baseline_end_balance - 82500.0).abs() < 1e-6);
        assert!((report.what_if_end_balance - 62500.0).abs() < 1e-6);
        assert!((report.balance_change + 20000.0).abs() < 1e-6);
        assert!(report.risk_level_change <= 0.0);
    }

    #[test]
    fn test_sign_law() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk);
        for (amount, day) in [(0.01, 0), (500.0, 29), (1e9, 10), (3000.0, 45), (7.5, -2)] {
            let report = sim.simulate(&scenario(amount, day));
            assert!(report.balance_change <= 0.0, "amount {} day {}", amount, day);
        }
    }

    #[test]
    fn test_negative_and_nan_amounts_are_zero() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk);
        for amount in [-5000.0, f64::NAN, f64::INFINITY] {
            let report = sim.simulate(&scenario(amount, 2));
            assert_eq!(report.balance_change, 0.0);
            assert_eq!(report.stress_change, 0);
        }
    }

    #[test]
    fn test_spend_beyond_horizon_has_no_effect() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk);
        let report = sim.simulate(&scenario(10000.0, 30));
        assert_eq!(report.balance_change, 0.0);
        assert!(report.explanation.starts_with("This spend does not change"));
    }

    #[test]
    fn test_large_spend_hits_danger_and_stress() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk).with_risk_inputs(risk_inputs());

        let report = sim.simulate(&scenario(150000.0, 2));
        assert_eq!(report.first_danger_day, Some(2));
        assert!(report.risk_zone_days >= 28);
        // 82500 end balance scores low stress, a negative one does not
        assert_eq!(report.stress_change, 1);
        assert!(report.explanation.contains("a major hit"));
        assert!(report.explanation.contains("day 3"));
        assert!(report.explanation.contains("Financial stress moves from low to"));
    }

    #[test]
    fn test_duration_spreads_spend() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk);
        let report = sim.simulate(&WhatIfScenario {
            amount: 9000.0,
            day: 10,
            duration: Some(3),
            category: "travel".into(),
        });
        assert!((report.balance_change + 9000.0).abs() < 1e-6);
    }

    #[test]
    fn test_goal_impact_delay() {
        let goal = SavingsGoal {
            id: "car".into(),
            name: "Car".into(),
            target_amount: 100000.0,
            current_amount: 40000.0,
            monthly_contribution: 10000.0,
            ..Default::default()
        };
        let impact = calculate_goal_impact(&goal, 25000.0, 50000.0);
        assert_eq!(impact.delay_months, 2.5);
        assert_eq!(impact.months_to_goal_before, Some(6.0));
        assert_eq!(impact.months_to_goal_after, Some(8.5));
        assert!(impact.affordable);
        assert!(!impact.stalled);

        // A windfall accelerates
        let windfall = calculate_goal_impact(&goal, -10000.0, 50000.0);
        assert_eq!(windfall.delay_months, -1.0);
        assert_eq!(windfall.months_to_goal_after, Some(5.0));
    }

    #[test]
    fn test_goal_impact_stalled_and_unaffordable() {
        let goal = SavingsGoal {
            name: "Someday".into(),
            target_amount: 5000.0,
            ..Default::default()
        };
        let impact = calculate_goal_impact(&goal, 8000.0, 1000.0);
        assert!(impact.stalled);
        assert!(!impact.affordable);
        assert_eq!(impact.delay_months, 0.0);
        assert_eq!(impact.months_to_goal_before, None);
    }

    #[test]
    fn test_primary_goal_first_on_ties() {
        let goals = vec![
            SavingsGoal {
                id: "a".into(),
                priority: GoalPriority::Medium,
                ..Default::default()
            },
            SavingsGoal {
                id: "b".into(),
                priority: GoalPriority::High,
                ..Default::default()
            },
            SavingsGoal {
                id: "c".into(),
                priority: GoalPriority::High,
                ..Default::default()
            },
        ];
        assert_eq!(primary_goal(&goals).map(|g| g.id.as_str()), Some("b"));
        assert!(primary_goal(&[]).is_none());
    }

    #[test]
    fn test_report_includes_primary_goal_impact() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let goals = vec![SavingsGoal {
            name: "Emergency fund".into(),
            target_amount: 100000.0,
            monthly_contribution: 5000.0,
            priority: GoalPriority::High,
            ..Default::default()
        }];
        let sim = WhatIfSimulator::new(base(), &settings, &risk).with_goals(&goals);
        let report = sim.simulate(&scenario(10000.0, 4));
        let impact = report.goal_impact.as_ref().unwrap();
        assert_eq!(impact.delay_months, 2.0);
        assert!(report.explanation.contains("delays Emergency fund by 2.0 month(s)"));
    }

    #[test]
    fn test_explanation_is_deterministic() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk).with_risk_inputs(risk_inputs());
        let a = sim.simulate(&scenario(40000.0, 6));
        let b = sim.simulate(&scenario(40000.0, 6));
        assert_eq!(a.explanation, b.explanation);
        assert_eq!(explain_impact(&a), a.explanation);
    }

    #[test]
    fn test_what_if_state_clear() {
        let settings = ProjectionConfig::default();
        let risk = RiskConfig::default();
        let sim = WhatIfSimulator::new(base(), &settings, &risk);

        let mut state = WhatIfState::new();
        assert!(!state.is_active());
        state.set(sim.simulate(&scenario(100.0, 1)));
        assert!(state.is_active());
        state.clear();
        assert!(state.report().is_none());
    }
}
