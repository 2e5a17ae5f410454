//! Engine handlers
//!
//! Each handler validates the snapshot, then runs the synchronous engine on
//! the blocking pool so long horizons do not stall the runtime.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use runway_core::snapshot::DEFAULT_FORECAST_MONTHS;
use runway_core::{
    calculate_risk_score, calculate_stress_level, select_projector, DerivedResults,
    EngineConfig, FinancialSnapshot, ForecastSummary, ProjectionDay, Recommendation,
    RecommendationVariant, RiskScoreResult, StressLevel, WhatIfReport, WhatIfScenario,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

/// Query parameters for the forecast endpoint
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Months to roll forward (default 3)
    pub months: Option<u32>,
}

/// Query parameters for the recommendations endpoint
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// budget, transactions or all (default)
    pub variant: Option<String>,
}

/// Request body for a what-if simulation
#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    pub snapshot: FinancialSnapshot,
    #[serde(default)]
    pub scenario: WhatIfScenario,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    pub projector: &'static str,
    pub start_balance: f64,
    pub end_balance: f64,
    pub days: Vec<ProjectionDay>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResponse {
    pub risk: RiskScoreResult,
    pub stress: StressLevel,
}

/// Reject snapshots the engine would have to clamp or discard
fn validate_snapshot(snapshot: &FinancialSnapshot, engine: &EngineConfig) -> Result<(), AppError> {
    if let Some(days) = snapshot.horizon_days {
        let max = engine.projection.max_horizon_days;
        if !(0..=max).contains(&days) {
            return Err(AppError::bad_request(&format!(
                "horizonDays must be between 0 and {}",
                max
            )));
        }
    }
    Ok(())
}

/// Run engine work on the blocking pool
async fn run_engine<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// POST /api/projection - Day-by-day balance trajectory
pub async fn projection(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<ProjectionResponse>, AppError> {
    validate_snapshot(&snapshot, &state.engine)?;
    let engine = state.engine.clone();

    let response = run_engine(move || {
        let projector = select_projector(&snapshot, &engine);
        let days = projector.timeline();
        let start_balance = projector.start_balance();
        ProjectionResponse {
            projector: projector.name(),
            start_balance,
            end_balance: days.last().map(|d| d.balance).unwrap_or(start_balance),
            days,
        }
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/forecast - Month-end prediction, burn rate and months ahead
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<ForecastSummary>, AppError> {
    validate_snapshot(&snapshot, &state.engine)?;
    let months = params.months.unwrap_or(DEFAULT_FORECAST_MONTHS);
    let max = state.engine.projection.max_forecast_months;
    if months > max {
        return Err(AppError::bad_request(&format!(
            "months must be at most {}",
            max
        )));
    }

    let engine = state.engine.clone();
    let summary = run_engine(move || runway_core::forecast(&snapshot, &engine, months)).await?;
    Ok(Json(summary))
}

/// POST /api/risk - Risk score and stress band
pub async fn risk(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<RiskResponse>, AppError> {
    let risk = calculate_risk_score(&snapshot.risk_inputs());
    let stress = calculate_stress_level(risk.score, &state.engine.risk);
    Ok(Json(RiskResponse { risk, stress }))
}

/// POST /api/recommendations?variant= - Prioritized recommendations
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecommendationQuery>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    validate_snapshot(&snapshot, &state.engine)?;
    let variant = match params.variant.as_deref() {
        Some(v) => v
            .parse::<RecommendationVariant>()
            .map_err(|e| AppError::bad_request(&e))?,
        None => RecommendationVariant::default(),
    };

    let engine = state.engine.clone();
    let recommendations =
        run_engine(move || runway_core::recommend(&snapshot, &engine, variant)).await?;

    tracing::debug!(
        variant = %variant,
        count = recommendations.len(),
        "Recommendations generated"
    );
    Ok(Json(recommendations))
}

/// POST /api/what-if - Compare a hypothetical spend against the baseline
pub async fn what_if(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WhatIfRequest>,
) -> Result<Json<WhatIfReport>, AppError> {
    validate_snapshot(&request.snapshot, &state.engine)?;
    let engine = state.engine.clone();

    let report = run_engine(move || {
        runway_core::what_if(&request.snapshot, &engine, &request.scenario)
    })
    .await?;
    Ok(Json(report))
}

/// POST /api/recompute - Everything derived from a snapshot
pub async fn recompute(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<DerivedResults>, AppError> {
    validate_snapshot(&snapshot, &state.engine)?;
    let engine = state.engine.clone();

    let derived = run_engine(move || runway_core::recompute(&snapshot, &engine)).await?;
    Ok(Json(derived))
}
