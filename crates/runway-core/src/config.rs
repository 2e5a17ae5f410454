//! Engine configuration
//!
//! Thresholds used by the projectors, the risk scorer and the rule engines.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/runway/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Projection settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionConfig {
    pub default_horizon_days: i64,
    pub max_horizon_days: i64,
    /// Monthly variable budgets are divided by this, not by days-in-month
    pub variable_divisor: f64,
    pub default_salary_day: u32,
    pub max_forecast_months: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: 30,
            max_horizon_days: 366,
            variable_divisor: 30.0,
            default_salary_day: 1,
            max_forecast_months: 60,
        }
    }
}

/// Stress band thresholds for the risk score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfig {
    pub low_stress_min: f64,
    pub moderate_stress_min: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_stress_min: 70.0,
            moderate_stress_min: 40.0,
        }
    }
}

/// Thresholds used by the recommendation rules
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConfig {
    /// Floor for the end-of-month balance check when no emergency buffer is set
    pub minimum_balance: f64,
    pub burn_rate_high: f64,
    pub burn_rate_moderate: f64,
    pub burn_rate_target: f64,
    /// Lower-cased category name -> maximum share of monthly income
    pub category_budgets: BTreeMap<String, f64>,
    pub fixed_expense_ratio: f64,
    pub max_subscriptions: usize,
    pub subscription_category: String,
    pub lifestyle_share: f64,
    pub lifestyle_categories: Vec<String>,
    pub small_purchase_threshold: f64,
    pub small_purchase_min_count: usize,
    pub small_purchase_income_share: f64,
    pub savings_rate_target: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        let category_budgets = [
            ("food", 0.20),
            ("shopping", 0.15),
            ("entertainment", 0.10),
            ("travel", 0.10),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            minimum_balance: 0.0,
            burn_rate_high: 0.9,
            burn_rate_moderate: 0.7,
            burn_rate_target: 0.8,
            category_budgets,
            fixed_expense_ratio: 0.5,
            max_subscriptions: 5,
            subscription_category: "subscription".to_string(),
            lifestyle_share: 0.3,
            lifestyle_categories: ["food", "shopping", "entertainment", "travel"]
                .into_iter()
                .map(String::from)
                .collect(),
            small_purchase_threshold: 500.0,
            small_purchase_min_count: 5,
            small_purchase_income_share: 0.1,
            savings_rate_target: 0.2,
        }
    }
}

impl RuleConfig {
    /// Budget share for a category (case-insensitive)
    pub fn category_budget(&self, category: &str) -> Option<f64> {
        self.category_budgets
            .get(&category.trim().to_lowercase())
            .copied()
    }

    pub fn is_lifestyle(&self, category: &str) -> bool {
        let category = category.trim();
        self.lifestyle_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn is_subscription(&self, category: &str) -> bool {
        category.trim().eq_ignore_ascii_case(&self.subscription_category)
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EngineConfig {
    pub projection: ProjectionConfig,
    pub risk: RiskConfig,
    pub rules: RuleConfig,
}

impl EngineConfig {
    /// Load from an explicit path, the data-dir override, or embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) if path.exists() => fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
            Some(path) => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    tracing::debug!(path = %path.display(), "Using engine config override");
                    fs::read_to_string(&path).map_err(|e| {
                        Error::Config(format!("Failed to read {}: {}", path.display(), e))
                    })?
                }
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// The embedded defaults, ignoring any override on disk
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("runway").join("config").join("engine.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    projection: Option<RawProjection>,
    risk: Option<RawRisk>,
    rules: Option<RawRules>,
}

#[derive(Debug, Deserialize)]
struct RawProjection {
    default_horizon_days: Option<i64>,
    max_horizon_days: Option<i64>,
    variable_divisor: Option<f64>,
    default_salary_day: Option<u32>,
    max_forecast_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    low_stress_min: Option<f64>,
    moderate_stress_min: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    minimum_balance: Option<f64>,
    burn_rate_high: Option<f64>,
    burn_rate_moderate: Option<f64>,
    burn_rate_target: Option<f64>,
    category_budgets: Option<BTreeMap<String, f64>>,
    fixed_expense_ratio: Option<f64>,
    max_subscriptions: Option<usize>,
    subscription_category: Option<String>,
    lifestyle_share: Option<f64>,
    lifestyle_categories: Option<Vec<String>>,
    small_purchase_threshold: Option<f64>,
    small_purchase_min_count: Option<usize>,
    small_purchase_income_share: Option<f64>,
    savings_rate_target: Option<f64>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(p) = raw.projection {
        let c = &mut config.projection;
        if let Some(v) = p.default_horizon_days {
            c.default_horizon_days = v;
        }
        if let Some(v) = p.max_horizon_days {
            c.max_horizon_days = v;
        }
        if let Some(v) = p.variable_divisor {
            c.variable_divisor = v;
        }
        if let Some(v) = p.default_salary_day {
            c.default_salary_day = v;
        }
        if let Some(v) = p.max_forecast_months {
            c.max_forecast_months = v;
        }
    }

    if let Some(r) = raw.risk {
        if let Some(v) = r.low_stress_min {
            config.risk.low_stress_min = v;
        }
        if let Some(v) = r.moderate_stress_min {
            config.risk.moderate_stress_min = v;
        }
    }

    if let Some(r) = raw.rules {
        let c = &mut config.rules;
        if let Some(v) = r.minimum_balance {
            c.minimum_balance = v;
        }
        if let Some(v) = r.burn_rate_high {
            c.burn_rate_high = v;
        }
        if let Some(v) = r.burn_rate_moderate {
            c.burn_rate_moderate = v;
        }
        if let Some(v) = r.burn_rate_target {
            c.burn_rate_target = v;
        }
        if let Some(budgets) = r.category_budgets {
            c.category_budgets = budgets
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect();
        }
        if let Some(v) = r.fixed_expense_ratio {
            c.fixed_expense_ratio = v;
        }
        if let Some(v) = r.max_subscriptions {
            c.max_subscriptions = v;
        }
        if let Some(v) = r.subscription_category {
            c.subscription_category = v;
        }
        if let Some(v) = r.lifestyle_share {
            c.lifestyle_share = v;
        }
        if let Some(v) = r.lifestyle_categories {
            c.lifestyle_categories = v;
        }
        if let Some(v) = r.small_purchase_threshold {
            c.small_purchase_threshold = v;
        }
        if let Some(v) = r.small_purchase_min_count {
            c.small_purchase_min_count = v;
        }
        if let Some(v) = r.small_purchase_income_share {
            c.small_purchase_income_share = v;
        }
        if let Some(v) = r.savings_rate_target {
            c.savings_rate_target = v;
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &EngineConfig) -> Result<()> {
    if config.projection.variable_divisor <= 0.0 {
        return Err(Error::Config(
            "projection.variable_divisor must be positive".into(),
        ));
    }
    if config.projection.max_horizon_days <= 0 {
        return Err(Error::Config(
            "projection.max_horizon_days must be positive".into(),
        ));
    }
    if config.risk.moderate_stress_min > config.risk.low_stress_min {
        return Err(Error::Config(
            "risk.moderate_stress_min must not exceed risk.low_stress_min".into(),
        ));
    }
    if config.rules.burn_rate_moderate > config.rules.burn_rate_high {
        return Err(Error::Config(
            "rules.burn_rate_moderate must not exceed rules.burn_rate_high".into(),
        ));
    }
    Ok(())
}
