// ⚙️ Configuration - calculator thresholds and process settings
//
// Thresholds are plain data handed to each calculator; Settings adds where
// the database lives and reads overrides from ADVISOR_* variables.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_PATH: &str = "advisor.db";

// ============================================================================
// STRESS SCENARIOS
// ============================================================================

/// Alternate assumptions for a projection, expressed as shifts from the base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,

    /// Added to the assumed annual return (-0.02 = two points lower)
    pub return_shock: f64,

    /// Added to the assumed inflation
    pub inflation_shock: f64,
}

impl StressScenario {
    pub fn new(name: &str, return_shock: f64, inflation_shock: f64) -> Self {
        StressScenario {
            name: name.to_string(),
            return_shock,
            inflation_shock,
        }
    }
}

// ============================================================================
// THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    // Foundation
    /// Below this many months the emergency fund is insufficient
    pub emergency_fund_floor_months: f64,
    /// At or above this many months the emergency fund is adequate
    pub emergency_fund_target_months: f64,
    pub dti_healthy_below: f64,
    pub dti_risk_above: f64,
    /// Life cover needed = annual income × this multiple
    pub insurance_income_multiple: f64,
    pub disability_target_ratio: f64,

    // Cash flow
    pub trailing_months: u32,
    pub creep_short_months: u32,
    /// Short-window average may exceed the long one by this fraction
    pub creep_threshold: f64,

    // Portfolio
    pub concentration_threshold: f64,

    // Planning
    pub assumed_annual_return: f64,
    pub assumed_inflation: f64,
    pub withdrawal_rate: f64,
    /// Share of today's spending needed in retirement
    pub retirement_spend_ratio: f64,
    pub stress_scenarios: Vec<StressScenario>,
    /// Replaces the contribution derived from transaction history
    pub monthly_contribution_override: Option<f64>,
    /// Relative band around the required contribution counted as on track
    pub goal_tolerance: f64,

    // Estate
    pub staleness_years: u32,
    pub trust_net_worth_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            emergency_fund_floor_months: 3.0,
            emergency_fund_target_months: 6.0,
            dti_healthy_below: 0.20,
            dti_risk_above: 0.35,
            insurance_income_multiple: 10.0,
            disability_target_ratio: 0.60,

            trailing_months: 12,
            creep_short_months: 3,
            creep_threshold: 0.10,

            concentration_threshold: 0.20,

            assumed_annual_return: 0.06,
            assumed_inflation: 0.03,
            withdrawal_rate: 0.04,
            retirement_spend_ratio: 0.75,
            stress_scenarios: vec![
                StressScenario::new("return_shock", -0.02, 0.0),
                StressScenario::new("inflation_shock", 0.0, 0.01),
            ],
            monthly_contribution_override: None,
            goal_tolerance: 0.05,

            staleness_years: 3,
            trust_net_worth_threshold: 1_000_000.0,
        }
    }
}

impl Thresholds {
    /// Window lengths the cash flow and creep metrics can actually use
    pub fn validate(&self) -> Result<()> {
        if self.trailing_months == 0 {
            bail!("trailing_months must be at least 1");
        }
        if self.creep_short_months == 0 {
            bail!("creep_short_months must be at least 1");
        }
        if self.creep_short_months > self.trailing_months {
            bail!(
                "creep_short_months ({}) cannot exceed trailing_months ({})",
                self.creep_short_months,
                self.trailing_months
            );
        }
        Ok(())
    }

    pub fn with_trailing_window(mut self, trailing_months: u32, creep_short_months: u32) -> Result<Self> {
        self.trailing_months = trailing_months;
        self.creep_short_months = creep_short_months;
        self.validate()?;
        Ok(self)
    }

    pub fn with_assumed_return(mut self, annual_return: f64) -> Self {
        self.assumed_annual_return = annual_return;
        self
    }

    pub fn with_inflation(mut self, inflation: f64) -> Self {
        self.assumed_inflation = inflation;
        self
    }

    pub fn with_concentration_threshold(mut self, threshold: f64) -> Self {
        self.concentration_threshold = threshold;
        self
    }

    pub fn with_emergency_fund_target(mut self, months: f64) -> Self {
        self.emergency_fund_target_months = months;
        self
    }

    pub fn with_staleness_years(mut self, years: u32) -> Self {
        self.staleness_years = years;
        self
    }

    pub fn with_monthly_contribution(mut self, monthly: f64) -> Self {
        self.monthly_contribution_override = Some(monthly);
        self
    }

    pub fn with_stress_scenarios(mut self, scenarios: Vec<StressScenario>) -> Self {
        self.stress_scenarios = scenarios;
        self
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub thresholds: Thresholds,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("ADVISOR_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let mut thresholds = Thresholds::default();

        if let Some(v) = parse_f64(&lookup, "ADVISOR_ASSUMED_RETURN")? {
            thresholds.assumed_annual_return = v;
        }
        if let Some(v) = parse_f64(&lookup, "ADVISOR_INFLATION")? {
            thresholds.assumed_inflation = v;
        }
        if let Some(v) = parse_f64(&lookup, "ADVISOR_CONCENTRATION_THRESHOLD")? {
            thresholds.concentration_threshold = v;
        }
        if let Some(v) = parse_f64(&lookup, "ADVISOR_EMERGENCY_FUND_MONTHS")? {
            thresholds.emergency_fund_target_months = v;
        }
        if let Some(v) = parse_f64(&lookup, "ADVISOR_STRESS_RETURN_SHOCK")? {
            thresholds.stress_scenarios = vec![StressScenario::new("return_shock", v, 0.0)];
        }
        if let Some(v) = parse_f64(&lookup, "ADVISOR_MONTHLY_CONTRIBUTION")? {
            thresholds.monthly_contribution_override = Some(v);
        }
        if let Some(v) = parse_u32(&lookup, "ADVISOR_STALENESS_YEARS")? {
            thresholds.staleness_years = v;
        }
        if let Some(v) = parse_u32(&lookup, "ADVISOR_TRAILING_MONTHS")? {
            thresholds.trailing_months = v;
        }
        if let Some(v) = parse_u32(&lookup, "ADVISOR_CREEP_SHORT_MONTHS")? {
            thresholds.creep_short_months = v;
        }
        thresholds.validate().context("invalid ADVISOR_* window settings")?;

        Ok(Settings {
            database_path,
            thresholds,
        })
    }
}

fn parse_f64<F>(lookup: &F, key: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            let value: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a number: {}", key, raw))?;
            Ok(Some(value))
        }
    }
}

fn parse_u32<F>(lookup: &F, key: &str) -> Result<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            let value: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a whole number: {}", key, raw))?;
            Ok(Some(value))
        }
    }
}
