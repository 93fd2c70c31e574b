// 💵 Cash-Flow Calculator - savings rate, cost structure, lifestyle creep
//
// Everything here is derived from the trailing transaction window. Totals are
// summed in cents first, so the order of the ledger never changes a result.

use super::{round2, GradedMetric, SectionHealth};
use crate::config::Thresholds;
use crate::metric::{CalcError, HealthStatus, Metric};
use crate::snapshot::ClientSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreepFlag {
    Creep,
    Stable,
    NotApplicable,
}

/// Savings rate (percent) a household should reach given its horizon
pub fn savings_target_percent(years_to_retirement: i32) -> f64 {
    if years_to_retirement < 15 {
        25.0
    } else if years_to_retirement < 25 {
        20.0
    } else {
        15.0
    }
}

/// Contributions as a percentage of income over the same window
pub fn savings_rate(contributions: f64, window_income: f64) -> Metric {
    Metric::ratio("savings_rate", contributions, window_income).map(|r| r * 100.0)
}

/// Relative change of the short average over the long one
pub fn lifestyle_creep(short_average: f64, long_average: f64) -> Metric {
    Metric::ratio("lifestyle_creep", short_average - long_average, long_average)
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub months_covered: u32,
    pub monthly_income: f64,
    pub window_income: f64,
    pub total_contributions: f64,
    pub total_fixed_costs: f64,
    pub total_discretionary: f64,

    /// Percent of income
    pub savings_rate: GradedMetric,
    pub savings_rate_target: f64,

    /// Fractions of income
    pub fixed_cost_ratio: GradedMetric,
    pub discretionary_ratio: GradedMetric,

    /// (short average − long average) / long average
    pub lifestyle_creep: GradedMetric,
    pub creep_flag: CreepFlag,

    pub guilt_free_monthly: GradedMetric,

    #[serde(flatten)]
    pub health: SectionHealth,
    pub recommendations: Vec<String>,
    pub issues: Vec<CalcError>,
}

impl CashFlowSummary {
    pub fn summary(&self) -> String {
        format!(
            "Cash flow: savings rate {}% (target {}%), fixed {}, discretionary {}, creep {:?} over {} months",
            self.savings_rate.metric,
            self.savings_rate_target,
            self.fixed_cost_ratio.metric,
            self.discretionary_ratio.metric,
            self.creep_flag,
            self.months_covered
        )
    }

    pub fn meets_savings_target(&self) -> bool {
        self.savings_rate
            .value()
            .map_or(false, |rate| rate >= self.savings_rate_target)
    }
}

// ============================================================================
// CASH-FLOW CALCULATOR
// ============================================================================

pub struct CashFlowCalculator {
    thresholds: Thresholds,
}

impl CashFlowCalculator {
    pub fn new(thresholds: &Thresholds) -> Self {
        CashFlowCalculator {
            thresholds: thresholds.clone(),
        }
    }

    pub fn compute(&self, snapshot: &ClientSnapshot) -> CashFlowSummary {
        let t = &self.thresholds;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let totals = snapshot.window_totals(t.trailing_months);
        let monthly_income = snapshot.monthly_income();
        let window_income = monthly_income * totals.months_covered as f64;
        let years_to_retirement = snapshot.client.years_to_retirement(snapshot.as_of);

        if totals.months_covered == 0 {
            issues.push(CalcError::invalid_input(
                "transactions",
                format!("no transactions in the trailing {} months", t.trailing_months),
            ));
        }

        // Savings rate
        let target = savings_target_percent(years_to_retirement);
        let rate = GradedMetric::grade(
            savings_rate(totals.contributions, window_income),
            target,
            |r| {
                if r >= target + 5.0 {
                    HealthStatus::Excellent
                } else if r >= target {
                    HealthStatus::Good
                } else if r >= target - 5.0 {
                    HealthStatus::Fair
                } else if r > 0.0 {
                    HealthStatus::Poor
                } else {
                    HealthStatus::Critical
                }
            },
        );
        if rate.value().map_or(false, |r| r < target) {
            recommendations.push(format!(
                "Increase savings toward {}% of income",
                target
            ));
        }

        // Cost structure
        let fixed = Metric::ratio("fixed_cost_ratio", totals.fixed_costs, window_income);
        let fixed_pct = fixed.value().map(|v| v * 100.0);
        let fixed = GradedMetric::grade(fixed, 0.50, |v| {
            let pct = v * 100.0;
            if pct <= 40.0 {
                HealthStatus::Excellent
            } else if pct <= 50.0 {
                HealthStatus::Good
            } else if pct <= 60.0 {
                HealthStatus::Fair
            } else if pct <= 75.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if fixed_pct.map_or(false, |pct| pct > 50.0) {
            recommendations.push("Fixed costs exceed half of income; review housing and loans".to_string());
        }

        // Room left for discretionary spend after fixed costs and a 20% savings target
        let available = fixed_pct.map(|pct| 100.0 - pct - 20.0).unwrap_or(0.0);
        let discretionary = GradedMetric::grade(
            Metric::ratio("discretionary_ratio", totals.discretionary, window_income),
            available / 100.0,
            |v| {
                let pct = v * 100.0;
                if pct <= available * 0.7 {
                    HealthStatus::Excellent
                } else if pct <= available {
                    HealthStatus::Good
                } else if pct <= available * 1.2 {
                    HealthStatus::Fair
                } else if pct <= available * 1.5 {
                    HealthStatus::Poor
                } else {
                    HealthStatus::Critical
                }
            },
        );

        // Lifestyle creep needs the whole long window
        let creep = if totals.months_covered < t.trailing_months {
            Metric::not_applicable(CalcError::invalid_input(
                "transactions",
                format!(
                    "lifestyle creep needs {} months of history, found {}",
                    t.trailing_months, totals.months_covered
                ),
            ))
        } else {
            let short = snapshot.window_totals(t.creep_short_months);
            lifestyle_creep(
                short.discretionary / t.creep_short_months as f64,
                totals.discretionary / t.trailing_months as f64,
            )
        };
        let creep_flag = match creep.value() {
            None => CreepFlag::NotApplicable,
            Some(change) if change > t.creep_threshold => CreepFlag::Creep,
            Some(_) => CreepFlag::Stable,
        };
        let creep = GradedMetric::grade(creep, 0.0, |change| {
            if change <= 0.0 {
                HealthStatus::Excellent
            } else if change <= 0.02 {
                HealthStatus::Good
            } else if change <= 0.05 {
                HealthStatus::Fair
            } else if change <= 0.10 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if creep_flag == CreepFlag::Creep {
            recommendations.push(format!(
                "Discretionary spending over the last {} months is {:.0}% above the {}-month average",
                t.creep_short_months,
                creep.value().unwrap_or(0.0) * 100.0,
                t.trailing_months
            ));
        }

        // Guilt-free spending
        let guilt_free = match totals.monthly(totals.fixed_costs) {
            _ if monthly_income <= 0.0 => Metric::not_applicable(CalcError::invalid_input(
                "income",
                "no active income",
            )),
            None => Metric::not_applicable(CalcError::invalid_input(
                "transactions",
                "no fixed-cost history in the trailing window",
            )),
            Some(monthly_fixed) => {
                let save_share = if years_to_retirement < 15 { 0.25 } else { 0.20 };
                Metric::computed(monthly_income - monthly_fixed - monthly_income * save_share)
            }
        };
        let guilt_free = GradedMetric::grade(guilt_free, monthly_income * 0.15, |amount| {
            if amount >= monthly_income * 0.2 {
                HealthStatus::Excellent
            } else if amount >= monthly_income * 0.1 {
                HealthStatus::Good
            } else if amount > 0.0 {
                HealthStatus::Fair
            } else {
                HealthStatus::Poor
            }
        });
        if guilt_free.value().map_or(false, |amount| amount <= 0.0) {
            recommendations.push("Current budget leaves no room for guilt-free spending".to_string());
        }

        let health = SectionHealth::from_metrics(&[&rate, &fixed, &discretionary, &creep, &guilt_free]);

        tracing::debug!(
            client_id = %snapshot.client.id,
            months_covered = totals.months_covered,
            savings_rate = %rate.metric,
            creep = ?creep_flag,
            "cash flow computed"
        );

        CashFlowSummary {
            months_covered: totals.months_covered,
            monthly_income: round2(monthly_income),
            window_income: round2(window_income),
            total_contributions: totals.contributions,
            total_fixed_costs: totals.fixed_costs,
            total_discretionary: totals.discretionary,
            savings_rate: rate,
            savings_rate_target: target,
            fixed_cost_ratio: fixed,
            discretionary_ratio: discretionary,
            lifestyle_creep: creep,
            creep_flag,
            guilt_free_monthly: guilt_free,
            health,
            recommendations,
            issues,
        }
    }
}
