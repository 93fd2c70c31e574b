// 🧮 Calculators - five independent views over one client snapshot
//
// Each calculator is built from the thresholds and computes a typed summary
// from a borrowed snapshot. None of them reads another's output.

pub mod foundation;
pub mod cashflow;
pub mod portfolio;
pub mod planning;
pub mod estate;

pub use foundation::{DtiBand, EmergencyFundFlag, FoundationCalculator, FoundationSummary, InsuranceNeed};
pub use cashflow::{CashFlowCalculator, CashFlowSummary, CreepFlag};
pub use portfolio::{AllocationSlice, PortfolioCalculator, PortfolioSummary};
pub use planning::{
    GoalFunding, GoalStatus, PlanningCalculator, PlanningSummary, ScenarioResult, WhatIf, WhatIfResult,
};
pub use estate::{ChecklistItem, EstateCalculator, EstateSummary};

use crate::metric::{section_score, HealthStatus, Metric};
use serde::{Deserialize, Serialize};

// ============================================================================
// GRADED METRIC
// ============================================================================

/// A metric with the health status it earns; no status when not applicable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedMetric {
    pub metric: Metric,
    pub status: Option<HealthStatus>,
    pub benchmark: f64,
}

impl GradedMetric {
    pub fn grade(metric: Metric, benchmark: f64, grader: impl Fn(f64) -> HealthStatus) -> Self {
        let status = metric.value().map(grader);
        GradedMetric {
            metric,
            status,
            benchmark,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.metric.value()
    }
}

// ============================================================================
// SECTION HEALTH
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionHealth {
    /// Mean status score (0-100) over the graded metrics; None if nothing graded
    pub overall_score: Option<f64>,
    pub overall_status: Option<HealthStatus>,
}

impl SectionHealth {
    /// Equal weights
    pub fn from_metrics(metrics: &[&GradedMetric]) -> Self {
        let graded: Vec<(HealthStatus, f64)> = metrics
            .iter()
            .filter_map(|m| m.status.map(|s| (s, 1.0)))
            .collect();
        Self::from_weighted(&graded)
    }

    pub fn from_weighted(graded: &[(HealthStatus, f64)]) -> Self {
        let overall_score = section_score(graded);
        SectionHealth {
            overall_score,
            overall_status: overall_score.map(HealthStatus::from_score),
        }
    }
}

/// Round to cents for reporting; aggregation never goes through this
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::CalcError;

    #[test]
    fn test_not_applicable_metrics_are_not_graded() {
        let computed = GradedMetric::grade(Metric::computed(7.0), 6.0, |_| HealthStatus::Excellent);
        let skipped = GradedMetric::grade(
            Metric::not_applicable(CalcError::division_undefined("x")),
            6.0,
            |_| HealthStatus::Critical,
        );
        assert_eq!(skipped.status, None);

        let health = SectionHealth::from_metrics(&[&computed, &skipped]);
        assert_eq!(health.overall_score, Some(100.0));
        assert_eq!(health.overall_status, Some(HealthStatus::Excellent));
    }
}
