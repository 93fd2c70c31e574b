// 📋 Household Report - validate once, run every calculator, one document out

use crate::calculators::{
    CashFlowCalculator, CashFlowSummary, EstateCalculator, EstateSummary, FoundationCalculator,
    FoundationSummary, PlanningCalculator, PlanningSummary, PortfolioCalculator, PortfolioSummary,
};
use crate::config::Thresholds;
use crate::metric::HealthStatus;
use crate::schema::{SchemaValidator, SchemaViolation};
use crate::snapshot::ClientSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdReport {
    pub client_id: String,
    pub client_name: String,
    pub as_of: NaiveDate,
    /// SHA-256 of the snapshot the report was computed from
    pub fingerprint: String,

    pub foundation: FoundationSummary,
    pub cash_flow: CashFlowSummary,
    pub portfolio: PortfolioSummary,
    pub planning: PlanningSummary,
    pub estate: EstateSummary,

    /// Mean of the section scores that could be graded
    pub overall_score: Option<f64>,
    pub overall_status: Option<HealthStatus>,
}

impl HouseholdReport {
    pub fn summary(&self) -> String {
        let overall = self
            .overall_score
            .map_or("N/A".to_string(), |s| format!("{:.0}", s));
        [
            format!("{} as of {} (overall {})", self.client_name, self.as_of, overall),
            self.foundation.summary(),
            self.cash_flow.summary(),
            self.portfolio.summary(),
            self.planning.summary(),
            self.estate.summary(),
        ]
        .join("\n")
    }

    pub fn section_scores(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("foundation", self.foundation.health.overall_score),
            ("cash_flow", self.cash_flow.health.overall_score),
            ("portfolio", self.portfolio.health.overall_score),
            ("planning", self.planning.health.overall_score),
            ("estate", self.estate.health.overall_score),
        ]
    }

    pub fn issue_count(&self) -> usize {
        self.foundation.issues.len()
            + self.cash_flow.issues.len()
            + self.portfolio.issues.len()
            + self.planning.issues.len()
            + self.estate.issues.len()
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Validates the snapshot, then computes every section.
///
/// Schema violations stop the report before any calculator runs; everything
/// recoverable ends up inside the section summaries.
pub fn build_report(
    snapshot: &ClientSnapshot,
    thresholds: &Thresholds,
) -> Result<HouseholdReport, Vec<SchemaViolation>> {
    SchemaValidator::new().validate(snapshot)?;

    let mut report = HouseholdReport {
        client_id: snapshot.client.id.clone(),
        client_name: snapshot.client.name.clone(),
        as_of: snapshot.as_of,
        fingerprint: snapshot.fingerprint(),
        foundation: FoundationCalculator::new(thresholds).compute(snapshot),
        cash_flow: CashFlowCalculator::new(thresholds).compute(snapshot),
        portfolio: PortfolioCalculator::new(thresholds).compute(snapshot),
        planning: PlanningCalculator::new(thresholds).compute(snapshot),
        estate: EstateCalculator::new(thresholds).compute(snapshot),
        overall_score: None,
        overall_status: None,
    };

    let scores: Vec<f64> = report
        .section_scores()
        .iter()
        .filter_map(|(_, score)| *score)
        .collect();
    if !scores.is_empty() {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        report.overall_score = Some(mean);
        report.overall_status = Some(HealthStatus::from_score(mean));
    }

    tracing::info!(
        client_id = %report.client_id,
        as_of = %report.as_of,
        overall = ?report.overall_score,
        issues = report.issue_count(),
        "household report built"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::*;

    #[test]
    fn test_report_is_idempotent() {
        let snapshot = household();
        let thresholds = Thresholds::default();

        let first = build_report(&snapshot, &thresholds).unwrap();
        let second = build_report(&snapshot, &thresholds).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_json(false).unwrap(), second.to_json(false).unwrap());
        assert_eq!(first.fingerprint, snapshot.fingerprint());
        println!("✅ {}", first.summary());
    }

    #[test]
    fn test_overall_score_is_mean_of_sections() {
        let report = build_report(&household(), &Thresholds::default()).unwrap();

        let scores: Vec<f64> = report
            .section_scores()
            .iter()
            .map(|(name, score)| score.unwrap_or_else(|| panic!("{} not graded", name)))
            .collect();
        let mean = scores.iter().sum::<f64>() / 5.0;
        assert!((report.overall_score.unwrap() - mean).abs() < 1e-9);
        assert_eq!(report.overall_status, Some(HealthStatus::from_score(mean)));
    }

    #[test]
    fn test_schema_violations_stop_the_report() {
        let mut snapshot = household();
        snapshot.client.retirement_age = 0;
        snapshot.goal_allocations[0].allocation_percentage = 140.0;

        let violations = build_report(&snapshot, &Thresholds::default()).unwrap_err();
        assert!(violations.len() >= 2);
        assert!(violations.iter().any(|v| v.field == "retirement_age"));
    }

    #[test]
    fn test_unusable_prices_stop_the_report() {
        let mut snapshot = household();
        snapshot.prices.set("aapl", -500.0);
        let violations = build_report(&snapshot, &Thresholds::default()).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].record, "price aapl");

        snapshot.prices.set("aapl", f64::INFINITY);
        let violations = build_report(&snapshot, &Thresholds::default()).unwrap_err();
        assert_eq!(violations[0].record, "price aapl");

        // Calculators run on their own still exclude the holding instead of panicking
        let foundation = FoundationCalculator::new(&Thresholds::default()).compute(&snapshot);
        assert_eq!(foundation.liquid_net_worth, 60_000.0);
        assert_eq!(foundation.net_worth, 176_000.0);
        assert_eq!(foundation.issues.len(), 1);
    }

    #[test]
    fn test_report_serialises_not_applicable_metrics() {
        let mut snapshot = household();
        snapshot.income.clear();

        let report = build_report(&snapshot, &Thresholds::default()).unwrap();
        let json = report.to_json(true).unwrap();
        assert!(json.contains("\"state\": \"not_applicable\""));
        assert!(json.contains("division_undefined"));
    }
}
