// 📏 Metric values - computed numbers or a defined "not applicable" state
//
// Calculators never raise: a metric whose inputs are missing or whose
// denominator is zero carries the reason instead of a number.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CALCULATION ERRORS (recoverable at the calculator boundary)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcError {
    /// Missing or negative amounts, malformed or out-of-range dates
    InvalidInput { field: String, detail: String },

    /// A ratio was requested over a zero (or non-finite) denominator
    DivisionUndefined { metric: String },

    /// A record points at something the snapshot does not contain
    ReferentialGap { record: String, missing: String },
}

impl CalcError {
    pub fn invalid_input(field: &str, detail: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn division_undefined(metric: &str) -> Self {
        CalcError::DivisionUndefined {
            metric: metric.to_string(),
        }
    }

    pub fn referential_gap(record: impl Into<String>, missing: impl Into<String>) -> Self {
        CalcError::ReferentialGap {
            record: record.into(),
            missing: missing.into(),
        }
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::InvalidInput { field, detail } => {
                write!(f, "invalid input for {}: {}", field, detail)
            }
            CalcError::DivisionUndefined { metric } => {
                write!(f, "{} is undefined (zero denominator)", metric)
            }
            CalcError::ReferentialGap { record, missing } => {
                write!(f, "{} references missing {}", record, missing)
            }
        }
    }
}

impl std::error::Error for CalcError {}

// ============================================================================
// METRIC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Metric {
    Computed { value: f64 },
    NotApplicable { reason: CalcError },
}

impl Metric {
    pub fn computed(value: f64) -> Self {
        Metric::Computed { value }
    }

    pub fn not_applicable(reason: CalcError) -> Self {
        Metric::NotApplicable { reason }
    }

    /// numerator / denominator, or DivisionUndefined when the quotient
    /// would not be a finite number
    pub fn ratio(metric: &str, numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
            return Metric::not_applicable(CalcError::division_undefined(metric));
        }
        Metric::computed(numerator / denominator)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Computed { value } => Some(*value),
            Metric::NotApplicable { .. } => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Metric::Computed { .. })
    }

    pub fn reason(&self) -> Option<&CalcError> {
        match self {
            Metric::Computed { .. } => None,
            Metric::NotApplicable { reason } => Some(reason),
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Computed { value } => Metric::computed(f(value)),
            other => other,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Computed { value } => write!(f, "{:.4}", value),
            Metric::NotApplicable { .. } => write!(f, "N/A"),
        }
    }
}

// ============================================================================
// HEALTH STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn score(&self) -> f64 {
        match self {
            HealthStatus::Excellent => 100.0,
            HealthStatus::Good => 75.0,
            HealthStatus::Fair => 50.0,
            HealthStatus::Poor => 25.0,
            HealthStatus::Critical => 0.0,
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            HealthStatus::Excellent
        } else if score >= 65.0 {
            HealthStatus::Good
        } else if score >= 45.0 {
            HealthStatus::Fair
        } else if score >= 25.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Fair => "fair",
            HealthStatus::Poor => "poor",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Weighted mean of status scores; `None` when nothing was graded.
pub fn section_score(graded: &[(HealthStatus, f64)]) -> Option<f64> {
    let total_weight: f64 = graded.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }
    let total: f64 = graded.iter().map(|(s, w)| s.score() * w).sum();
    Some(total / total_weight)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_zero_denominator_is_not_applicable() {
        let m = Metric::ratio("debt_to_income", 1200.0, 0.0);
        assert!(!m.is_applicable());
        assert_eq!(m.value(), None);
        assert!(matches!(
            m.reason(),
            Some(CalcError::DivisionUndefined { metric }) if metric == "debt_to_income"
        ));
    }

    #[test]
    fn test_ratio_computes() {
        let m = Metric::ratio("x", 3.0, 4.0);
        assert_eq!(m.value(), Some(0.75));
        assert_eq!(m.map(|v| v * 100.0).value(), Some(75.0));
    }

    #[test]
    fn test_section_score_weights() {
        let score = section_score(&[
            (HealthStatus::Excellent, 2.0),
            (HealthStatus::Critical, 2.0),
        ]);
        assert_eq!(score, Some(50.0));
        assert_eq!(HealthStatus::from_score(50.0), HealthStatus::Fair);
        assert_eq!(section_score(&[]), None);
    }

    #[test]
    fn test_metric_serializes_with_state_tag() {
        let json = serde_json::to_value(Metric::computed(6.0)).unwrap();
        assert_eq!(json["state"], "computed");
        assert_eq!(json["value"], 6.0);

        let json = serde_json::to_value(Metric::not_applicable(
            CalcError::division_undefined("savings_rate"),
        ))
        .unwrap();
        assert_eq!(json["state"], "not_applicable");
        assert_eq!(json["reason"]["kind"], "division_undefined");
    }
}
