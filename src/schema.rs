// 📐 Shape Layer - Snapshot Validation
// Rejects snapshots that break the data model before any calculator runs

use crate::snapshot::ClientSnapshot;
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// Record kind and id, e.g. "goal goal-1"
    pub record: String,
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(record: impl Into<String>, field: &str, message: impl Into<String>) -> Self {
        SchemaViolation {
            record: record.into(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.record, self.field, self.message)
    }
}

impl std::error::Error for SchemaViolation {}

pub type ValidationResult = Result<(), Vec<SchemaViolation>>;

fn finish(errors: Vec<SchemaViolation>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator {
    /// Slack allowed when per-goal allocations are summed
    allocation_tolerance: f64,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator {
            allocation_tolerance: 1e-6,
        }
    }

    pub fn validate_client(&self, snapshot: &ClientSnapshot) -> ValidationResult {
        let mut errors = Vec::new();
        let client = &snapshot.client;
        let record = format!("client {}", client.id);

        if client.id.trim().is_empty() {
            errors.push(SchemaViolation::new(&record, "id", "Required field is empty"));
        }
        if client.retirement_age == 0 || client.retirement_age > 120 {
            errors.push(SchemaViolation::new(
                &record,
                "retirement_age",
                format!("Must be between 1 and 120, got {}", client.retirement_age),
            ));
        }
        if client.date_of_birth > snapshot.as_of {
            errors.push(SchemaViolation::new(
                &record,
                "date_of_birth",
                format!("{} is after the as-of date {}", client.date_of_birth, snapshot.as_of),
            ));
        }

        finish(errors)
    }

    /// Allocation percentages within [0,100] and at most 100 per goal
    pub fn validate_allocations(&self, snapshot: &ClientSnapshot) -> ValidationResult {
        let mut errors = Vec::new();
        let mut per_goal: BTreeMap<&str, f64> = BTreeMap::new();

        for allocation in &snapshot.goal_allocations {
            let pct = allocation.allocation_percentage;
            if !(0.0..=100.0).contains(&pct) {
                errors.push(SchemaViolation::new(
                    format!("allocation {}/{}", allocation.goal_id, allocation.account_id),
                    "allocation_percentage",
                    format!("Must be between 0 and 100, got {}", pct),
                ));
            }
            *per_goal.entry(allocation.goal_id.as_str()).or_insert(0.0) += pct;
        }

        for (goal_id, total) in per_goal {
            if total > 100.0 + self.allocation_tolerance {
                errors.push(SchemaViolation::new(
                    format!("goal {}", goal_id),
                    "allocation_percentage",
                    format!("Allocations sum to {}, more than 100", total),
                ));
            }
        }

        for goal in &snapshot.goals {
            if !(1..=5).contains(&goal.priority) {
                errors.push(SchemaViolation::new(
                    format!("goal {}", goal.id),
                    "priority",
                    format!("Must be between 1 and 5, got {}", goal.priority),
                ));
            }
        }

        finish(errors)
    }

    /// Amounts and prices that must be finite and non-negative
    pub fn validate_amounts(&self, snapshot: &ClientSnapshot) -> ValidationResult {
        let mut errors = Vec::new();

        let mut check = |record: String, field: &str, value: f64| {
            if !value.is_finite() || value < 0.0 {
                errors.push(SchemaViolation::new(
                    record,
                    field,
                    format!("Must be a non-negative amount, got {}", value),
                ));
            }
        };

        for tx in &snapshot.transactions {
            check(format!("transaction {}", tx.id), "amount", tx.amount);
        }
        for liability in &snapshot.liabilities {
            let record = format!("liability {}", liability.id);
            check(record.clone(), "balance", liability.balance);
            check(record.clone(), "interest_rate", liability.interest_rate);
            check(record, "minimum_payment", liability.minimum_payment);
        }
        for income in &snapshot.income {
            check(format!("income {}", income.id), "amount", income.amount);
        }
        for holding in &snapshot.holdings {
            let record = format!("holding {}", holding.id);
            check(record.clone(), "quantity", holding.quantity);
            check(record, "cost_basis", holding.cost_basis);
        }
        for (security_id, price) in snapshot.prices.iter() {
            check(format!("price {}", security_id), "price", price);
        }
        for goal in &snapshot.goals {
            let record = format!("goal {}", goal.id);
            check(record.clone(), "target_amount", goal.target_amount);
            check(record, "monthly_contribution", goal.monthly_contribution);
        }
        if let Some(insurance) = &snapshot.insurance {
            let record = format!("insurance {}", insurance.id);
            check(record.clone(), "life_insurance_coverage", insurance.life_insurance_coverage);
            check(record, "disability_coverage_monthly", insurance.disability_coverage_monthly);
        }

        for income in &snapshot.income {
            if let Some(end) = income.end_date {
                if end < income.start_date {
                    errors.push(SchemaViolation::new(
                        format!("income {}", income.id),
                        "end_date",
                        format!("{} is before start_date {}", end, income.start_date),
                    ));
                }
            }
        }

        finish(errors)
    }

    /// Ids that must be unique inside the snapshot
    pub fn validate_identity(&self, snapshot: &ClientSnapshot) -> ValidationResult {
        let mut errors = Vec::new();

        let mut unique = |kind: &str, ids: Vec<&str>| {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    errors.push(SchemaViolation::new(
                        format!("{} {}", kind, id),
                        "id",
                        "Duplicate id",
                    ));
                }
            }
        };

        unique("account", snapshot.accounts.iter().map(|a| a.id.as_str()).collect());
        unique("security", snapshot.securities.iter().map(|s| s.id.as_str()).collect());
        unique("holding", snapshot.holdings.iter().map(|h| h.id.as_str()).collect());
        unique("transaction", snapshot.transactions.iter().map(|t| t.id.as_str()).collect());
        unique("goal", snapshot.goals.iter().map(|g| g.id.as_str()).collect());

        finish(errors)
    }

    /// All checks; every violation is collected, not just the first
    pub fn validate(&self, snapshot: &ClientSnapshot) -> ValidationResult {
        let mut errors = Vec::new();

        for result in [
            self.validate_client(snapshot),
            self.validate_identity(snapshot),
            self.validate_allocations(snapshot),
            self.validate_amounts(snapshot),
        ] {
            if let Err(mut found) = result {
                errors.append(&mut found);
            }
        }

        if !errors.is_empty() {
            tracing::warn!(
                client_id = %snapshot.client.id,
                violations = errors.len(),
                "snapshot rejected"
            );
        }

        finish(errors)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_snapshot(snapshot: &ClientSnapshot) -> ValidationResult {
    SchemaValidator::new().validate(snapshot)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GoalAllocation;
    use crate::snapshot::fixtures::*;

    #[test]
    fn test_household_fixture_is_valid() {
        assert!(validate_snapshot(&household()).is_ok());
    }

    #[test]
    fn test_allocation_over_100_rejected() {
        let mut snapshot = household();
        snapshot.goal_allocations.push(GoalAllocation {
            goal_id: "goal-college".to_string(),
            account_id: "roth".to_string(),
            allocation_percentage: 80.0,
        });

        let errors = validate_snapshot(&snapshot).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].record, "goal goal-college");
        assert_eq!(errors[0].field, "allocation_percentage");
    }

    #[test]
    fn test_allocation_out_of_range_rejected() {
        let mut snapshot = household();
        snapshot.goal_allocations[0].allocation_percentage = -5.0;

        let errors = SchemaValidator::new()
            .validate_allocations(&snapshot)
            .unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("between 0 and 100")));
    }

    #[test]
    fn test_priority_and_retirement_age() {
        let mut snapshot = household();
        snapshot.goals[0].priority = 9;
        snapshot.client.retirement_age = 0;

        let errors = validate_snapshot(&snapshot).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "priority"));
        assert!(errors.iter().any(|e| e.field == "retirement_age"));
    }

    #[test]
    fn test_collects_every_violation() {
        let mut snapshot = household();
        snapshot.transactions[0].amount = -10.0;
        snapshot.liabilities[0].balance = f64::NAN;
        let dup = snapshot.accounts[0].clone();
        snapshot.accounts.push(dup);

        let errors = validate_snapshot(&snapshot).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().starts_with("[account checking] id"));
    }

    #[test]
    fn test_bad_holding_amounts_rejected() {
        let mut snapshot = household();
        snapshot.holdings[2].quantity = -1.0;
        snapshot.holdings[3].cost_basis = f64::INFINITY;

        let errors = SchemaValidator::new().validate_amounts(&snapshot).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].record, "holding h-brok-vti");
        assert_eq!(errors[0].field, "quantity");
        assert_eq!(errors[1].record, "holding h-brok-bnd");
        assert_eq!(errors[1].field, "cost_basis");
    }

    #[test]
    fn test_bad_prices_rejected() {
        let mut snapshot = household();
        snapshot.prices.set("aapl", -500.0);
        snapshot.prices.set("vti", f64::INFINITY);
        snapshot.prices.set("bnd", f64::NAN);
        snapshot.prices.set("active", 12.5);

        let errors = validate_snapshot(&snapshot).unwrap_err();
        let records: Vec<&str> = errors.iter().map(|e| e.record.as_str()).collect();
        assert_eq!(records, vec!["price aapl", "price bnd", "price vti"]);
        assert!(errors.iter().all(|e| e.field == "price"));
    }

    #[test]
    fn test_goal_target_must_be_a_finite_amount() {
        let mut snapshot = household();
        snapshot.goals[0].target_amount = f64::NAN;
        let errors = validate_snapshot(&snapshot).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "target_amount");

        snapshot.goals[0].target_amount = -150_000.0;
        assert!(validate_snapshot(&snapshot).is_err());

        // zero is left to the planning section, which reports it as not applicable
        snapshot.goals[0].target_amount = 0.0;
        assert!(validate_snapshot(&snapshot).is_ok());
    }
}
