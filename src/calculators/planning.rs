// 🎯 Planning Calculator - retirement projection, stress tests, goal funding
//
// Deterministic compounding at month granularity. No Monte Carlo.

use super::{round2, GradedMetric, SectionHealth};
use crate::config::Thresholds;
use crate::metric::{CalcError, HealthStatus, Metric};
use crate::money;
use crate::snapshot::ClientSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// PURE FORMULAS
// ============================================================================

/// FV = P(1+r)^n + C((1+r)^n − 1)/r with r = annual/12; P + C·n when r = 0
pub fn future_value(principal: f64, monthly_contribution: f64, annual_rate: f64, months: u32) -> f64 {
    let n = months as f64;
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return principal + monthly_contribution * n;
    }
    let growth = (1.0 + r).powf(n);
    principal * growth + monthly_contribution * (growth - 1.0) / r
}

/// Nominal value deflated to today's dollars
pub fn real_value(nominal: f64, annual_inflation: f64, months: u32) -> f64 {
    nominal / (1.0 + annual_inflation).powf(months as f64 / 12.0)
}

/// Monthly contribution that grows `saved` into `target` over `months`, floored at 0
pub fn required_monthly(target: f64, saved: f64, annual_rate: f64, months: u32) -> Metric {
    if months == 0 {
        return Metric::not_applicable(CalcError::invalid_input(
            "target_date",
            "no months remaining",
        ));
    }
    let n = months as f64;
    let r = annual_rate / 12.0;
    let required = if r == 0.0 {
        (target - saved) / n
    } else {
        let growth = (1.0 + r).powf(n);
        (target - saved * growth) * r / (growth - 1.0)
    };
    if required.is_finite() {
        Metric::computed(required.max(0.0))
    } else {
        Metric::not_applicable(CalcError::division_undefined("required_monthly"))
    }
}

fn grade_replacement(ratio: f64) -> HealthStatus {
    if ratio >= 1.0 {
        HealthStatus::Excellent
    } else if ratio >= 0.85 {
        HealthStatus::Good
    } else if ratio >= 0.70 {
        HealthStatus::Fair
    } else if ratio >= 0.50 {
        HealthStatus::Poor
    } else {
        HealthStatus::Critical
    }
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub annual_return: f64,
    pub inflation: f64,
    pub projected_nominal: f64,
    pub projected_real: f64,
    /// Versus the base case
    pub nominal_delta: f64,
    pub real_delta: f64,
    pub replacement_ratio: Metric,
}

/// Adjustments for a what-if projection; all zero reproduces the base case
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIf {
    /// Percent change in income; contributions move with it
    pub income_change_pct: f64,
    /// Percent change in spending; the retirement target moves with it
    pub expense_change_pct: f64,
    /// Added to the assumed annual return (0.01 = one point)
    pub return_change: f64,
    /// Years added to the retirement age; negative retires earlier
    pub retirement_age_change: i32,
}

impl WhatIf {
    pub fn label(&self, retirement_age: u32) -> String {
        let mut parts = Vec::new();
        if self.income_change_pct != 0.0 {
            parts.push(format!("Income {:+.0}%", self.income_change_pct));
        }
        if self.expense_change_pct != 0.0 {
            parts.push(format!("Expenses {:+.0}%", self.expense_change_pct));
        }
        if self.return_change != 0.0 {
            parts.push(format!("Returns {:+.1}%", self.return_change * 100.0));
        }
        if self.retirement_age_change != 0 {
            parts.push(format!(
                "Retire at {}",
                retirement_age as i32 + self.retirement_age_change
            ));
        }
        if parts.is_empty() {
            "Base case".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfResult {
    pub label: String,
    pub scenario: WhatIf,
    pub months_to_retirement: u32,
    pub monthly_contribution: f64,
    pub annual_return: f64,
    pub projected_nominal: f64,
    pub projected_real: f64,
    pub sustainable_monthly_income: f64,
    pub target_monthly_spend: Metric,
    pub base_replacement_ratio: Metric,
    pub replacement_ratio: GradedMetric,
    /// Scenario ratio minus the base ratio
    pub replacement_change: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    OnTrack,
    Underfunded,
    Overfunded,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalFunding {
    pub goal_id: String,
    pub name: String,
    pub target_amount: f64,
    pub target_date: NaiveDate,
    pub months_remaining: i32,
    pub current_saved: f64,
    /// saved / target
    pub progress: Metric,
    pub required_monthly: Metric,
    pub planned_monthly: f64,
    /// planned − required
    pub gap: Metric,
    pub status: GoalStatus,
    pub health: Option<HealthStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSummary {
    pub months_to_retirement: u32,
    pub invested_assets: f64,
    pub monthly_contribution: f64,
    pub contribution_overridden: bool,
    pub assumed_annual_return: f64,
    pub assumed_inflation: f64,

    pub projected_nominal: f64,
    /// Projection in today's dollars
    pub projected_real: f64,
    pub sustainable_monthly_income: f64,
    pub target_monthly_spend: Metric,
    /// Sustainable income / target spend
    pub replacement_ratio: GradedMetric,

    pub scenarios: Vec<ScenarioResult>,
    /// Worst replacement ratio across stress scenarios
    pub stress_replacement_ratio: GradedMetric,

    pub goals: Vec<GoalFunding>,

    #[serde(flatten)]
    pub health: SectionHealth,
    pub recommendations: Vec<String>,
    pub issues: Vec<CalcError>,
}

impl PlanningSummary {
    pub fn summary(&self) -> String {
        let on_track = self
            .goals
            .iter()
            .filter(|g| g.status != GoalStatus::Underfunded && g.status != GoalStatus::NotApplicable)
            .count();
        format!(
            "Planning: ${:.0} projected in {} months (${:.0} today), replacement {}, {}/{} goals funded",
            self.projected_nominal,
            self.months_to_retirement,
            self.projected_real,
            self.replacement_ratio.metric,
            on_track,
            self.goals.len()
        )
    }

    pub fn goal(&self, goal_id: &str) -> Option<&GoalFunding> {
        self.goals.iter().find(|g| g.goal_id == goal_id)
    }
}

// ============================================================================
// PLANNING CALCULATOR
// ============================================================================

pub struct PlanningCalculator {
    thresholds: Thresholds,
}

struct Projection {
    nominal: f64,
    real: f64,
    sustainable_monthly: f64,
    replacement: Metric,
}

/// Household figures every projection starts from
struct PlanInputs {
    invested: f64,
    monthly_contribution: f64,
    contribution_overridden: bool,
    /// Negative once the retirement date has passed
    months_to_retirement: i32,
    /// Today's monthly consumption; the target is a share of it
    monthly_consumption: Option<f64>,
}

impl PlanningCalculator {
    pub fn new(thresholds: &Thresholds) -> Self {
        PlanningCalculator {
            thresholds: thresholds.clone(),
        }
    }

    fn project(
        &self,
        principal: f64,
        monthly_contribution: f64,
        months: u32,
        annual_return: f64,
        inflation: f64,
        target_spend: &Metric,
    ) -> Projection {
        let nominal = future_value(principal, monthly_contribution, annual_return, months);
        let real = real_value(nominal, inflation, months);
        let sustainable_monthly = real * self.thresholds.withdrawal_rate / 12.0;
        let replacement = match target_spend {
            Metric::Computed { value } => Metric::ratio("replacement_ratio", sustainable_monthly, *value),
            Metric::NotApplicable { reason } => Metric::not_applicable(reason.clone()),
        };
        Projection {
            nominal,
            real,
            sustainable_monthly,
            replacement,
        }
    }

    fn inputs(&self, snapshot: &ClientSnapshot, issues: &mut Vec<CalcError>) -> PlanInputs {
        let t = &self.thresholds;
        let totals = snapshot.window_totals(t.trailing_months);

        let (monthly_contribution, contribution_overridden) = match t.monthly_contribution_override {
            Some(amount) => (amount, true),
            None => match totals.monthly(totals.contributions) {
                Some(amount) => (amount, false),
                None => {
                    issues.push(CalcError::invalid_input(
                        "transactions",
                        "no contribution history; projecting without contributions",
                    ));
                    (0.0, false)
                }
            },
        };

        PlanInputs {
            invested: snapshot.invested_assets(),
            monthly_contribution,
            contribution_overridden,
            months_to_retirement: money::months_between(snapshot.as_of, snapshot.client.retirement_date()),
            monthly_consumption: totals.monthly(totals.consumption()),
        }
    }

    /// Retirement spending target: a share of today's spending, scaled
    fn target_spend(&self, monthly_consumption: Option<f64>, scale: f64) -> Metric {
        match monthly_consumption {
            Some(monthly) => Metric::computed(monthly * self.thresholds.retirement_spend_ratio * scale),
            None => Metric::not_applicable(CalcError::invalid_input(
                "transactions",
                "no spending history to size retirement needs",
            )),
        }
    }

    pub fn compute(&self, snapshot: &ClientSnapshot) -> PlanningSummary {
        let t = &self.thresholds;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let inputs = self.inputs(snapshot, &mut issues);
        let invested = inputs.invested;
        let monthly_contribution = inputs.monthly_contribution;
        let contribution_overridden = inputs.contribution_overridden;
        let months_to_retirement = inputs.months_to_retirement.max(0) as u32;
        let target_spend = self.target_spend(inputs.monthly_consumption, 1.0);

        let base = self.project(
            invested,
            monthly_contribution,
            months_to_retirement,
            t.assumed_annual_return,
            t.assumed_inflation,
            &target_spend,
        );
        let replacement = GradedMetric::grade(base.replacement.clone(), 1.0, grade_replacement);

        if let (Some(ratio), Some(target)) = (replacement.value(), target_spend.value()) {
            if ratio < 1.0 {
                recommendations.push(format!(
                    "Projected shortfall of ${:.0}/month in retirement",
                    target - base.sustainable_monthly
                ));
            }
            if months_to_retirement < 120 && ratio < 0.85 {
                recommendations.push("Consider delaying retirement or reducing expenses".to_string());
            }
        }

        // Stress scenarios
        let scenarios: Vec<ScenarioResult> = t
            .stress_scenarios
            .iter()
            .map(|scenario| {
                let annual_return = t.assumed_annual_return + scenario.return_shock;
                let inflation = t.assumed_inflation + scenario.inflation_shock;
                let stressed = self.project(
                    invested,
                    monthly_contribution,
                    months_to_retirement,
                    annual_return,
                    inflation,
                    &target_spend,
                );
                ScenarioResult {
                    name: scenario.name.clone(),
                    annual_return,
                    inflation,
                    projected_nominal: round2(stressed.nominal),
                    projected_real: round2(stressed.real),
                    nominal_delta: round2(stressed.nominal - base.nominal),
                    real_delta: round2(stressed.real - base.real),
                    replacement_ratio: stressed.replacement,
                }
            })
            .collect();

        let worst = scenarios
            .iter()
            .filter_map(|s| s.replacement_ratio.value())
            .fold(None, |worst: Option<f64>, r| Some(worst.map_or(r, |w| w.min(r))));
        let stress = match worst {
            Some(ratio) => Metric::computed(ratio),
            None if scenarios.is_empty() => Metric::not_applicable(CalcError::invalid_input(
                "stress_scenarios",
                "no stress scenarios configured",
            )),
            None => base.replacement.clone(),
        };
        let stress = GradedMetric::grade(stress, 0.85, grade_replacement);
        if stress.value().map_or(false, |r| r < 0.70) {
            recommendations.push("Plan shows vulnerability to market downturns".to_string());
        }

        // Goals
        let goals = self.fund_goals(snapshot, &mut issues, &mut recommendations);

        let mut graded: Vec<(HealthStatus, f64)> = [&replacement, &stress]
            .iter()
            .filter_map(|m| m.status.map(|s| (s, 2.0)))
            .collect();
        graded.extend(goals.iter().filter_map(|g| g.health.map(|s| (s, 1.0))));
        let health = SectionHealth::from_weighted(&graded);

        tracing::debug!(
            client_id = %snapshot.client.id,
            months_to_retirement,
            projected = base.nominal,
            goals = goals.len(),
            "planning computed"
        );

        PlanningSummary {
            months_to_retirement,
            invested_assets: invested,
            monthly_contribution: round2(monthly_contribution),
            contribution_overridden,
            assumed_annual_return: t.assumed_annual_return,
            assumed_inflation: t.assumed_inflation,
            projected_nominal: round2(base.nominal),
            projected_real: round2(base.real),
            sustainable_monthly_income: round2(base.sustainable_monthly),
            target_monthly_spend: target_spend.map(round2),
            replacement_ratio: replacement,
            scenarios,
            stress_replacement_ratio: stress,
            goals,
            health,
            recommendations,
            issues,
        }
    }

    /// Re-runs the retirement projection with adjusted income, spending,
    /// return and retirement age, and compares it with the base case
    pub fn what_if(&self, snapshot: &ClientSnapshot, scenario: &WhatIf) -> WhatIfResult {
        let t = &self.thresholds;
        let mut ignored = Vec::new();
        let inputs = self.inputs(snapshot, &mut ignored);

        let base_months = inputs.months_to_retirement.max(0) as u32;
        let base_target = self.target_spend(inputs.monthly_consumption, 1.0);
        let base = self.project(
            inputs.invested,
            inputs.monthly_contribution,
            base_months,
            t.assumed_annual_return,
            t.assumed_inflation,
            &base_target,
        );

        let months = (inputs.months_to_retirement + 12 * scenario.retirement_age_change).max(0) as u32;
        let contribution = (inputs.monthly_contribution * (1.0 + scenario.income_change_pct / 100.0)).max(0.0);
        let annual_return = t.assumed_annual_return + scenario.return_change;
        let target = self.target_spend(
            inputs.monthly_consumption,
            (1.0 + scenario.expense_change_pct / 100.0).max(0.0),
        );
        let modified = self.project(
            inputs.invested,
            contribution,
            months,
            annual_return,
            t.assumed_inflation,
            &target,
        );

        let replacement_change = match (modified.replacement.value(), base.replacement.value()) {
            (Some(after), Some(before)) => Metric::computed(after - before),
            _ => modified.replacement.clone(),
        };

        tracing::debug!(
            client_id = %snapshot.client.id,
            months,
            annual_return,
            replacement = %modified.replacement,
            "what-if projected"
        );

        WhatIfResult {
            label: scenario.label(snapshot.client.retirement_age),
            scenario: *scenario,
            months_to_retirement: months,
            monthly_contribution: round2(contribution),
            annual_return,
            projected_nominal: round2(modified.nominal),
            projected_real: round2(modified.real),
            sustainable_monthly_income: round2(modified.sustainable_monthly),
            target_monthly_spend: target.map(round2),
            base_replacement_ratio: base.replacement,
            replacement_ratio: GradedMetric::grade(modified.replacement, 1.0, grade_replacement),
            replacement_change,
        }
    }

    fn fund_goals(
        &self,
        snapshot: &ClientSnapshot,
        issues: &mut Vec<CalcError>,
        recommendations: &mut Vec<String>,
    ) -> Vec<GoalFunding> {
        let t = &self.thresholds;

        for allocation in &snapshot.goal_allocations {
            if snapshot.goal(&allocation.goal_id).is_none() {
                issues.push(CalcError::referential_gap(
                    format!("allocation of account {}", allocation.account_id),
                    format!("goal {}", allocation.goal_id),
                ));
            }
        }

        snapshot
            .goals
            .iter()
            .map(|goal| {
                for allocation in snapshot
                    .goal_allocations
                    .iter()
                    .filter(|a| a.goal_id == goal.id)
                    .filter(|a| snapshot.account(&a.account_id).is_none())
                {
                    issues.push(CalcError::referential_gap(
                        format!("goal {}", goal.id),
                        format!("account {}", allocation.account_id),
                    ));
                }
                let current_saved = snapshot.goal_saved(&goal.id);
                let months_remaining = money::months_between(snapshot.as_of, goal.target_date);

                let required = if goal.target_amount <= 0.0 {
                    Metric::not_applicable(CalcError::invalid_input(
                        "target_amount",
                        format!("goal {} has no positive target", goal.id),
                    ))
                } else if months_remaining <= 0 {
                    Metric::not_applicable(CalcError::invalid_input(
                        "target_date",
                        format!("goal {} target date {} has passed", goal.id, goal.target_date),
                    ))
                } else {
                    required_monthly(
                        goal.target_amount,
                        current_saved,
                        t.assumed_annual_return,
                        months_remaining as u32,
                    )
                };

                let planned = goal.monthly_contribution;
                let gap = required.clone().map(|r| planned - r);
                let status = match (required.value(), gap.value()) {
                    (Some(r), Some(g)) if g.abs() <= (t.goal_tolerance * r).max(1.0) => GoalStatus::OnTrack,
                    (Some(_), Some(g)) if g < 0.0 => GoalStatus::Underfunded,
                    (Some(_), Some(_)) => GoalStatus::Overfunded,
                    _ => GoalStatus::NotApplicable,
                };

                let progress = Metric::ratio("goal_progress", current_saved, goal.target_amount);
                let health = match status {
                    GoalStatus::NotApplicable => None,
                    GoalStatus::Overfunded => Some(HealthStatus::Excellent),
                    GoalStatus::OnTrack => {
                        if progress.value().map_or(false, |p| p >= 0.75) {
                            Some(HealthStatus::Excellent)
                        } else {
                            Some(HealthStatus::Good)
                        }
                    }
                    GoalStatus::Underfunded => {
                        let share = required
                            .value()
                            .filter(|r| *r > 0.0)
                            .map_or(0.0, |r| planned / r);
                        Some(if share >= 0.8 {
                            HealthStatus::Fair
                        } else if share >= 0.5 {
                            HealthStatus::Poor
                        } else {
                            HealthStatus::Critical
                        })
                    }
                };

                if status == GoalStatus::Underfunded {
                    recommendations.push(format!(
                        "Increase monthly contribution to {} by ${:.0} to stay on track",
                        goal.name,
                        -gap.value().unwrap_or(0.0)
                    ));
                }

                GoalFunding {
                    goal_id: goal.id.clone(),
                    name: goal.name.clone(),
                    target_amount: goal.target_amount,
                    target_date: goal.target_date,
                    months_remaining,
                    current_saved,
                    progress,
                    required_monthly: required.map(round2),
                    planned_monthly: planned,
                    gap: gap.map(round2),
                    status,
                    health,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Goal, GoalAllocation};
    use crate::snapshot::fixtures::*;

    fn goal(id: &str, target: f64, due: NaiveDate, monthly: f64) -> Goal {
        Goal {
            id: id.to_string(),
            client_id: "client-1".to_string(),
            name: id.to_string(),
            target_amount: target,
            target_date: due,
            priority: 2,
            monthly_contribution: monthly,
        }
    }

    #[test]
    fn test_future_value_formula() {
        let fv = future_value(500_000.0, 1_000.0, 0.06, 240);
        // 500000 × 1.005^240 + 1000 × (1.005^240 − 1) / 0.005
        assert!((fv - 2_117_143.13).abs() < 1.0, "got {}", fv);

        assert_eq!(future_value(10_000.0, 100.0, 0.0, 12), 11_200.0);
        assert_eq!(future_value(10_000.0, 100.0, 0.06, 0), 10_000.0);
    }

    #[test]
    fn test_projection_increases_with_return() {
        let mut last = f64::MIN;
        for bp in -200..=1200 {
            let rate = bp as f64 / 10_000.0;
            let fv = future_value(250_000.0, 750.0, rate, 300);
            assert!(fv > last, "not increasing at {}", rate);
            last = fv;
        }
    }

    #[test]
    fn test_required_monthly_at_zero_return() {
        let required = required_monthly(75_000.0, 0.0, 0.0, 18).value().unwrap();
        assert!((required - 4_166.67).abs() < 0.005);
        assert_eq!(round2(required), 4_166.67);

        // Already funded
        assert_eq!(required_monthly(10_000.0, 20_000.0, 0.05, 12).value(), Some(0.0));
        assert!(!required_monthly(10_000.0, 0.0, 0.05, 0).is_applicable());
    }

    #[test]
    fn test_household_goal_is_overfunded() {
        let summary = PlanningCalculator::new(&Thresholds::default()).compute(&household());

        let college = summary.goal("goal-college").unwrap();
        // 25% of the 190k brokerage account
        assert_eq!(college.current_saved, 47_500.0);
        assert_eq!(college.months_remaining, 120);
        assert!((college.required_monthly.value().unwrap() - 387.96).abs() < 0.01);
        assert_eq!(college.status, GoalStatus::Overfunded);
        assert!(college.gap.value().unwrap() > 0.0);
        println!("✅ {}", summary.summary());
    }

    #[test]
    fn test_goal_on_track_within_tolerance() {
        let mut snapshot = household();
        snapshot.goals = vec![goal("house", 75_000.0, d(2027, 12, 31), 4_166.67)];
        snapshot.goal_allocations.clear();

        let thresholds = Thresholds::default().with_assumed_return(0.0);
        let summary = PlanningCalculator::new(&thresholds).compute(&snapshot);

        let house = summary.goal("house").unwrap();
        assert_eq!(house.months_remaining, 18);
        assert_eq!(house.required_monthly.value(), Some(4_166.67));
        assert_eq!(house.status, GoalStatus::OnTrack);
    }

    #[test]
    fn test_underfunded_goal_recommends_increase() {
        let mut snapshot = household();
        snapshot.goals = vec![goal("boat", 60_000.0, d(2028, 6, 30), 1_000.0)];
        snapshot.goal_allocations.clear();

        let thresholds = Thresholds::default().with_assumed_return(0.0);
        let summary = PlanningCalculator::new(&thresholds).compute(&snapshot);

        let boat = summary.goal("boat").unwrap();
        assert_eq!(boat.status, GoalStatus::Underfunded);
        assert_eq!(boat.gap.value(), Some(-1_500.0));
        assert_eq!(boat.health, Some(HealthStatus::Critical));
        assert!(summary.recommendations.iter().any(|r| r.contains("boat")));
    }

    #[test]
    fn test_past_due_goal_is_not_applicable() {
        let mut snapshot = household();
        snapshot.goals.push(goal("trip", 8_000.0, d(2026, 5, 1), 200.0));

        let summary = PlanningCalculator::new(&Thresholds::default()).compute(&snapshot);
        let trip = summary.goal("trip").unwrap();
        assert_eq!(trip.status, GoalStatus::NotApplicable);
        assert_eq!(trip.health, None);
        assert!(matches!(
            trip.required_monthly.reason(),
            Some(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_allocation_to_missing_account_is_reported() {
        let mut snapshot = household();
        snapshot.goal_allocations.push(GoalAllocation {
            goal_id: "goal-college".to_string(),
            account_id: "closed".to_string(),
            allocation_percentage: 50.0,
        });

        let summary = PlanningCalculator::new(&Thresholds::default()).compute(&snapshot);
        assert_eq!(summary.goal("goal-college").unwrap().current_saved, 47_500.0);
        assert!(summary
            .issues
            .iter()
            .any(|i| matches!(i, CalcError::ReferentialGap { .. })));
    }

    #[test]
    fn test_stress_scenarios_lower_real_value() {
        let summary = PlanningCalculator::new(&Thresholds::default()).compute(&household());

        assert_eq!(summary.invested_assets, 500_000.0);
        assert_eq!(summary.monthly_contribution, 2_500.0);
        assert!(summary.projected_real < summary.projected_nominal);
        assert_eq!(summary.scenarios.len(), 2);

        let return_shock = &summary.scenarios[0];
        assert!(return_shock.nominal_delta < 0.0);
        assert!(return_shock.real_delta < 0.0);

        let inflation_shock = &summary.scenarios[1];
        assert_eq!(inflation_shock.nominal_delta, 0.0);
        assert!(inflation_shock.real_delta < 0.0);

        let worst = summary.stress_replacement_ratio.value().unwrap();
        assert!(worst < summary.replacement_ratio.value().unwrap());
    }

    #[test]
    fn test_contribution_override() {
        let base = PlanningCalculator::new(&Thresholds::default()).compute(&household());
        let none = PlanningCalculator::new(&Thresholds::default().with_monthly_contribution(0.0))
            .compute(&household());

        assert!(none.contribution_overridden);
        assert!(none.projected_nominal < base.projected_nominal);
        assert_eq!(
            none.projected_nominal,
            round2(future_value(500_000.0, 0.0, 0.06, base.months_to_retirement))
        );
    }

    #[test]
    fn test_what_if_base_case_matches_compute() {
        let calculator = PlanningCalculator::new(&Thresholds::default());
        let snapshot = household();
        let summary = calculator.compute(&snapshot);

        let result = calculator.what_if(&snapshot, &WhatIf::default());
        assert_eq!(result.label, "Base case");
        assert_eq!(result.months_to_retirement, summary.months_to_retirement);
        assert_eq!(result.projected_nominal, summary.projected_nominal);
        assert_eq!(result.replacement_ratio.value(), summary.replacement_ratio.value());
        assert_eq!(result.replacement_change.value(), Some(0.0));
    }

    #[test]
    fn test_what_if_adjustments() {
        let calculator = PlanningCalculator::new(&Thresholds::default());
        let snapshot = household();
        let base = calculator.compute(&snapshot);
        let base_ratio = base.replacement_ratio.value().unwrap();

        // Spending 25% higher: same nest egg, larger target
        let spend_more = calculator.what_if(
            &snapshot,
            &WhatIf {
                expense_change_pct: 25.0,
                ..WhatIf::default()
            },
        );
        assert_eq!(spend_more.target_monthly_spend.value(), Some(7_500.0));
        let ratio = spend_more.replacement_ratio.value().unwrap();
        assert!((ratio - base_ratio / 1.25).abs() < 1e-9);
        assert!(spend_more.replacement_change.value().unwrap() < 0.0);

        // A two-point return cut is the configured return shock
        let lower_returns = calculator.what_if(
            &snapshot,
            &WhatIf {
                return_change: -0.02,
                ..WhatIf::default()
            },
        );
        assert_eq!(lower_returns.projected_nominal, base.scenarios[0].projected_nominal);
        assert_eq!(
            lower_returns.replacement_ratio.value(),
            base.scenarios[0].replacement_ratio.value()
        );

        // Earning more and working two more years
        let later = calculator.what_if(
            &snapshot,
            &WhatIf {
                income_change_pct: 10.0,
                retirement_age_change: 2,
                ..WhatIf::default()
            },
        );
        assert_eq!(later.label, "Income +10%, Retire at 67");
        assert_eq!(later.months_to_retirement, base.months_to_retirement + 24);
        assert_eq!(later.monthly_contribution, 2_750.0);
        let expected = future_value(500_000.0, 2_750.0, 0.06, base.months_to_retirement + 24);
        assert!((later.projected_nominal - expected).abs() < 0.01);
        assert!(later.replacement_change.value().unwrap() > 0.0);
    }

    #[test]
    fn test_what_if_earlier_retirement_never_goes_negative() {
        let calculator = PlanningCalculator::new(&Thresholds::default());
        let result = calculator.what_if(
            &household(),
            &WhatIf {
                retirement_age_change: -40,
                ..WhatIf::default()
            },
        );
        assert_eq!(result.months_to_retirement, 0);
        assert_eq!(result.projected_nominal, 500_000.0);
    }

    #[test]
    fn test_what_if_without_history_is_not_applicable() {
        let mut snapshot = household();
        snapshot.transactions.clear();

        let result = PlanningCalculator::new(&Thresholds::default()).what_if(
            &snapshot,
            &WhatIf {
                income_change_pct: -20.0,
                ..WhatIf::default()
            },
        );
        assert!(!result.replacement_ratio.metric.is_applicable());
        assert!(!result.replacement_change.is_applicable());
        assert_eq!(result.monthly_contribution, 0.0);
    }
}
