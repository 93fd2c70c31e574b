// 🏛️ Foundation Calculator - safety net: cash reserves, debt load, insurance
//
// Answers "is the household protected against a shock?" from liquid holdings,
// essential spending history, liabilities and the latest insurance record.

use super::{round2, GradedMetric, SectionHealth};
use crate::config::Thresholds;
use crate::entities::{AccountType, Goal, LiabilityType};
use crate::metric::{CalcError, HealthStatus, Metric};
use crate::money;
use crate::snapshot::ClientSnapshot;
use serde::{Deserialize, Serialize};

/// Real discount rate for future spending in the needs analysis
const NEEDS_DISCOUNT_RATE: f64 = 0.035;
const RETIREMENT_TAX_HAIRCUT: f64 = 0.25;
const REAL_ESTATE_ILLIQUIDITY_DISCOUNT: f64 = 0.30;
/// Spending level once dependents are independent
const POST_DEPENDENT_SPEND_SHARE: f64 = 0.70;
const INDEPENDENCE_AGE: i32 = 18;
const ASSUMED_YOUNGEST_AGE: i32 = 5;

// ============================================================================
// FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyFundFlag {
    Insufficient,
    Building,
    Adequate,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtiBand {
    Healthy,
    Caution,
    Risk,
}

// ============================================================================
// PURE FORMULAS
// ============================================================================

/// Months of essential spending the liquid holdings cover
pub fn emergency_fund_months(liquid_net_worth: f64, monthly_essential: f64) -> Metric {
    Metric::ratio("emergency_fund_months", liquid_net_worth, monthly_essential)
}

pub fn classify_emergency_fund(months: &Metric, thresholds: &Thresholds) -> EmergencyFundFlag {
    match months.value() {
        None => EmergencyFundFlag::NotApplicable,
        Some(m) if m < thresholds.emergency_fund_floor_months => EmergencyFundFlag::Insufficient,
        Some(m) if m >= thresholds.emergency_fund_target_months => EmergencyFundFlag::Adequate,
        Some(_) => EmergencyFundFlag::Building,
    }
}

/// Annualised minimum payments over annual gross income
pub fn debt_to_income(monthly_minimum_payments: f64, annual_income: f64) -> Metric {
    Metric::ratio("debt_to_income", monthly_minimum_payments * 12.0, annual_income)
}

pub fn dti_band(ratio: f64, thresholds: &Thresholds) -> DtiBand {
    if ratio < thresholds.dti_healthy_below {
        DtiBand::Healthy
    } else if ratio <= thresholds.dti_risk_above {
        DtiBand::Caution
    } else {
        DtiBand::Risk
    }
}

/// Life cover over `multiple` years of income; 1.0 means fully covered
pub fn insurance_adequacy(life_coverage: f64, annual_income: f64, multiple: f64) -> Metric {
    Metric::ratio("insurance_adequacy", life_coverage, annual_income * multiple)
}

/// Present value of `years` level annual payments at `rate`
pub fn present_value_annuity(annual: f64, years: u32, rate: f64) -> f64 {
    if years == 0 {
        return 0.0;
    }
    if rate <= 0.0 {
        return annual * years as f64;
    }
    annual * (1.0 - (1.0 + rate).powi(-(years as i32))) / rate
}

pub fn is_education_goal(goal: &Goal) -> bool {
    let name = goal.name.to_lowercase();
    ["college", "education", "university"]
        .iter()
        .any(|keyword| name.contains(keyword))
}

/// Years until the youngest dependent turns 18; 0 without dependents.
///
/// A dependent without a birth date falls back to the latest education goal,
/// then to a five-year-old.
pub fn years_until_independent(snapshot: &ClientSnapshot) -> u32 {
    let fallback = || {
        snapshot
            .goals
            .iter()
            .filter(|g| is_education_goal(g))
            .map(|g| g.target_date)
            .max()
            .map(|latest| money::years_between(snapshot.as_of, latest))
            .unwrap_or(INDEPENDENCE_AGE - ASSUMED_YOUNGEST_AGE)
    };

    snapshot
        .dependents
        .iter()
        .map(|dependent| match dependent.date_of_birth {
            Some(born) => INDEPENDENCE_AGE - money::years_between(born, snapshot.as_of),
            None => fallback(),
        })
        .max()
        .unwrap_or(0)
        .max(0) as u32
}

/// Needs-based life cover: what the household would have to fund, less
/// what it could draw on, never below one year of income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceNeed {
    pub outstanding_debts: f64,
    /// Unfunded part of college and education goals
    pub education_shortfall: f64,
    pub dependent_years: u32,
    /// Years after dependents are independent until retirement
    pub remaining_years: u32,
    /// Present value of non-housing spending until retirement
    pub income_replacement: f64,
    /// Liquid and taxable at 100%, tax-advantaged at 75%, real estate
    /// equity at 70%
    pub discounted_assets: f64,
    pub gross_need: f64,
    pub net_need: f64,
    pub minimum_floor: f64,
    pub total_need: f64,
    pub self_insured: bool,
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationSummary {
    pub liquid_net_worth: f64,
    pub net_worth: f64,
    pub annual_income: f64,
    pub monthly_essential_spend: Metric,

    pub emergency_fund_months: GradedMetric,
    pub emergency_fund_flag: EmergencyFundFlag,

    pub debt_to_income: GradedMetric,
    pub dti_band: Option<DtiBand>,

    pub insurance_adequacy: GradedMetric,
    pub under_insured: Option<bool>,
    pub insurance_need: Option<InsuranceNeed>,
    /// Existing life cover over the needs-based total
    pub needs_based_coverage: GradedMetric,

    pub liquidity_ratio: GradedMetric,
    pub disability_coverage: GradedMetric,
    pub high_interest_debt: f64,

    #[serde(flatten)]
    pub health: SectionHealth,
    pub recommendations: Vec<String>,
    pub issues: Vec<CalcError>,
}

impl FoundationSummary {
    pub fn summary(&self) -> String {
        format!(
            "Foundation: emergency fund {} months ({:?}), DTI {}, insurance {}, score {}",
            self.emergency_fund_months.metric,
            self.emergency_fund_flag,
            self.debt_to_income.metric,
            self.insurance_adequacy.metric,
            self.health
                .overall_score
                .map(|s| format!("{:.0}", s))
                .unwrap_or_else(|| "N/A".to_string())
        )
    }

    pub fn is_protected(&self) -> bool {
        self.emergency_fund_flag == EmergencyFundFlag::Adequate
            && self.under_insured == Some(false)
            && self.dti_band == Some(DtiBand::Healthy)
    }
}

// ============================================================================
// FOUNDATION CALCULATOR
// ============================================================================

pub struct FoundationCalculator {
    thresholds: Thresholds,
}

impl FoundationCalculator {
    pub fn new(thresholds: &Thresholds) -> Self {
        FoundationCalculator {
            thresholds: thresholds.clone(),
        }
    }

    pub fn compute(&self, snapshot: &ClientSnapshot) -> FoundationSummary {
        let t = &self.thresholds;
        let (_, mut issues) = snapshot.valued_holdings();
        let mut recommendations = Vec::new();

        let liquid = snapshot.liquid_net_worth();
        let net_worth = snapshot.net_worth();
        let annual_income = snapshot.annual_income();
        let monthly_income = annual_income / 12.0;

        // Emergency fund
        let totals = snapshot.window_totals(t.trailing_months);
        let monthly_essential = match totals.monthly(totals.essential) {
            Some(v) => Metric::computed(v),
            None => Metric::not_applicable(CalcError::invalid_input(
                "transactions",
                "no transaction history in the trailing window",
            )),
        };
        let ef_months = match monthly_essential.value() {
            Some(spend) => emergency_fund_months(liquid, spend),
            None => Metric::not_applicable(CalcError::division_undefined("emergency_fund_months")),
        };
        let ef_flag = classify_emergency_fund(&ef_months, t);
        let target = t.emergency_fund_target_months;
        let floor = t.emergency_fund_floor_months;
        let emergency_fund = GradedMetric::grade(ef_months, target, |m| {
            if m >= target {
                HealthStatus::Excellent
            } else if m >= target * 2.0 / 3.0 {
                HealthStatus::Good
            } else if m >= floor {
                HealthStatus::Fair
            } else if m >= 1.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if ef_flag == EmergencyFundFlag::Insufficient {
            if let Some(spend) = monthly_essential.value() {
                recommendations.push(format!(
                    "Build emergency fund by ${:.0} to reach the {}-month minimum",
                    floor * spend - liquid,
                    floor
                ));
            }
        }

        // Debt to income
        let monthly_minimums = money::sum(snapshot.liabilities.iter().map(|l| l.minimum_payment));
        let dti = debt_to_income(monthly_minimums, annual_income);
        let band = dti.value().map(|v| dti_band(v, t));
        let dti = GradedMetric::grade(dti, t.dti_risk_above, |v| {
            if v <= 0.20 {
                HealthStatus::Excellent
            } else if v <= 0.35 {
                HealthStatus::Good
            } else if v <= 0.43 {
                HealthStatus::Fair
            } else if v <= 0.50 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if band == Some(DtiBand::Risk) {
            recommendations.push("Focus on paying down debt to improve flexibility".to_string());
        }

        // Life insurance
        let (life_cover, disability_monthly) = match &snapshot.insurance {
            Some(ins) => (ins.life_insurance_coverage, ins.disability_coverage_monthly),
            None => (0.0, 0.0),
        };
        let has_dependents = !snapshot.dependents.is_empty();
        let adequacy = insurance_adequacy(life_cover, annual_income, t.insurance_income_multiple);
        let under_insured = adequacy.value().map(|v| v < 1.0);
        let insurance = GradedMetric::grade(adequacy, 1.0, |v| {
            if v >= 1.0 {
                HealthStatus::Excellent
            } else if v >= 0.8 {
                HealthStatus::Good
            } else if v >= 0.5 {
                HealthStatus::Fair
            } else if v > 0.0 {
                HealthStatus::Poor
            } else if has_dependents {
                HealthStatus::Critical
            } else {
                HealthStatus::Fair
            }
        });
        if under_insured == Some(true) {
            let need = annual_income * t.insurance_income_multiple;
            recommendations.push(format!(
                "Consider increasing life insurance by ${:.0}",
                need - life_cover
            ));
        }

        // Needs-based life cover
        let monthly_non_housing = totals.monthly(totals.consumption() - totals.housing);
        let insurance_need =
            monthly_non_housing.map(|monthly| self.insurance_need(snapshot, monthly * 12.0, annual_income));
        let needs_coverage = match &insurance_need {
            Some(need) => Metric::ratio("needs_based_coverage", life_cover, need.total_need),
            None => Metric::not_applicable(CalcError::invalid_input(
                "transactions",
                "no spending history to project income replacement",
            )),
        };
        let needs_based_coverage = GradedMetric::grade(needs_coverage, 1.0, |v| {
            if v >= 1.0 {
                HealthStatus::Excellent
            } else if v >= 0.8 {
                HealthStatus::Good
            } else if v >= 0.5 {
                HealthStatus::Fair
            } else if v > 0.0 {
                HealthStatus::Poor
            } else if has_dependents {
                HealthStatus::Critical
            } else {
                HealthStatus::Fair
            }
        });
        if let Some(need) = &insurance_need {
            if need.self_insured {
                recommendations.push(format!(
                    "Assets cover the household's needs; keep at least ${:.0} (one year of income) of life cover for bridge costs",
                    need.minimum_floor
                ));
            } else if need.total_need > life_cover {
                recommendations.push(format!(
                    "Needs-based analysis shows a ${:.0} life insurance gap",
                    need.total_need - life_cover
                ));
            }
        }
        let whole_life = snapshot
            .insurance
            .as_ref()
            .map_or(false, |ins| ins.life_insurance_type.eq_ignore_ascii_case("whole"));
        if whole_life && has_dependents {
            recommendations.push("Review whether term cover would buy more protection for the premium".to_string());
        }

        // Liquidity
        let liquidity = if net_worth > 0.0 {
            Metric::ratio("liquidity_ratio", liquid, net_worth)
        } else {
            Metric::not_applicable(CalcError::invalid_input(
                "net_worth",
                format!("net worth is {:.2}; liquidity ratio needs a positive net worth", net_worth),
            ))
        };
        let liquidity = GradedMetric::grade(liquidity, 0.20, |v| {
            if v >= 0.3 {
                HealthStatus::Excellent
            } else if v >= 0.2 {
                HealthStatus::Good
            } else if v >= 0.1 {
                HealthStatus::Fair
            } else if liquid > 0.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });

        // Disability
        let disability = Metric::ratio("disability_coverage", disability_monthly, monthly_income);
        let disability_target = t.disability_target_ratio;
        let disability = GradedMetric::grade(disability, disability_target, |v| {
            if v >= 0.65 {
                HealthStatus::Excellent
            } else if v >= 0.5 {
                HealthStatus::Good
            } else if v >= 0.3 {
                HealthStatus::Fair
            } else if v > 0.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if disability.value().map_or(false, |v| v < disability_target) {
            recommendations.push(format!(
                "Consider additional disability coverage of ${:.0}/month",
                monthly_income * disability_target - disability_monthly
            ));
        }

        let high_interest_debt = snapshot.high_interest_debt();
        if high_interest_debt > 0.0 {
            recommendations.push(format!(
                "Pay down ${:.0} in high-interest debt",
                high_interest_debt
            ));
        }

        if snapshot.insurance.is_none() {
            issues.push(CalcError::invalid_input(
                "insurance",
                "no insurance record; coverage treated as zero",
            ));
        }

        let health = SectionHealth::from_metrics(&[
            &emergency_fund,
            &dti,
            &insurance,
            &needs_based_coverage,
            &liquidity,
            &disability,
        ]);

        tracing::debug!(
            client_id = %snapshot.client.id,
            emergency_fund = %emergency_fund.metric,
            dti = %dti.metric,
            "foundation computed"
        );

        FoundationSummary {
            liquid_net_worth: round2(liquid),
            net_worth: round2(net_worth),
            annual_income: round2(annual_income),
            monthly_essential_spend: monthly_essential,
            emergency_fund_months: emergency_fund,
            emergency_fund_flag: ef_flag,
            debt_to_income: dti,
            dti_band: band,
            insurance_adequacy: insurance,
            under_insured,
            insurance_need,
            needs_based_coverage,
            liquidity_ratio: liquidity,
            disability_coverage: disability,
            high_interest_debt: round2(high_interest_debt),
            health,
            recommendations,
            issues,
        }
    }

    fn insurance_need(
        &self,
        snapshot: &ClientSnapshot,
        annual_non_housing: f64,
        annual_income: f64,
    ) -> InsuranceNeed {
        let outstanding_debts = snapshot.total_liabilities();
        let education_shortfall = money::sum(
            snapshot
                .goals
                .iter()
                .filter(|g| is_education_goal(g))
                .map(|g| (g.target_amount - snapshot.goal_saved(&g.id)).max(0.0)),
        );

        // Full spending while dependents are at home, then a reduced level
        let dependent_years = years_until_independent(snapshot);
        let working_years = (snapshot.client.retirement_age as i32 - snapshot.current_age()).max(0) as u32;
        let remaining_years = working_years.saturating_sub(dependent_years);
        let first = present_value_annuity(annual_non_housing, dependent_years, NEEDS_DISCOUNT_RATE);
        let later = present_value_annuity(
            annual_non_housing * POST_DEPENDENT_SPEND_SHARE,
            remaining_years,
            NEEDS_DISCOUNT_RATE,
        ) / (1.0 + NEEDS_DISCOUNT_RATE).powi(dependent_years as i32);
        let income_replacement = first + later;

        let (valued, _) = snapshot.valued_holdings();
        let real_estate = money::sum(
            valued
                .iter()
                .filter(|v| v.account.account_type == AccountType::RealEstate)
                .map(|v| v.value),
        );
        let investment_mortgages = money::sum(
            snapshot
                .liabilities
                .iter()
                .filter(|l| l.liability_type == LiabilityType::MortgageInvestment)
                .map(|l| l.balance),
        );
        let real_estate_equity =
            (real_estate - investment_mortgages).max(0.0) * (1.0 - REAL_ESTATE_ILLIQUIDITY_DISCOUNT);
        let financial = money::sum(
            valued
                .iter()
                .filter(|v| v.account.account_type != AccountType::RealEstate)
                .map(|v| {
                    if v.account.tax_advantaged {
                        v.value * (1.0 - RETIREMENT_TAX_HAIRCUT)
                    } else {
                        v.value
                    }
                }),
        );
        let discounted_assets = financial + real_estate_equity;

        let gross_need = outstanding_debts + income_replacement + education_shortfall;
        let net_need = gross_need - discounted_assets;
        let minimum_floor = annual_income;

        InsuranceNeed {
            outstanding_debts: round2(outstanding_debts),
            education_shortfall: round2(education_shortfall),
            dependent_years,
            remaining_years,
            income_replacement: round2(income_replacement),
            discounted_assets: round2(discounted_assets),
            gross_need: round2(gross_need),
            net_need: round2(net_need),
            minimum_floor: round2(minimum_floor),
            total_need: round2(net_need.max(minimum_floor)),
            self_insured: net_need <= 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Account, Dependent, Liability};
    use crate::snapshot::fixtures::*;

    #[test]
    fn test_emergency_fund_six_months_is_adequate() {
        let thresholds = Thresholds::default();
        let months = emergency_fund_months(60_000.0, 10_000.0);
        assert_eq!(months.value(), Some(6.0));
        assert_eq!(classify_emergency_fund(&months, &thresholds), EmergencyFundFlag::Adequate);

        let short = emergency_fund_months(20_000.0, 10_000.0);
        assert_eq!(classify_emergency_fund(&short, &thresholds), EmergencyFundFlag::Insufficient);

        let mid = emergency_fund_months(45_000.0, 10_000.0);
        assert_eq!(classify_emergency_fund(&mid, &thresholds), EmergencyFundFlag::Building);

        let none = emergency_fund_months(45_000.0, 0.0);
        assert_eq!(classify_emergency_fund(&none, &thresholds), EmergencyFundFlag::NotApplicable);
    }

    #[test]
    fn test_household_foundation() {
        let summary = FoundationCalculator::new(&Thresholds::default()).compute(&household());

        // 60k liquid over 6k/month essential
        assert_eq!(summary.emergency_fund_months.value(), Some(10.0));
        assert_eq!(summary.emergency_fund_flag, EmergencyFundFlag::Adequate);
        assert_eq!(summary.emergency_fund_months.status, Some(HealthStatus::Excellent));

        // (2500 + 120) × 12 / 180000
        let dti = summary.debt_to_income.value().unwrap();
        assert!((dti - 0.174_666).abs() < 1e-4);
        assert_eq!(summary.dti_band, Some(DtiBand::Healthy));

        // 1M cover vs 1.8M need
        assert_eq!(summary.under_insured, Some(true));
        assert_eq!(summary.high_interest_debt, 4_000.0);

        // 9000 / 15000
        assert_eq!(summary.disability_coverage.value(), Some(0.6));
        assert!(summary.health.overall_score.is_some());
        assert!(summary.issues.is_empty());
        println!("✅ {}", summary.summary());
    }

    #[test]
    fn test_zero_income_is_not_applicable() {
        let mut snapshot = household();
        snapshot.income.clear();

        let summary = FoundationCalculator::new(&Thresholds::default()).compute(&snapshot);
        assert!(!summary.debt_to_income.metric.is_applicable());
        assert_eq!(summary.dti_band, None);
        assert!(!summary.insurance_adequacy.metric.is_applicable());
        assert!(!summary.disability_coverage.metric.is_applicable());
        assert!(matches!(
            summary.debt_to_income.metric.reason(),
            Some(CalcError::DivisionUndefined { .. })
        ));
    }

    #[test]
    fn test_no_history_and_negative_net_worth() {
        let mut snapshot = household();
        snapshot.transactions.clear();
        snapshot.liabilities[0].balance = 900_000.0;

        let summary = FoundationCalculator::new(&Thresholds::default()).compute(&snapshot);
        assert_eq!(summary.emergency_fund_flag, EmergencyFundFlag::NotApplicable);
        assert!(!summary.liquidity_ratio.metric.is_applicable());
        assert!(summary.net_worth < 0.0);
    }

    #[test]
    fn test_household_insurance_need() {
        let summary = FoundationCalculator::new(&Thresholds::default()).compute(&household());
        let need = summary.insurance_need.clone().unwrap();

        assert_eq!(need.outstanding_debts, 354_000.0);
        // 150k college target less 25% of the 190k brokerage account
        assert_eq!(need.education_shortfall, 102_500.0);
        assert_eq!(need.dependent_years, 0);
        assert_eq!(need.remaining_years, 20);

        // 2000/month of dining at 70% for 20 years
        let replacement = present_value_annuity(24_000.0 * 0.7, 20, 0.035);
        assert!((need.income_replacement - replacement).abs() < 0.01);

        // 60k cash + 190k brokerage + 75% of 310k retirement
        assert_eq!(need.discounted_assets, 482_500.0);
        assert!((need.total_need - (354_000.0 + replacement + 102_500.0 - 482_500.0)).abs() < 0.02);
        assert!(!need.self_insured);

        // 1M of cover is well above the need
        assert_eq!(summary.needs_based_coverage.status, Some(HealthStatus::Excellent));
    }

    #[test]
    fn test_dependents_extend_full_spending_phase() {
        let mut snapshot = household();
        snapshot.dependents = vec![
            Dependent {
                id: "dep-1".to_string(),
                client_id: "client-1".to_string(),
                name: "Sam".to_string(),
                date_of_birth: Some(d(2016, 6, 30)),
                relationship: "child".to_string(),
            },
            Dependent {
                id: "dep-2".to_string(),
                client_id: "client-1".to_string(),
                name: "Alex".to_string(),
                date_of_birth: Some(d(2012, 1, 15)),
                relationship: "child".to_string(),
            },
        ];
        assert_eq!(years_until_independent(&snapshot), 8);

        let need = FoundationCalculator::new(&Thresholds::default())
            .compute(&snapshot)
            .insurance_need
            .unwrap();
        assert_eq!(need.dependent_years, 8);
        assert_eq!(need.remaining_years, 12);
        let expected = present_value_annuity(24_000.0, 8, 0.035)
            + present_value_annuity(16_800.0, 12, 0.035) / 1.035f64.powi(8);
        assert!((need.income_replacement - expected).abs() < 0.01);

        // Without a birth date the college goal date decides: ten years out
        snapshot.dependents[0].date_of_birth = None;
        assert_eq!(years_until_independent(&snapshot), 10);
        snapshot.goals.clear();
        assert_eq!(years_until_independent(&snapshot), 13);
    }

    #[test]
    fn test_wealthy_household_is_self_insured() {
        let mut snapshot = household();
        snapshot.holdings.push(holding("h-brok-windfall", "brokerage", "vti", 3_000_000.0));
        if let Some(ins) = snapshot.insurance.as_mut() {
            ins.life_insurance_coverage = 100_000.0;
        }

        let summary = FoundationCalculator::new(&Thresholds::default()).compute(&snapshot);
        let need = summary.insurance_need.clone().unwrap();
        assert!(need.self_insured);
        assert_eq!(need.total_need, 180_000.0);
        // 100k of 180k floor
        assert_eq!(summary.needs_based_coverage.status, Some(HealthStatus::Fair));
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.contains("one year of income")));
    }

    #[test]
    fn test_investment_property_is_discounted() {
        let mut snapshot = household();
        snapshot.accounts.push(Account::new("rental", "Rental Duplex", AccountType::RealEstate));
        snapshot.holdings.push(holding("h-rental", "rental", "cash", 500_000.0));
        snapshot.liabilities.push(Liability {
            id: "rental-mortgage".to_string(),
            client_id: "client-1".to_string(),
            liability_type: LiabilityType::MortgageInvestment,
            balance: 300_000.0,
            interest_rate: 6.5,
            minimum_payment: 0.0,
        });

        let need = FoundationCalculator::new(&Thresholds::default())
            .compute(&snapshot)
            .insurance_need
            .unwrap();
        // (500k - 300k) × 70% on top of the household's 482.5k
        assert_eq!(need.discounted_assets, 622_500.0);
        assert_eq!(need.outstanding_debts, 654_000.0);
    }

    #[test]
    fn test_dti_bands() {
        let t = Thresholds::default();
        assert_eq!(dti_band(0.19, &t), DtiBand::Healthy);
        assert_eq!(dti_band(0.20, &t), DtiBand::Caution);
        assert_eq!(dti_band(0.35, &t), DtiBand::Caution);
        assert_eq!(dti_band(0.36, &t), DtiBand::Risk);
    }
}
