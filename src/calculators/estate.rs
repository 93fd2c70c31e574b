// 📜 Estate Calculator - checklist completeness, staleness, digital assets

use super::{GradedMetric, SectionHealth};
use crate::config::Thresholds;
use crate::entities::{AccountType, AssetClass, EstatePlanning, MaritalStatus, OwnershipType};
use crate::metric::{CalcError, HealthStatus, Metric};
use crate::money;
use crate::snapshot::ClientSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstateItem {
    Will,
    Trust,
    PoaFinancial,
    PoaHealthcare,
    HealthcareDirective,
    BeneficiariesUpdated,
    DigitalEstate,
}

impl EstateItem {
    pub const ALL: [EstateItem; 7] = [
        EstateItem::Will,
        EstateItem::Trust,
        EstateItem::PoaFinancial,
        EstateItem::PoaHealthcare,
        EstateItem::HealthcareDirective,
        EstateItem::BeneficiariesUpdated,
        EstateItem::DigitalEstate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EstateItem::Will => "Will",
            EstateItem::Trust => "Trust",
            EstateItem::PoaFinancial => "Financial POA",
            EstateItem::PoaHealthcare => "Healthcare POA",
            EstateItem::HealthcareDirective => "Healthcare Directive",
            EstateItem::BeneficiariesUpdated => "Beneficiaries Updated",
            EstateItem::DigitalEstate => "Digital Estate",
        }
    }

    /// Document types that evidence the item; empty when no document applies
    pub fn document_types(&self) -> &'static [&'static str] {
        match self {
            EstateItem::Will => &["will"],
            EstateItem::Trust => &["trust"],
            EstateItem::PoaFinancial => &["poa_financial", "power_of_attorney"],
            EstateItem::PoaHealthcare => &["poa_healthcare", "healthcare_proxy"],
            EstateItem::HealthcareDirective => &["healthcare_directive", "living_will"],
            EstateItem::BeneficiariesUpdated | EstateItem::DigitalEstate => &[],
        }
    }

    fn is_done(&self, estate: &EstatePlanning) -> bool {
        match self {
            EstateItem::Will => estate.has_will,
            EstateItem::Trust => estate.has_trust,
            EstateItem::PoaFinancial => estate.has_poa_financial,
            EstateItem::PoaHealthcare => estate.has_poa_healthcare,
            EstateItem::HealthcareDirective => estate.has_healthcare_directive,
            EstateItem::BeneficiariesUpdated => estate.beneficiaries_updated,
            EstateItem::DigitalEstate => estate.digital_estate_documented,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: EstateItem,
    pub applicable: bool,
    pub complete: bool,
    /// None when the item has no supporting document type
    pub documented: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstateSummary {
    pub checklist: Vec<ChecklistItem>,
    /// Complete applicable items / applicable items
    pub completeness: GradedMetric,
    pub trust_applicable: bool,

    pub review_overdue: bool,
    pub stale_items: Vec<String>,
    pub months_since_beneficiary_review: GradedMetric,

    /// Items marked complete with no matching document on file
    pub undocumented: Vec<EstateItem>,

    pub digital_estate: GradedMetric,
    pub crypto_value: f64,
    pub digital_asset_risk: bool,

    /// 0-100, starting at 100 and losing points per titling finding
    pub account_titling: GradedMetric,
    pub titling_findings: Vec<String>,

    #[serde(flatten)]
    pub health: SectionHealth,
    pub recommendations: Vec<String>,
    pub issues: Vec<CalcError>,
}

impl EstateSummary {
    pub fn summary(&self) -> String {
        let done = self.checklist.iter().filter(|c| c.applicable && c.complete).count();
        let applicable = self.checklist.iter().filter(|c| c.applicable).count();
        format!(
            "Estate: {}/{} items complete, review overdue: {}, undocumented: {}, digital asset risk: {}",
            done,
            applicable,
            self.review_overdue,
            self.undocumented.len(),
            self.digital_asset_risk
        )
    }

    pub fn missing(&self) -> Vec<EstateItem> {
        self.checklist
            .iter()
            .filter(|c| c.applicable && !c.complete)
            .map(|c| c.item)
            .collect()
    }
}

// ============================================================================
// ESTATE CALCULATOR
// ============================================================================

pub struct EstateCalculator {
    thresholds: Thresholds,
}

impl EstateCalculator {
    pub fn new(thresholds: &Thresholds) -> Self {
        EstateCalculator {
            thresholds: thresholds.clone(),
        }
    }

    pub fn compute(&self, snapshot: &ClientSnapshot) -> EstateSummary {
        let t = &self.thresholds;
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let estate = match &snapshot.estate {
            Some(estate) => estate.clone(),
            None => {
                issues.push(CalcError::invalid_input(
                    "estate_planning",
                    "no estate planning record; every item counts as missing",
                ));
                EstatePlanning {
                    client_id: snapshot.client.id.clone(),
                    ..EstatePlanning::default()
                }
            }
        };

        let net_worth = snapshot.net_worth();
        let trust_applicable = estate.has_trust || net_worth >= t.trust_net_worth_threshold;

        let has_document = |types: &[&str]| {
            snapshot
                .documents
                .iter()
                .any(|d| types.iter().any(|ty| d.document_type.eq_ignore_ascii_case(ty)))
        };

        let checklist: Vec<ChecklistItem> = EstateItem::ALL
            .iter()
            .map(|item| {
                let types = item.document_types();
                ChecklistItem {
                    item: *item,
                    applicable: *item != EstateItem::Trust || trust_applicable,
                    complete: item.is_done(&estate),
                    documented: if types.is_empty() { None } else { Some(has_document(types)) },
                }
            })
            .collect();

        let applicable = checklist.iter().filter(|c| c.applicable).count();
        let done = checklist.iter().filter(|c| c.applicable && c.complete).count();
        let completeness = GradedMetric::grade(
            Metric::ratio("estate_completeness", done as f64, applicable as f64),
            0.85,
            |ratio| {
                let score = ratio * 100.0;
                if score >= 85.0 {
                    HealthStatus::Excellent
                } else if score >= 70.0 {
                    HealthStatus::Good
                } else if score >= 50.0 {
                    HealthStatus::Fair
                } else if score >= 25.0 {
                    HealthStatus::Poor
                } else {
                    HealthStatus::Critical
                }
            },
        );

        for missing in checklist.iter().filter(|c| c.applicable && !c.complete) {
            let advice = match missing.item {
                EstateItem::Will => "Create a will for asset distribution".to_string(),
                EstateItem::Trust => "Consider establishing a trust".to_string(),
                EstateItem::PoaFinancial => "Establish financial power of attorney".to_string(),
                EstateItem::HealthcareDirective => "Create a healthcare directive".to_string(),
                EstateItem::BeneficiariesUpdated => "Review and update all account beneficiaries".to_string(),
                other => format!("Complete: {}", other.label()),
            };
            recommendations.push(advice);
        }

        let undocumented: Vec<EstateItem> = checklist
            .iter()
            .filter(|c| c.complete && c.documented == Some(false))
            .map(|c| c.item)
            .collect();
        if !undocumented.is_empty() {
            let labels: Vec<&str> = undocumented.iter().map(|i| i.label()).collect();
            recommendations.push(format!("Upload copies of: {}", labels.join(", ")));
        }

        // Staleness, month granularity
        let window_months = t.staleness_years as i32 * 12;
        let mut stale_items = Vec::new();
        if let Some(updated) = estate.will_last_updated.filter(|_| estate.has_will) {
            let age = money::months_between(updated, snapshot.as_of);
            if age > window_months {
                stale_items.push(format!("will last updated {} months ago", age));
            }
        }
        let beneficiary_age = estate
            .beneficiaries_last_reviewed
            .map(|reviewed| money::months_between(reviewed, snapshot.as_of));
        if let Some(age) = beneficiary_age {
            if age > window_months {
                stale_items.push(format!("beneficiaries last reviewed {} months ago", age));
            }
        }
        let review_overdue = !stale_items.is_empty();
        if review_overdue {
            recommendations.push(format!("Review estate documents: {}", stale_items.join("; ")));
        }

        let beneficiary_review = match beneficiary_age {
            Some(age) => Metric::computed(age as f64),
            None => Metric::not_applicable(CalcError::invalid_input(
                "beneficiaries_last_reviewed",
                "no beneficiary review on record",
            )),
        };
        let beneficiary_review = GradedMetric::grade(beneficiary_review, 12.0, |months| {
            if !estate.beneficiaries_updated {
                HealthStatus::Critical
            } else if months <= 12.0 {
                HealthStatus::Excellent
            } else if months <= 24.0 {
                HealthStatus::Good
            } else if months <= 36.0 {
                HealthStatus::Fair
            } else {
                HealthStatus::Poor
            }
        });

        // Digital assets
        let (valued, _) = snapshot.valued_holdings();
        let crypto_value = money::sum(
            valued
                .iter()
                .filter(|v| v.security.map_or(false, |s| s.asset_class() == AssetClass::Crypto))
                .map(|v| v.value),
        );
        let digital_asset_risk = crypto_value > 0.0 && !estate.digital_estate_documented;
        if digital_asset_risk {
            recommendations.insert(
                0,
                format!("URGENT: ${:.0} in crypto requires documented access", crypto_value),
            );
        }
        let digital_estate = GradedMetric::grade(
            Metric::computed(if estate.digital_estate_documented { 100.0 } else { 0.0 }),
            100.0,
            |score| {
                if score >= 100.0 {
                    HealthStatus::Excellent
                } else if digital_asset_risk {
                    HealthStatus::Critical
                } else {
                    HealthStatus::Poor
                }
            },
        );

        let (titling_score, titling_findings) = self.review_titling(snapshot, &estate, &mut issues);
        let account_titling = GradedMetric::grade(Metric::computed(titling_score), 85.0, |score| {
            if score >= 85.0 {
                HealthStatus::Excellent
            } else if score >= 70.0 {
                HealthStatus::Good
            } else if score >= 50.0 {
                HealthStatus::Fair
            } else {
                HealthStatus::Poor
            }
        });
        recommendations.extend(titling_findings.iter().cloned());

        let health = SectionHealth::from_metrics(&[
            &completeness,
            &beneficiary_review,
            &digital_estate,
            &account_titling,
        ]);

        tracing::debug!(
            client_id = %snapshot.client.id,
            complete = done,
            applicable,
            review_overdue,
            "estate computed"
        );

        EstateSummary {
            checklist,
            completeness,
            trust_applicable,
            review_overdue,
            stale_items,
            months_since_beneficiary_review: beneficiary_review,
            undocumented,
            digital_estate,
            crypto_value,
            digital_asset_risk,
            account_titling,
            titling_findings,
            health,
            recommendations,
            issues,
        }
    }

    /// Titling score and findings from how each account is owned
    fn review_titling(
        &self,
        snapshot: &ClientSnapshot,
        estate: &EstatePlanning,
        issues: &mut Vec<CalcError>,
    ) -> (f64, Vec<String>) {
        let mut findings = Vec::new();
        let mut score: f64 = 100.0;

        let ownership = |account_id: &str| -> Vec<OwnershipType> {
            snapshot
                .owners
                .iter()
                .filter(|o| o.account_id == account_id)
                .map(|o| o.ownership_type)
                .collect()
        };

        let mut outside_trust = Vec::new();
        let mut real_estate_outside_trust = Vec::new();
        let mut individual_brokerage = Vec::new();
        let mut joint_accounts = Vec::new();
        let mut trust_funded = false;

        for account in &snapshot.accounts {
            let owned = ownership(&account.id);
            if owned.is_empty() {
                issues.push(CalcError::referential_gap(
                    format!("account {}", account.id),
                    "account owner",
                ));
                continue;
            }
            let value = snapshot.account_value(&account.id);
            let in_trust = owned.contains(&OwnershipType::Trust);
            trust_funded |= in_trust;

            if owned.contains(&OwnershipType::Joint) {
                joint_accounts.push(account.name.as_str());
            }
            if in_trust {
                continue;
            }
            if account.account_type == AccountType::RealEstate {
                real_estate_outside_trust.push(value);
            } else if account.is_taxable() {
                outside_trust.push(value);
                if account.account_type == AccountType::Brokerage && !owned.contains(&OwnershipType::Joint) {
                    individual_brokerage.push(value);
                }
            }
        }

        let taxable = money::sum(outside_trust);
        if taxable > 100_000.0 && !estate.has_trust {
            findings.push(format!(
                "${:.0} in taxable accounts passes through probate; consider trust or TOD titling",
                taxable
            ));
            score -= 20.0;
        }

        let property = money::sum(real_estate_outside_trust);
        if property > 500_000.0 && !estate.has_trust {
            findings.push("Consider titling real estate to a trust to avoid probate".to_string());
            score -= 20.0;
        }

        if estate.has_trust && !trust_funded && !snapshot.accounts.is_empty() {
            findings.push("A trust exists but no account is titled to it; fund the trust".to_string());
            score -= 20.0;
        }

        match snapshot.client.marital_status {
            MaritalStatus::Married | MaritalStatus::Partnered => {
                let individual = money::sum(individual_brokerage);
                if individual > 250_000.0 {
                    findings.push(
                        "Review joint vs individual titling of brokerage accounts".to_string(),
                    );
                    score -= 10.0;
                }
            }
            _ => {
                if !joint_accounts.is_empty() {
                    findings.push(format!(
                        "Joint titling without a spouse on {}; confirm survivorship intent",
                        joint_accounts.join(", ")
                    ));
                    score -= 10.0;
                }
            }
        }

        (score.max(0.0), findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SecurityType;
    use crate::snapshot::fixtures::*;

    fn compute(snapshot: &ClientSnapshot) -> EstateSummary {
        EstateCalculator::new(&Thresholds::default()).compute(snapshot)
    }

    #[test]
    fn test_household_estate() {
        let summary = compute(&household());

        assert!(!summary.trust_applicable);
        assert!((summary.completeness.value().unwrap() - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(summary.completeness.status, Some(HealthStatus::Good));
        assert_eq!(summary.missing(), vec![EstateItem::DigitalEstate]);

        assert!(!summary.review_overdue);
        assert_eq!(summary.months_since_beneficiary_review.value(), Some(7.0));
        assert_eq!(
            summary.undocumented,
            vec![
                EstateItem::PoaFinancial,
                EstateItem::PoaHealthcare,
                EstateItem::HealthcareDirective
            ]
        );
        assert!(!summary.digital_asset_risk);
        println!("✅ {}", summary.summary());
    }

    #[test]
    fn test_trust_applies_above_net_worth_threshold() {
        let mut snapshot = household();
        snapshot.holdings.push(holding("h-big", "brokerage", "vti", 1_000_000.0));

        let summary = compute(&snapshot);
        assert!(summary.trust_applicable);
        assert!((summary.completeness.value().unwrap() - 5.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_existing_trust_always_counts() {
        let mut snapshot = household();
        if let Some(estate) = snapshot.estate.as_mut() {
            estate.has_trust = true;
        }

        let summary = compute(&snapshot);
        assert!(summary.trust_applicable);
        assert!((summary.completeness.value().unwrap() - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_stale_will_is_overdue_regardless_of_completeness() {
        let mut snapshot = household();
        if let Some(estate) = snapshot.estate.as_mut() {
            estate.will_last_updated = Some(d(2022, 1, 15));
            estate.digital_estate_documented = true;
        }

        let summary = compute(&snapshot);
        assert_eq!(summary.completeness.value(), Some(1.0));
        assert!(summary.review_overdue);
        assert_eq!(summary.stale_items.len(), 1);

        // 53 months fits inside a five year window
        let relaxed = EstateCalculator::new(&Thresholds::default().with_staleness_years(5)).compute(&snapshot);
        assert!(!relaxed.review_overdue);
    }

    #[test]
    fn test_missing_record_means_nothing_done() {
        let mut snapshot = household();
        snapshot.estate = None;

        let summary = compute(&snapshot);
        assert_eq!(summary.completeness.value(), Some(0.0));
        assert_eq!(summary.completeness.status, Some(HealthStatus::Critical));
        assert!(summary.undocumented.is_empty());
        assert_eq!(summary.issues.len(), 1);
    }

    fn set_ownership(snapshot: &mut ClientSnapshot, account_id: &str, ownership: OwnershipType) {
        for owner in snapshot.owners.iter_mut().filter(|o| o.account_id == account_id) {
            owner.ownership_type = ownership;
        }
    }

    #[test]
    fn test_household_titling() {
        let summary = compute(&household());

        // 250k of cash and brokerage held individually with no trust
        assert_eq!(summary.account_titling.value(), Some(80.0));
        assert_eq!(summary.account_titling.status, Some(HealthStatus::Good));
        assert_eq!(summary.titling_findings.len(), 1);
        assert!(summary.titling_findings[0].contains("probate"));
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn test_trust_without_titled_accounts_is_unfunded() {
        let mut snapshot = household();
        if let Some(estate) = snapshot.estate.as_mut() {
            estate.has_trust = true;
        }
        let summary = compute(&snapshot);
        assert_eq!(summary.account_titling.value(), Some(80.0));
        assert!(summary.titling_findings[0].contains("fund the trust"));

        set_ownership(&mut snapshot, "brokerage", OwnershipType::Trust);
        let summary = compute(&snapshot);
        assert_eq!(summary.account_titling.value(), Some(100.0));
        assert!(summary.titling_findings.is_empty());
    }

    #[test]
    fn test_joint_titling_depends_on_marital_status() {
        let mut snapshot = household();
        snapshot.holdings.push(holding("h-brok-more", "brokerage", "vti", 100_000.0));
        if let Some(estate) = snapshot.estate.as_mut() {
            estate.has_trust = true;
        }
        set_ownership(&mut snapshot, "401k", OwnershipType::Trust);

        // Married with 290k of individually titled brokerage
        let summary = compute(&snapshot);
        assert_eq!(summary.account_titling.value(), Some(90.0));
        assert!(summary.titling_findings[0].contains("joint vs individual"));

        set_ownership(&mut snapshot, "brokerage", OwnershipType::Joint);
        assert_eq!(compute(&snapshot).account_titling.value(), Some(100.0));

        snapshot.client.marital_status = MaritalStatus::Single;
        let summary = compute(&snapshot);
        assert_eq!(summary.account_titling.value(), Some(90.0));
        assert!(summary.titling_findings[0].contains("Taxable Brokerage"));
    }

    #[test]
    fn test_account_without_owner_is_a_gap() {
        let mut snapshot = household();
        snapshot.owners.retain(|o| o.account_id != "savings");

        let summary = compute(&snapshot);
        assert_eq!(summary.issues.len(), 1);
        assert!(matches!(summary.issues[0], CalcError::ReferentialGap { .. }));
        // 205k still taxable outside a trust
        assert_eq!(summary.account_titling.value(), Some(80.0));
    }

    #[test]
    fn test_undocumented_crypto_is_flagged() {
        let mut snapshot = household();
        snapshot
            .securities
            .push(security("btc", "Bitcoin", SecurityType::Crypto, None));
        snapshot.holdings.push(holding("h-btc", "brokerage", "btc", 25_000.0));

        let summary = compute(&snapshot);
        assert_eq!(summary.crypto_value, 25_000.0);
        assert!(summary.digital_asset_risk);
        assert_eq!(summary.digital_estate.status, Some(HealthStatus::Critical));
        assert!(summary.recommendations[0].starts_with("URGENT"));
    }
}
