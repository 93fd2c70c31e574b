// 🛡️ Protection & Legacy Entities - insurance, estate planning, documents
//
// Status records: the calculators only check presence, flags and dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCoverage {
    pub id: String,
    pub client_id: String,
    pub life_insurance_coverage: f64,

    /// term, whole, universal, none
    pub life_insurance_type: String,

    pub disability_coverage_monthly: f64,

    /// short_term, long_term, both, none
    pub disability_coverage_type: String,

    pub umbrella_coverage: f64,
    pub long_term_care: bool,
    pub effective_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstatePlanning {
    pub client_id: String,
    pub has_will: bool,
    pub will_last_updated: Option<NaiveDate>,
    pub has_trust: bool,
    pub has_poa_financial: bool,
    pub has_poa_healthcare: bool,
    pub has_healthcare_directive: bool,
    pub beneficiaries_updated: bool,
    pub beneficiaries_last_reviewed: Option<NaiveDate>,
    pub digital_estate_documented: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub client_id: String,

    /// will, trust, poa_financial, poa_healthcare, healthcare_directive,
    /// beneficiary_designation, digital_estate, statement, other
    pub document_type: String,

    pub file_name: String,

    /// SHA-256 of the file content
    pub file_hash: Option<String>,

    pub uploaded_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub relationship: String,
}

/// Latest row of `portfolio_metrics`: trading activity the holdings table
/// cannot show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioActivity {
    pub snapshot_date: NaiveDate,

    /// Percent of the portfolio traded over the last year
    pub annual_turnover: f64,

    pub trades_last_12_months: u32,
}
