// 👤 Client Entity - identity, age inputs and household linkage

use crate::money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum RiskTolerance("risk tolerance") {
        Low => "low",
        Moderate => "moderate",
        High => "high",
        Critical => "critical",
    }
}

impl RiskTolerance {
    /// Percentage points added to the age-based equity target
    pub fn equity_adjustment(&self) -> f64 {
        match self {
            RiskTolerance::Low => -15.0,
            RiskTolerance::Moderate => 0.0,
            RiskTolerance::High => 10.0,
            RiskTolerance::Critical => 15.0,
        }
    }
}

text_enum! {
    pub enum MaritalStatus("marital status") {
        Single => "single",
        Married => "married",
        Divorced => "divorced",
        Widowed => "widowed",
        Partnered => "partnered",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,

    /// Planned retirement age in years
    pub retirement_age: u32,

    pub risk_tolerance: RiskTolerance,
    pub marital_status: MaritalStatus,

    /// Household linkage: a spouse or partner points at the primary client
    pub primary_client_id: Option<String>,
    pub is_primary: bool,

    pub state: Option<String>,
}

impl Client {
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        money::years_between(self.date_of_birth, date)
    }

    /// Date the client reaches `retirement_age`
    pub fn retirement_date(&self) -> NaiveDate {
        money::add_years(self.date_of_birth, self.retirement_age as i32)
    }

    pub fn years_to_retirement(&self, as_of: NaiveDate) -> i32 {
        self.retirement_age as i32 - self.age_on(as_of)
    }
}
