// 🧾 Ledger Entities - transactions, liabilities and income sources

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION
// ============================================================================

text_enum! {
    pub enum Direction("direction") {
        Debit => "debit",
        Credit => "credit",
    }
}

text_enum! {
    pub enum TransactionType("transaction type") {
        Payroll => "payroll",
        Bonus => "bonus",
        Dividend => "dividend",
        Interest => "interest",
        RentalIncome => "rental_income",
        Contribution => "contribution",
        Transfer => "transfer",
        Mortgage => "mortgage",
        Rent => "rent",
        LoanPayment => "loan_payment",
        Utilities => "utilities",
        Insurance => "insurance",
        Groceries => "groceries",
        Healthcare => "healthcare",
        Transportation => "transportation",
        Childcare => "childcare",
        Dining => "dining",
        Entertainment => "entertainment",
        Shopping => "shopping",
        Travel => "travel",
        Subscription => "subscription",
        Tax => "tax",
        Other => "other",
    }
}

impl TransactionType {
    /// Recurring obligations and necessities that are hard to cut month to
    /// month; these are also what an emergency fund has to keep paying for
    pub fn is_fixed_cost(&self) -> bool {
        matches!(
            self,
            TransactionType::Mortgage
                | TransactionType::Rent
                | TransactionType::LoanPayment
                | TransactionType::Utilities
                | TransactionType::Insurance
                | TransactionType::Childcare
                | TransactionType::Groceries
                | TransactionType::Healthcare
                | TransactionType::Transportation
        )
    }

    pub fn is_essential(&self) -> bool {
        self.is_fixed_cost()
    }

    /// Money moved rather than spent
    pub fn is_savings_or_transfer(&self) -> bool {
        matches!(
            self,
            TransactionType::Contribution | TransactionType::Transfer | TransactionType::Tax
        )
    }

    /// Lifestyle spending that could be cut; income types never count
    pub fn is_discretionary(&self) -> bool {
        matches!(
            self,
            TransactionType::Dining
                | TransactionType::Entertainment
                | TransactionType::Shopping
                | TransactionType::Travel
                | TransactionType::Subscription
                | TransactionType::Other
        )
    }

    /// Keeping a roof overhead; a mortgage is paid off by life cover separately
    pub fn is_housing(&self) -> bool {
        matches!(self, TransactionType::Mortgage | TransactionType::Rent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub client_id: String,
    pub account_id: Option<String>,
    pub date: NaiveDate,

    /// Always non-negative; `direction` carries the sign
    pub amount: f64,

    pub direction: Direction,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    /// Credit into a retirement or brokerage account
    pub fn is_contribution(&self) -> bool {
        self.is_credit() && self.transaction_type == TransactionType::Contribution
    }
}

// ============================================================================
// LIABILITY
// ============================================================================

text_enum! {
    pub enum LiabilityType("liability type") {
        MortgagePrimary => "mortgage_primary",
        MortgageInvestment => "mortgage_investment",
        AutoLoan => "auto_loan",
        StudentLoan => "student_loan",
        CreditCard => "credit_card",
        PersonalLoan => "personal_loan",
        Heloc => "heloc",
        Other => "other",
    }
}

impl LiabilityType {
    pub fn is_high_interest(&self) -> bool {
        matches!(self, LiabilityType::CreditCard | LiabilityType::PersonalLoan)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    pub id: String,
    pub client_id: String,
    pub liability_type: LiabilityType,
    pub balance: f64,

    /// Annual rate in percent
    pub interest_rate: f64,

    /// Minimum monthly payment
    pub minimum_payment: f64,
}

// ============================================================================
// INCOME
// ============================================================================

text_enum! {
    pub enum IncomeType("income type") {
        Salary => "salary",
        Bonus => "bonus",
        Rental => "rental",
        Investment => "investment",
        Other => "other",
    }
}

text_enum! {
    pub enum Frequency("frequency") {
        Weekly => "weekly",
        Biweekly => "biweekly",
        SemiMonthly => "semi_monthly",
        Monthly => "monthly",
        Quarterly => "quarterly",
        Annual => "annual",
        OneTime => "one_time",
    }
}

impl Frequency {
    /// Payments per year; None for one-time income
    pub fn periods_per_year(&self) -> Option<f64> {
        match self {
            Frequency::Weekly => Some(52.0),
            Frequency::Biweekly => Some(26.0),
            Frequency::SemiMonthly => Some(24.0),
            Frequency::Monthly => Some(12.0),
            Frequency::Quarterly => Some(4.0),
            Frequency::Annual => Some(1.0),
            Frequency::OneTime => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub client_id: String,
    pub income_type: IncomeType,
    pub amount: f64,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Income {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| end >= date)
    }

    /// Contribution of this source to gross income for the year ending `as_of`
    pub fn annualized(&self, as_of: NaiveDate) -> f64 {
        match self.frequency.periods_per_year() {
            Some(periods) if self.is_active_on(as_of) => self.amount * periods,
            Some(_) => 0.0,
            None => {
                let year_ago = crate::money::add_years(as_of, -1);
                if self.start_date > year_ago && self.start_date <= as_of {
                    self.amount
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn income(amount: f64, frequency: Frequency, start: NaiveDate, end: Option<NaiveDate>) -> Income {
        Income {
            id: "i1".to_string(),
            client_id: "c1".to_string(),
            income_type: IncomeType::Salary,
            amount,
            frequency,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn test_income_annualized_by_frequency() {
        let as_of = d(2026, 6, 30);
        assert_eq!(income(10_000.0, Frequency::Monthly, d(2020, 1, 1), None).annualized(as_of), 120_000.0);
        assert_eq!(income(2_000.0, Frequency::Biweekly, d(2020, 1, 1), None).annualized(as_of), 52_000.0);
        assert_eq!(income(50_000.0, Frequency::Annual, d(2027, 1, 1), None).annualized(as_of), 0.0);
        assert_eq!(
            income(50_000.0, Frequency::Annual, d(2020, 1, 1), Some(d(2025, 12, 31))).annualized(as_of),
            0.0
        );
    }

    #[test]
    fn test_one_time_income_counts_inside_trailing_year() {
        let as_of = d(2026, 6, 30);
        assert_eq!(income(5_000.0, Frequency::OneTime, d(2026, 2, 1), None).annualized(as_of), 5_000.0);
        assert_eq!(income(5_000.0, Frequency::OneTime, d(2025, 2, 1), None).annualized(as_of), 0.0);
    }

    #[test]
    fn test_transaction_type_buckets() {
        assert!(TransactionType::Mortgage.is_fixed_cost());
        assert!(TransactionType::Groceries.is_essential());
        assert!(!TransactionType::Shopping.is_fixed_cost());
        assert!(TransactionType::Dining.is_discretionary());
        assert!(!TransactionType::Contribution.is_discretionary());
    }

    #[test]
    fn test_income_debits_are_not_discretionary() {
        let income_types = [
            TransactionType::Payroll,
            TransactionType::Bonus,
            TransactionType::Dividend,
            TransactionType::Interest,
            TransactionType::RentalIncome,
        ];
        for kind in income_types {
            assert!(!kind.is_discretionary(), "{} counted as discretionary", kind);
            assert!(!kind.is_fixed_cost());
        }

        let discretionary: Vec<_> = TransactionType::ALL
            .iter()
            .filter(|t| t.is_discretionary())
            .collect();
        assert_eq!(discretionary.len(), 6);
        assert!(discretionary
            .iter()
            .all(|t| !t.is_fixed_cost() && !t.is_savings_or_transfer()));
    }
}
