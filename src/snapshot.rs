// 📸 Client Snapshot - everything one calculation pass may read
//
// Built once per request (usually by `db::load_snapshot`) and passed by
// reference into every calculator. Nothing in here is mutated while the
// calculators run.

use crate::entities::{
    Account, AccountOwner, Client, Dependent, Document, EstatePlanning, Goal, GoalAllocation,
    Holding, Income, InsuranceCoverage, Liability, PortfolioActivity, Security, Transaction,
};
use crate::metric::CalcError;
use crate::money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// PRICE BOOK
// ============================================================================

/// Per-unit prices keyed by security id.
///
/// Empty unless a caller supplies prices; holdings without a price are
/// valued at cost basis, which is an approximation of market value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBook {
    prices: BTreeMap<String, f64>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, security_id: &str, price: f64) {
        self.prices.insert(security_id.to_string(), price);
    }

    pub fn get(&self, security_id: &str) -> Option<f64> {
        self.prices.get(security_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Prices in security id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices.iter().map(|(id, price)| (id.as_str(), *price))
    }
}

/// A usable per-unit price or amount: finite and not negative
fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBasis {
    /// Every holding valued at cost basis
    CostBasis,
    /// At least one holding valued from a supplied price
    Mixed,
}

// ============================================================================
// TRAILING WINDOW
// ============================================================================

/// The `months` calendar months ending with the as-of month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    pub as_of: NaiveDate,
    pub months: u32,
}

impl TrailingWindow {
    pub fn new(as_of: NaiveDate, months: u32) -> Self {
        TrailingWindow { as_of, months }
    }

    /// 0 for the as-of month, 1 for the month before, ...; None outside
    pub fn month_offset(&self, date: NaiveDate) -> Option<u32> {
        if date > self.as_of {
            return None;
        }
        let back = money::months_between(date, self.as_of);
        if back >= 0 && (back as u32) < self.months {
            Some(back as u32)
        } else {
            None
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.month_offset(date).is_some()
    }
}

/// Transaction totals over a trailing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    /// Months from the earliest in-window transaction through the as-of month
    pub months_covered: u32,
    pub contributions: f64,
    pub fixed_costs: f64,
    pub discretionary: f64,
    pub essential: f64,
    /// Mortgage and rent, part of fixed costs
    pub housing: f64,
}

impl WindowTotals {
    pub fn consumption(&self) -> f64 {
        self.fixed_costs + self.discretionary
    }

    /// Total divided by months covered; None without history
    pub fn monthly(&self, total: f64) -> Option<f64> {
        if self.months_covered == 0 {
            None
        } else {
            Some(total / self.months_covered as f64)
        }
    }
}

// ============================================================================
// VALUED HOLDING
// ============================================================================

#[derive(Debug, Clone)]
pub struct ValuedHolding<'a> {
    pub holding: &'a Holding,
    pub account: &'a Account,
    pub security: Option<&'a Security>,
    pub value: f64,
}

// ============================================================================
// CLIENT SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub as_of: NaiveDate,
    pub client: Client,
    pub accounts: Vec<Account>,
    pub owners: Vec<AccountOwner>,
    pub securities: Vec<Security>,
    pub holdings: Vec<Holding>,
    pub transactions: Vec<Transaction>,
    pub liabilities: Vec<Liability>,
    pub income: Vec<Income>,
    pub goals: Vec<Goal>,
    pub goal_allocations: Vec<GoalAllocation>,
    pub insurance: Option<InsuranceCoverage>,
    pub estate: Option<EstatePlanning>,
    pub documents: Vec<Document>,
    pub dependents: Vec<Dependent>,
    pub portfolio_activity: Option<PortfolioActivity>,
    pub prices: PriceBook,
}

impl ClientSnapshot {
    /// Empty snapshot for a client; callers fill in the record lists
    pub fn new(client: Client, as_of: NaiveDate) -> Self {
        ClientSnapshot {
            as_of,
            client,
            accounts: Vec::new(),
            owners: Vec::new(),
            securities: Vec::new(),
            holdings: Vec::new(),
            transactions: Vec::new(),
            liabilities: Vec::new(),
            income: Vec::new(),
            goals: Vec::new(),
            goal_allocations: Vec::new(),
            insurance: None,
            estate: None,
            documents: Vec::new(),
            dependents: Vec::new(),
            portfolio_activity: None,
            prices: PriceBook::new(),
        }
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn security(&self, id: &str) -> Option<&Security> {
        self.securities.iter().find(|s| s.id == id)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn current_age(&self) -> i32 {
        self.client.age_on(self.as_of)
    }

    // ------------------------------------------------------------------------
    // Valuation
    // ------------------------------------------------------------------------

    pub fn holding_value(&self, holding: &Holding) -> f64 {
        holding.value(self.prices.get(&holding.security_id))
    }

    pub fn valuation_basis(&self) -> ValuationBasis {
        let priced = self
            .holdings
            .iter()
            .any(|h| self.prices.get(&h.security_id).is_some());
        if priced {
            ValuationBasis::Mixed
        } else {
            ValuationBasis::CostBasis
        }
    }

    /// Why a holding cannot be valued: bad amounts or a bad supplied price
    fn unusable_holding(&self, holding: &Holding) -> Option<CalcError> {
        if !is_valid_amount(holding.quantity) || !is_valid_amount(holding.cost_basis) {
            return Some(CalcError::invalid_input(
                "holding",
                format!(
                    "holding {} needs a finite, non-negative quantity and cost basis",
                    holding.id
                ),
            ));
        }
        match self.prices.get(&holding.security_id) {
            Some(price) if !is_valid_amount(price) => Some(CalcError::invalid_input(
                "price",
                format!("security {} has an unusable price {}", holding.security_id, price),
            )),
            _ => None,
        }
    }

    /// Holdings resolved against their account, with recoverable problems.
    ///
    /// A holding whose account is missing, whose amounts are negative or not
    /// finite, or whose price is unusable is left out and reported. A missing
    /// security is kept (`security: None`) so account-level totals stay
    /// complete.
    pub fn valued_holdings(&self) -> (Vec<ValuedHolding<'_>>, Vec<CalcError>) {
        let mut valued = Vec::with_capacity(self.holdings.len());
        let mut issues = Vec::new();

        for holding in &self.holdings {
            let account = match self.account(&holding.account_id) {
                Some(account) => account,
                None => {
                    issues.push(CalcError::referential_gap(
                        format!("holding {}", holding.id),
                        format!("account {}", holding.account_id),
                    ));
                    continue;
                }
            };

            if let Some(problem) = self.unusable_holding(holding) {
                issues.push(problem);
                continue;
            }

            let security = self.security(&holding.security_id);
            if security.is_none() {
                issues.push(CalcError::referential_gap(
                    format!("holding {}", holding.id),
                    format!("security {}", holding.security_id),
                ));
            }

            valued.push(ValuedHolding {
                holding,
                account,
                security,
                value: self.holding_value(holding),
            });
        }

        (valued, issues)
    }

    pub fn account_value(&self, account_id: &str) -> f64 {
        money::sum(
            self.holdings
                .iter()
                .filter(|h| h.account_id == account_id)
                .filter(|h| self.unusable_holding(h).is_none())
                .map(|h| self.holding_value(h)),
        )
    }

    /// Share of allocated account value earmarked for a goal; allocations
    /// to unknown accounts contribute nothing
    pub fn goal_saved(&self, goal_id: &str) -> f64 {
        money::sum(
            self.goal_allocations
                .iter()
                .filter(|a| a.goal_id == goal_id)
                .filter(|a| self.account(&a.account_id).is_some())
                .map(|a| self.account_value(&a.account_id) * a.allocation_percentage / 100.0),
        )
    }

    pub fn total_assets(&self) -> f64 {
        let (valued, _) = self.valued_holdings();
        money::sum(valued.iter().map(|v| v.value))
    }

    /// Sum of holdings in accounts flagged `is_liquid`
    pub fn liquid_net_worth(&self) -> f64 {
        let (valued, _) = self.valued_holdings();
        money::sum(valued.iter().filter(|v| v.account.is_liquid).map(|v| v.value))
    }

    /// Holdings in accounts meant for long-term growth
    pub fn invested_assets(&self) -> f64 {
        let (valued, _) = self.valued_holdings();
        money::sum(valued.iter().filter(|v| v.account.is_invested()).map(|v| v.value))
    }

    pub fn total_liabilities(&self) -> f64 {
        money::sum(self.liabilities.iter().map(|l| l.balance))
    }

    pub fn high_interest_debt(&self) -> f64 {
        money::sum(
            self.liabilities
                .iter()
                .filter(|l| l.liability_type.is_high_interest())
                .map(|l| l.balance),
        )
    }

    pub fn net_worth(&self) -> f64 {
        self.total_assets() - self.total_liabilities()
    }

    // ------------------------------------------------------------------------
    // Income and cash flow
    // ------------------------------------------------------------------------

    pub fn annual_income(&self) -> f64 {
        money::sum(self.income.iter().map(|i| i.annualized(self.as_of)))
    }

    pub fn monthly_income(&self) -> f64 {
        self.annual_income() / 12.0
    }

    pub fn window(&self, months: u32) -> TrailingWindow {
        TrailingWindow::new(self.as_of, months)
    }

    pub fn transactions_in(&self, window: TrailingWindow) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| window.contains(t.date))
    }

    pub fn window_totals(&self, months: u32) -> WindowTotals {
        let window = self.window(months);

        let months_covered = self
            .transactions_in(window)
            .filter_map(|t| window.month_offset(t.date))
            .max()
            .map(|oldest| oldest + 1)
            .unwrap_or(0);

        let debits = || self.transactions_in(window).filter(|t| t.is_debit());

        WindowTotals {
            months_covered,
            contributions: money::sum(
                self.transactions_in(window)
                    .filter(|t| t.is_contribution())
                    .map(|t| t.amount),
            ),
            fixed_costs: money::sum(
                debits()
                    .filter(|t| t.transaction_type.is_fixed_cost())
                    .map(|t| t.amount),
            ),
            discretionary: money::sum(
                debits()
                    .filter(|t| t.transaction_type.is_discretionary())
                    .map(|t| t.amount),
            ),
            essential: money::sum(
                debits()
                    .filter(|t| t.transaction_type.is_essential())
                    .map(|t| t.amount),
            ),
            housing: money::sum(
                debits()
                    .filter(|t| t.transaction_type.is_housing())
                    .map(|t| t.amount),
            ),
        }
    }

    /// Stable SHA-256 over the serialised snapshot
    pub fn fingerprint(&self) -> String {
        // Plain data with string map keys; serialisation does not fail
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::entities::*;

    pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub fn as_of() -> NaiveDate {
        d(2026, 6, 30)
    }

    pub fn client() -> Client {
        Client {
            id: "client-1".to_string(),
            name: "Jordan Rivera".to_string(),
            date_of_birth: d(1981, 3, 10),
            retirement_age: 65,
            risk_tolerance: RiskTolerance::Moderate,
            marital_status: MaritalStatus::Married,
            primary_client_id: None,
            is_primary: true,
            state: Some("CA".to_string()),
        }
    }

    pub fn security(
        id: &str,
        name: &str,
        security_type: SecurityType,
        expense_ratio: Option<f64>,
    ) -> Security {
        Security {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            name: name.to_string(),
            security_type,
            expense_ratio,
        }
    }

    pub fn holding(id: &str, account_id: &str, security_id: &str, cost_basis: f64) -> Holding {
        Holding {
            id: id.to_string(),
            account_id: account_id.to_string(),
            security_id: security_id.to_string(),
            quantity: cost_basis / 100.0,
            cost_basis,
            as_of_date: as_of(),
        }
    }

    pub fn tx(
        id: &str,
        date: NaiveDate,
        amount: f64,
        direction: Direction,
        transaction_type: TransactionType,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            client_id: "client-1".to_string(),
            account_id: None,
            date,
            amount,
            direction,
            transaction_type,
            description: None,
        }
    }

    pub fn salary(annual: f64) -> Income {
        Income {
            id: "income-1".to_string(),
            client_id: "client-1".to_string(),
            income_type: IncomeType::Salary,
            amount: annual,
            frequency: Frequency::Annual,
            start_date: d(2015, 1, 1),
            end_date: None,
        }
    }

    /// Twelve identical months of household cash flow ending June 2026
    pub fn monthly_ledger(
        fixed: f64,
        discretionary: f64,
        contribution: f64,
    ) -> Vec<Transaction> {
        let mut txs = Vec::new();
        for back in 0..12u32 {
            let month = 6 + 12 - back;
            let (year, month) = if month > 12 { (2026, month - 12) } else { (2025, month) };
            let date = d(year, month, 15);
            txs.push(tx(&format!("fix-{}", back), date, fixed, Direction::Debit, TransactionType::Mortgage));
            txs.push(tx(&format!("disc-{}", back), date, discretionary, Direction::Debit, TransactionType::Dining));
            txs.push(tx(&format!("sav-{}", back), date, contribution, Direction::Credit, TransactionType::Contribution));
        }
        txs
    }

    /// A household with cash, a brokerage account and retirement accounts
    pub fn household() -> ClientSnapshot {
        let mut snapshot = ClientSnapshot::new(client(), as_of());

        snapshot.accounts = vec![
            Account::new("checking", "Everyday Checking", AccountType::Checking),
            Account::new("savings", "High Yield Savings", AccountType::Savings),
            Account::new("brokerage", "Taxable Brokerage", AccountType::Brokerage),
            Account::new("401k", "Employer 401(k)", AccountType::Retirement401k),
            Account::new("roth", "Roth IRA", AccountType::RothIra),
        ];
        snapshot.owners = snapshot
            .accounts
            .iter()
            .map(|a| AccountOwner {
                account_id: a.id.clone(),
                client_id: "client-1".to_string(),
                ownership_type: OwnershipType::Individual,
            })
            .collect();

        snapshot.securities = vec![
            security("cash", "Cash Sweep", SecurityType::Cash, None),
            security("vti", "Vanguard Total Stock Market ETF", SecurityType::Etf, Some(0.03)),
            security("bnd", "Vanguard Total Bond Market ETF", SecurityType::Etf, Some(0.035)),
            security("aapl", "Apple Inc.", SecurityType::Stock, None),
            security("active", "Active Growth Fund", SecurityType::MutualFund, Some(0.85)),
        ];

        snapshot.holdings = vec![
            holding("h-checking", "checking", "cash", 15_000.0),
            holding("h-savings", "savings", "cash", 45_000.0),
            holding("h-brok-vti", "brokerage", "vti", 120_000.0),
            holding("h-brok-bnd", "brokerage", "bnd", 40_000.0),
            holding("h-brok-aapl", "brokerage", "aapl", 30_000.0),
            holding("h-401k-vti", "401k", "vti", 200_000.0),
            holding("h-401k-active", "401k", "active", 50_000.0),
            holding("h-roth-vti", "roth", "vti", 60_000.0),
        ];

        snapshot.income = vec![salary(180_000.0)];

        snapshot.liabilities = vec![
            Liability {
                id: "mortgage".to_string(),
                client_id: "client-1".to_string(),
                liability_type: LiabilityType::MortgagePrimary,
                balance: 350_000.0,
                interest_rate: 3.25,
                minimum_payment: 2_500.0,
            },
            Liability {
                id: "card".to_string(),
                client_id: "client-1".to_string(),
                liability_type: LiabilityType::CreditCard,
                balance: 4_000.0,
                interest_rate: 22.9,
                minimum_payment: 120.0,
            },
        ];

        snapshot.transactions = monthly_ledger(6_000.0, 2_000.0, 2_500.0);

        snapshot.goals = vec![Goal {
            id: "goal-college".to_string(),
            client_id: "client-1".to_string(),
            name: "College Fund".to_string(),
            target_amount: 150_000.0,
            target_date: d(2036, 6, 30),
            priority: 1,
            monthly_contribution: 500.0,
        }];
        snapshot.goal_allocations = vec![GoalAllocation {
            goal_id: "goal-college".to_string(),
            account_id: "brokerage".to_string(),
            allocation_percentage: 25.0,
        }];

        snapshot.insurance = Some(InsuranceCoverage {
            id: "ins-1".to_string(),
            client_id: "client-1".to_string(),
            life_insurance_coverage: 1_000_000.0,
            life_insurance_type: "term".to_string(),
            disability_coverage_monthly: 9_000.0,
            disability_coverage_type: "long_term".to_string(),
            umbrella_coverage: 1_000_000.0,
            long_term_care: false,
            effective_date: d(2024, 1, 1),
        });

        snapshot.estate = Some(EstatePlanning {
            client_id: "client-1".to_string(),
            has_will: true,
            will_last_updated: Some(d(2024, 9, 1)),
            has_trust: false,
            has_poa_financial: true,
            has_poa_healthcare: true,
            has_healthcare_directive: true,
            beneficiaries_updated: true,
            beneficiaries_last_reviewed: Some(d(2025, 11, 1)),
            digital_estate_documented: false,
        });

        snapshot.documents = vec![Document {
            id: "doc-will".to_string(),
            client_id: "client-1".to_string(),
            document_type: "will".to_string(),
            file_name: "will-2024.pdf".to_string(),
            file_hash: None,
            uploaded_on: d(2024, 9, 2),
        }];

        snapshot.portfolio_activity = Some(PortfolioActivity {
            snapshot_date: d(2026, 6, 1),
            annual_turnover: 15.0,
            trades_last_12_months: 8,
        });

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::entities::{Direction, TransactionType};

    #[test]
    fn test_liquid_net_worth_counts_liquid_accounts_only() {
        let snapshot = household();
        assert_eq!(snapshot.liquid_net_worth(), 60_000.0);
        assert_eq!(snapshot.total_assets(), 560_000.0);
        assert_eq!(snapshot.invested_assets(), 500_000.0);
        assert_eq!(snapshot.total_liabilities(), 354_000.0);
        assert_eq!(snapshot.net_worth(), 206_000.0);
    }

    #[test]
    fn test_price_book_overrides_cost_basis() {
        let mut snapshot = household();
        assert_eq!(snapshot.valuation_basis(), ValuationBasis::CostBasis);

        // h-brok-aapl holds 300 shares bought at 100
        snapshot.prices.set("aapl", 150.0);
        assert_eq!(snapshot.valuation_basis(), ValuationBasis::Mixed);
        assert_eq!(snapshot.account_value("brokerage"), 205_000.0);
    }

    #[test]
    fn test_valued_holdings_reports_gaps() {
        let mut snapshot = household();
        snapshot.holdings.push(holding("orphan", "closed-account", "vti", 1_000.0));
        snapshot.holdings.push(holding("mystery", "brokerage", "delisted", 2_000.0));

        let (valued, issues) = snapshot.valued_holdings();
        assert_eq!(valued.len(), 9);
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|i| matches!(i, CalcError::ReferentialGap { .. })));
    }

    #[test]
    fn test_unusable_prices_and_amounts_are_excluded() {
        let mut snapshot = household();
        snapshot.prices.set("aapl", -500.0);
        snapshot.prices.set("active", f64::INFINITY);
        snapshot.holdings[0].quantity = f64::NAN;

        let (valued, issues) = snapshot.valued_holdings();
        assert_eq!(valued.len(), 5);
        assert_eq!(issues.len(), 3);
        assert!(issues
            .iter()
            .all(|i| matches!(i, CalcError::InvalidInput { .. })));

        // checking, brokerage aapl and 401k active drop out; nothing panics
        assert_eq!(snapshot.liquid_net_worth(), 45_000.0);
        assert_eq!(snapshot.total_assets(), 465_000.0);
        assert_eq!(snapshot.account_value("brokerage"), 160_000.0);
        assert_eq!(snapshot.account_value("401k"), 200_000.0);
    }

    #[test]
    fn test_trailing_window_bounds() {
        let window = TrailingWindow::new(d(2026, 6, 30), 12);
        assert_eq!(window.month_offset(d(2026, 6, 1)), Some(0));
        assert_eq!(window.month_offset(d(2025, 7, 1)), Some(11));
        assert_eq!(window.month_offset(d(2025, 6, 30)), None);
        assert_eq!(window.month_offset(d(2026, 7, 1)), None);
    }

    #[test]
    fn test_window_totals() {
        let snapshot = household();
        let totals = snapshot.window_totals(12);
        assert_eq!(totals.months_covered, 12);
        assert_eq!(totals.fixed_costs, 72_000.0);
        assert_eq!(totals.discretionary, 24_000.0);
        assert_eq!(totals.contributions, 30_000.0);
        assert_eq!(totals.monthly(totals.essential), Some(6_000.0));
        assert_eq!(totals.housing, 72_000.0);
        assert_eq!(snapshot.goal_saved("goal-college"), 47_500.0);
    }

    #[test]
    fn test_income_typed_debits_stay_out_of_discretionary() {
        let mut snapshot = household();
        snapshot.transactions.push(tx(
            "clawback",
            d(2026, 6, 10),
            5_000.0,
            Direction::Debit,
            TransactionType::Bonus,
        ));
        snapshot.transactions.push(tx(
            "concert",
            d(2026, 6, 12),
            300.0,
            Direction::Debit,
            TransactionType::Entertainment,
        ));

        let totals = snapshot.window_totals(12);
        assert_eq!(totals.discretionary, 24_300.0);
        assert_eq!(totals.fixed_costs, 72_000.0);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = household();
        let b = household();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = household();
        c.income[0].amount += 1.0;
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
