// 💳 Account, Security and Holding Entities
//
// An account has exactly one type; the type carries the tax and liquidity
// flags the calculators branch on. Holdings tie a quantity of a security to
// an account as of a date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

text_enum! {
    pub enum AccountType("account type") {
        Checking => "checking",
        Savings => "savings",
        MoneyMarket => "money_market",
        Cd => "cd",
        Brokerage => "brokerage",
        Retirement401k => "401k",
        Roth401k => "roth_401k",
        TraditionalIra => "traditional_ira",
        RothIra => "roth_ira",
        Hsa => "hsa",
        Education529 => "529",
        RealEstate => "real_estate",
        Other => "other",
    }
}

/// One row of `account_types`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountTypeInfo {
    pub account_type: AccountType,
    pub tax_advantaged: bool,
    pub is_roth: bool,
    pub is_liquid: bool,
}

impl AccountTypeInfo {
    /// Flags used when seeding `account_types`
    pub fn standard(account_type: AccountType) -> Self {
        let (tax_advantaged, is_roth, is_liquid) = match account_type {
            AccountType::Checking
            | AccountType::Savings
            | AccountType::MoneyMarket => (false, false, true),
            AccountType::Cd => (false, false, false),
            AccountType::Brokerage => (false, false, false),
            AccountType::Retirement401k | AccountType::TraditionalIra => (true, false, false),
            AccountType::Roth401k | AccountType::RothIra => (true, true, false),
            AccountType::Hsa | AccountType::Education529 => (true, false, false),
            AccountType::RealEstate | AccountType::Other => (false, false, false),
        };

        AccountTypeInfo {
            account_type,
            tax_advantaged,
            is_roth,
            is_liquid,
        }
    }
}

// ============================================================================
// ACCOUNT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub tax_advantaged: bool,
    pub is_roth: bool,
    pub is_liquid: bool,
    pub institution: Option<String>,
}

impl Account {
    pub fn new(id: &str, name: &str, account_type: AccountType) -> Self {
        let info = AccountTypeInfo::standard(account_type);
        Account {
            id: id.to_string(),
            name: name.to_string(),
            account_type,
            tax_advantaged: info.tax_advantaged,
            is_roth: info.is_roth,
            is_liquid: info.is_liquid,
            institution: None,
        }
    }

    pub fn type_info(&self) -> AccountTypeInfo {
        AccountTypeInfo {
            account_type: self.account_type,
            tax_advantaged: self.tax_advantaged,
            is_roth: self.is_roth,
            is_liquid: self.is_liquid,
        }
    }

    /// Money invested for growth rather than held as spending cash
    pub fn is_invested(&self) -> bool {
        !self.is_liquid && self.account_type != AccountType::RealEstate
    }

    /// Taxable accounts are where asset location matters
    pub fn is_taxable(&self) -> bool {
        !self.tax_advantaged
    }
}

text_enum! {
    pub enum OwnershipType("ownership type") {
        Individual => "individual",
        Joint => "joint",
        Custodial => "custodial",
        Trust => "trust",
    }
}

/// Many-to-many link between clients and accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOwner {
    pub account_id: String,
    pub client_id: String,
    pub ownership_type: OwnershipType,
}

// ============================================================================
// SECURITY
// ============================================================================

text_enum! {
    pub enum SecurityType("security type") {
        Stock => "stock",
        Etf => "etf",
        MutualFund => "mutual_fund",
        Bond => "bond",
        Cash => "cash",
        Crypto => "crypto",
        RealEstate => "real_estate",
        Reit => "reit",
        Other => "other",
    }
}

text_enum! {
    /// Buckets of the allocation mix
    pub enum AssetClass("asset class") {
        Stocks => "stocks",
        Bonds => "bonds",
        Cash => "cash",
        Crypto => "crypto",
        RealEstate => "real_estate",
        Other => "other",
    }
}

impl AssetClass {
    /// Classes whose income is taxed every year when held in a taxable account
    pub fn is_tax_inefficient(&self) -> bool {
        matches!(self, AssetClass::Bonds | AssetClass::RealEstate)
    }

    pub fn is_equity(&self) -> bool {
        matches!(self, AssetClass::Stocks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub security_type: SecurityType,

    /// Annual expense ratio in percent (0.03 = 0.03%); None for non-funds
    pub expense_ratio: Option<f64>,
}

impl Security {
    pub fn asset_class(&self) -> AssetClass {
        match self.security_type {
            SecurityType::Bond => AssetClass::Bonds,
            SecurityType::Cash => AssetClass::Cash,
            SecurityType::Crypto => AssetClass::Crypto,
            SecurityType::RealEstate | SecurityType::Reit => AssetClass::RealEstate,
            SecurityType::Other => AssetClass::Other,
            SecurityType::Stock => AssetClass::Stocks,
            SecurityType::Etf | SecurityType::MutualFund => {
                // Funds are typed by wrapper, not by what they hold; match
                // whole words of the name and symbol
                let text = format!("{} {}", self.name, self.symbol).to_lowercase();
                let words: Vec<&str> = text
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .collect();
                let has = |wanted: &[&str]| words.iter().any(|w| wanted.contains(w));

                if has(&["bond", "bonds", "bnd", "treasury", "treasuries"]) {
                    AssetClass::Bonds
                } else if has(&["reit", "reits"])
                    || words.windows(2).any(|pair| pair == ["real", "estate"])
                {
                    AssetClass::RealEstate
                } else {
                    AssetClass::Stocks
                }
            }
        }
    }

    pub fn expense_ratio_or_zero(&self) -> f64 {
        self.expense_ratio.unwrap_or(0.0)
    }
}

// ============================================================================
// HOLDING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub account_id: String,
    pub security_id: String,
    pub quantity: f64,

    /// Total cost basis of the position
    pub cost_basis: f64,

    pub as_of_date: NaiveDate,
}

impl Holding {
    /// quantity × price when a price is known, otherwise cost basis
    pub fn value(&self, price: Option<f64>) -> f64 {
        match price {
            Some(price) => self.quantity * price,
            None => self.cost_basis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(name: &str, symbol: &str, security_type: SecurityType) -> Security {
        Security {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            security_type,
            expense_ratio: None,
        }
    }

    #[test]
    fn test_fund_asset_class_uses_name() {
        assert_eq!(
            security("Vanguard Total Bond Market ETF", "BND", SecurityType::Etf).asset_class(),
            AssetClass::Bonds
        );
        assert_eq!(
            security("Vanguard Real Estate ETF", "VNQ", SecurityType::Etf).asset_class(),
            AssetClass::RealEstate
        );
        assert_eq!(
            security("Vanguard Total Stock Market", "VTI", SecurityType::Etf).asset_class(),
            AssetClass::Stocks
        );
        assert_eq!(
            security("Bitcoin", "BTC", SecurityType::Crypto).asset_class(),
            AssetClass::Crypto
        );
    }

    #[test]
    fn test_fund_asset_class_matches_whole_words() {
        // "bnd" and "bond" inside other words are not bond funds
        assert_eq!(
            security("Abndx Growth Fund", "ABNDX", SecurityType::MutualFund).asset_class(),
            AssetClass::Stocks
        );
        assert_eq!(
            security("Bondurant Equity Income", "BDEQX", SecurityType::MutualFund).asset_class(),
            AssetClass::Stocks
        );
        assert_eq!(
            security("Core Fixed Income", "BND", SecurityType::Etf).asset_class(),
            AssetClass::Bonds
        );
        assert_eq!(
            security("Short-Term Treasury ETF", "VGSH", SecurityType::Etf).asset_class(),
            AssetClass::Bonds
        );
        assert_eq!(
            security("Global REITs Index", "RWO", SecurityType::Etf).asset_class(),
            AssetClass::RealEstate
        );
        assert_eq!(
            security("Realty Estate Partners Growth", "REPGX", SecurityType::MutualFund).asset_class(),
            AssetClass::Stocks
        );
    }

    #[test]
    fn test_standard_account_flags() {
        let checking = Account::new("a1", "Checking", AccountType::Checking);
        assert!(checking.is_liquid && !checking.tax_advantaged);
        assert!(!checking.is_invested());

        let roth = Account::new("a2", "Roth IRA", AccountType::RothIra);
        assert!(roth.tax_advantaged && roth.is_roth && roth.is_invested());

        assert_eq!("401k".parse::<AccountType>().unwrap(), AccountType::Retirement401k);
    }

    #[test]
    fn test_holding_value_falls_back_to_cost_basis() {
        let holding = Holding {
            id: "h1".to_string(),
            account_id: "a1".to_string(),
            security_id: "vti".to_string(),
            quantity: 10.0,
            cost_basis: 2000.0,
            as_of_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };

        assert_eq!(holding.value(None), 2000.0);
        assert_eq!(holding.value(Some(250.0)), 2500.0);
    }
}
