// Entity Models - the household records a calculation pass reads
//
// Every record mirrors one row of the SQLite schema in `db`. Enumerated
// columns are stored as TEXT; the enums below map those strings both ways.

use std::fmt;

/// Unknown text in an enumerated column
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Declares a TEXT-backed enum with `as_str`, `FromStr` and `Display`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
                 serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::entities::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::entities::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod client;
pub mod account;
pub mod ledger;
pub mod goal;
pub mod protection;

pub use client::{Client, MaritalStatus, RiskTolerance};
pub use account::{
    Account, AccountOwner, AccountType, AccountTypeInfo, AssetClass, Holding, OwnershipType,
    Security, SecurityType,
};
pub use ledger::{
    Direction, Frequency, Income, IncomeType, Liability, LiabilityType, Transaction,
    TransactionType,
};
pub use goal::{Goal, GoalAllocation};
pub use protection::{Dependent, Document, EstatePlanning, InsuranceCoverage, PortfolioActivity};
