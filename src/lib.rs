// Advisor Metrics - Core Library
// Exposes the data layer, the snapshot and the five calculators to the CLI and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod metric;
pub mod money;
pub mod schema;
pub mod snapshot;
pub mod calculators;
pub mod report;

// Re-export commonly used types
pub use config::{Settings, StressScenario, Thresholds};
pub use db::{
    get_client, get_primary_clients, load_snapshot, open_database, save_snapshot,
    setup_database,
};
pub use metric::{CalcError, HealthStatus, Metric};
pub use schema::{validate_snapshot, SchemaValidator, SchemaViolation, ValidationResult};
pub use snapshot::{ClientSnapshot, PriceBook, TrailingWindow, ValuationBasis};
pub use calculators::{
    CashFlowCalculator, CashFlowSummary, EstateCalculator, EstateSummary, FoundationCalculator,
    FoundationSummary, GradedMetric, PlanningCalculator, PlanningSummary, PortfolioCalculator,
    PortfolioSummary, SectionHealth, WhatIf, WhatIfResult,
};
pub use report::{build_report, HouseholdReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
