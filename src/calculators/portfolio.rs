// 📈 Portfolio Calculator - allocation, concentration, cost and tax drag
//
// Works on every holding in the client's accounts. Holdings that cannot be
// resolved to both an account and a security are left out and reported.

use super::{round2, GradedMetric, SectionHealth};
use crate::config::Thresholds;
use crate::entities::{AccountType, AssetClass, RiskTolerance, SecurityType};
use crate::metric::{CalcError, HealthStatus, Metric};
use crate::money;
use crate::snapshot::{ClientSnapshot, ValuationBasis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub asset_class: AssetClass,
    pub value: f64,
    /// Percent of total portfolio value
    pub percent: f64,
}

// ============================================================================
// PURE FORMULAS
// ============================================================================

/// Percentage of total value per asset class, in asset-class order
pub fn allocation_mix(positions: &[(AssetClass, f64)]) -> Vec<AllocationSlice> {
    let mut by_class: BTreeMap<AssetClass, Vec<f64>> = BTreeMap::new();
    for (class, value) in positions {
        by_class.entry(*class).or_default().push(*value);
    }

    let total = money::sum(positions.iter().map(|(_, v)| *v));
    if total <= 0.0 {
        return Vec::new();
    }

    by_class
        .into_iter()
        .map(|(asset_class, values)| {
            let value = money::sum(values);
            AllocationSlice {
                asset_class,
                value,
                percent: value / total * 100.0,
            }
        })
        .filter(|slice| slice.value > 0.0)
        .collect()
}

/// Value-weighted expense ratio (percent); funds without a ratio count as 0
pub fn weighted_expense_ratio(positions: &[(f64, Option<f64>)]) -> Metric {
    let total = money::sum(positions.iter().map(|(v, _)| *v));
    let weighted = money::sum(
        positions
            .iter()
            .map(|(value, ratio)| value * ratio.unwrap_or(0.0)),
    );
    Metric::ratio("weighted_expense_ratio", weighted, total)
}

/// Illiquid holdings as a percent of net worth
pub fn illiquid_percent(illiquid: f64, net_worth: f64) -> Metric {
    if net_worth <= 0.0 {
        return Metric::not_applicable(CalcError::invalid_input(
            "net_worth",
            format!("net worth is {:.2}; illiquid share needs a positive net worth", net_worth),
        ));
    }
    Metric::computed(illiquid / net_worth * 100.0)
}

/// 0-100 asset-location score.
///
/// `inefficient_taxable_share` is the fraction of portfolio value that is
/// bonds or real estate sitting in taxable accounts.
pub fn tax_efficiency_score(inefficient_taxable_share: f64, annual_turnover: f64) -> f64 {
    let turnover_penalty = if annual_turnover > 100.0 {
        20.0
    } else if annual_turnover > 50.0 {
        10.0
    } else {
        0.0
    };
    (100.0 - 60.0 * inefficient_taxable_share - turnover_penalty).clamp(0.0, 100.0)
}

/// "110 minus age" equity share, shifted by risk tolerance and kept in 20-90
pub fn equity_target(age: i32, risk: RiskTolerance) -> f64 {
    (110.0 - age as f64 + risk.equity_adjustment()).clamp(20.0, 90.0)
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub valuation_basis: ValuationBasis,
    pub allocation: Vec<AllocationSlice>,

    pub equity_percent: Metric,
    pub equity_target_percent: f64,
    /// Current equity share minus the target, in percentage points
    pub equity_deviation: GradedMetric,

    /// Largest single-security share of total value
    pub concentration: GradedMetric,
    pub largest_position: Option<String>,
    pub concentrated: Option<bool>,

    pub weighted_expense_ratio: GradedMetric,
    pub annual_fee_drag: Metric,
    pub tax_efficiency: GradedMetric,

    /// Property, crypto and other hard-to-sell holdings
    pub illiquid_assets: f64,
    /// Illiquid assets as a percent of net worth
    pub illiquid_net_worth: GradedMetric,

    pub behavioral_score: GradedMetric,
    pub behavioral_flags: Vec<String>,

    #[serde(flatten)]
    pub health: SectionHealth,
    pub recommendations: Vec<String>,
    pub issues: Vec<CalcError>,
}

impl PortfolioSummary {
    pub fn summary(&self) -> String {
        format!(
            "Portfolio: ${:.0} ({:?}), {} classes, concentration {}, expense ratio {}%, tax efficiency {}",
            self.total_value,
            self.valuation_basis,
            self.allocation.len(),
            self.concentration.metric,
            self.weighted_expense_ratio.metric,
            self.tax_efficiency.metric
        )
    }

    pub fn percent_in(&self, class: AssetClass) -> f64 {
        self.allocation
            .iter()
            .find(|s| s.asset_class == class)
            .map_or(0.0, |s| s.percent)
    }
}

// ============================================================================
// PORTFOLIO CALCULATOR
// ============================================================================

pub struct PortfolioCalculator {
    thresholds: Thresholds,
}

impl PortfolioCalculator {
    pub fn new(thresholds: &Thresholds) -> Self {
        PortfolioCalculator {
            thresholds: thresholds.clone(),
        }
    }

    pub fn compute(&self, snapshot: &ClientSnapshot) -> PortfolioSummary {
        let t = &self.thresholds;
        let mut recommendations = Vec::new();

        // Missing securities were already reported as gaps
        let (valued, issues) = snapshot.valued_holdings();
        let resolved: Vec<_> = valued
            .iter()
            .filter_map(|v| v.security.map(|s| (v, s)))
            .collect();

        let total = money::sum(resolved.iter().map(|(v, _)| v.value));
        let empty = || {
            Metric::not_applicable(CalcError::invalid_input(
                "holdings",
                "no valued holdings to evaluate",
            ))
        };

        // Allocation
        let classes: Vec<(AssetClass, f64)> = resolved
            .iter()
            .map(|(v, s)| (s.asset_class(), v.value))
            .collect();
        let allocation = allocation_mix(&classes);

        // Equity vs target
        let equity_target_percent = equity_target(snapshot.current_age(), snapshot.client.risk_tolerance);
        let equity_percent = if allocation.is_empty() {
            empty()
        } else {
            Metric::computed(
                allocation
                    .iter()
                    .filter(|s| s.asset_class.is_equity())
                    .map(|s| s.percent)
                    .sum(),
            )
        };
        let deviation = equity_percent.clone().map(|pct| pct - equity_target_percent);
        let equity_deviation = GradedMetric::grade(deviation, 0.0, |d| {
            let d = d.abs();
            if d <= 5.0 {
                HealthStatus::Excellent
            } else if d <= 10.0 {
                HealthStatus::Good
            } else if d <= 20.0 {
                HealthStatus::Fair
            } else if d <= 30.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if let Some(d) = equity_deviation.value() {
            if d > 10.0 {
                recommendations.push(format!(
                    "Portfolio is {:.0} points overweight equities for the client's profile",
                    d
                ));
            } else if d < -10.0 {
                recommendations.push(format!(
                    "Portfolio is {:.0} points underweight equities",
                    -d
                ));
            }
        }

        // Concentration, aggregated per security across accounts
        let mut per_security: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (v, s) in &resolved {
            per_security.entry(s.id.as_str()).or_default().push(v.value);
        }
        let largest = per_security
            .into_iter()
            .map(|(id, values)| (id, money::sum(values)))
            .fold(None, |best: Option<(&str, f64)>, (id, value)| match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((id, value)),
            });
        let concentration = match largest {
            Some((_, value)) => Metric::ratio("concentration", value, total),
            None => empty(),
        };
        let largest_position = largest
            .and_then(|(id, _)| snapshot.security(id))
            .map(|s| s.symbol.clone());
        let concentrated = concentration.value().map(|c| c > t.concentration_threshold);
        let concentration = GradedMetric::grade(concentration, t.concentration_threshold, |c| {
            if c <= 0.05 {
                HealthStatus::Excellent
            } else if c <= 0.10 {
                HealthStatus::Good
            } else if c <= 0.20 {
                HealthStatus::Fair
            } else if c <= 0.35 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if concentrated == Some(true) {
            if let Some(symbol) = &largest_position {
                recommendations.push(format!(
                    "{} is {:.0}% of the portfolio; consider diversifying",
                    symbol,
                    concentration.value().unwrap_or(0.0) * 100.0
                ));
            }
        }

        // Costs
        let fee_inputs: Vec<(f64, Option<f64>)> = resolved
            .iter()
            .map(|(v, s)| (v.value, s.expense_ratio))
            .collect();
        let expense_ratio = weighted_expense_ratio(&fee_inputs);
        let annual_fee_drag = expense_ratio.clone().map(|er| round2(total * er / 100.0));
        let expense_ratio = GradedMetric::grade(expense_ratio, 0.20, |er| {
            if er <= 0.10 {
                HealthStatus::Excellent
            } else if er <= 0.25 {
                HealthStatus::Good
            } else if er <= 0.50 {
                HealthStatus::Fair
            } else if er <= 1.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if expense_ratio.value().map_or(false, |er| er > 0.50) {
            recommendations.push("Consider switching to low-cost index funds".to_string());
        }

        // Asset location
        let turnover = snapshot
            .portfolio_activity
            .as_ref()
            .map_or(0.0, |a| a.annual_turnover);
        let inefficient_taxable = money::sum(
            resolved
                .iter()
                .filter(|(v, s)| s.asset_class().is_tax_inefficient() && v.account.is_taxable())
                .map(|(v, _)| v.value),
        );
        let tax_efficiency = Metric::ratio("tax_efficiency", inefficient_taxable, total)
            .map(|share| tax_efficiency_score(share, turnover));
        let tax_efficiency = GradedMetric::grade(tax_efficiency, 80.0, |score| {
            if score >= 85.0 {
                HealthStatus::Excellent
            } else if score >= 70.0 {
                HealthStatus::Good
            } else if score >= 50.0 {
                HealthStatus::Fair
            } else if score >= 30.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if tax_efficiency.value().map_or(false, |score| score < 70.0) {
            recommendations.push("Place bonds and REITs in tax-advantaged accounts".to_string());
        }

        // Illiquidity, over every valued holding including unresolved securities
        let illiquid_assets = money::sum(
            valued
                .iter()
                .filter(|v| {
                    matches!(v.account.account_type, AccountType::RealEstate | AccountType::Other)
                        || v.security.map_or(false, |s| s.security_type == SecurityType::Crypto)
                })
                .map(|v| v.value),
        );
        let illiquid = illiquid_percent(illiquid_assets, snapshot.net_worth());
        let illiquid_net_worth = GradedMetric::grade(illiquid, 40.0, |pct| {
            if pct <= 30.0 {
                HealthStatus::Excellent
            } else if pct <= 50.0 {
                HealthStatus::Good
            } else if pct <= 70.0 {
                HealthStatus::Fair
            } else if pct <= 85.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });
        if let Some(pct) = illiquid_net_worth.value() {
            if pct > 50.0 {
                recommendations.push(format!(
                    "{:.0}% of net worth is illiquid, which may limit flexibility",
                    pct
                ));
            }
            if pct > 70.0 {
                recommendations.push(
                    "Build liquid assets before adding more illiquid investments".to_string(),
                );
            }
        }

        // Trading behaviour
        let mut behavioral_flags = Vec::new();
        let behavioral = match &snapshot.portfolio_activity {
            None => Metric::not_applicable(CalcError::invalid_input(
                "portfolio_metrics",
                "no trading activity on record",
            )),
            Some(activity) => {
                let mut score: f64 = 100.0;
                if activity.trades_last_12_months > 50 {
                    behavioral_flags.push("High trading activity (50+ trades/year)".to_string());
                    score -= 25.0;
                } else if activity.trades_last_12_months > 24 {
                    behavioral_flags.push("Elevated trading activity".to_string());
                    score -= 10.0;
                }
                if activity.annual_turnover > 100.0 {
                    behavioral_flags.push(format!(
                        "High portfolio turnover ({:.0}%)",
                        activity.annual_turnover
                    ));
                    score -= 20.0;
                } else if activity.annual_turnover > 50.0 {
                    behavioral_flags.push("Moderate-high portfolio turnover".to_string());
                    score -= 10.0;
                }
                Metric::computed(score.max(0.0))
            }
        };
        let behavioral_score = GradedMetric::grade(behavioral, 85.0, |score| {
            if score >= 85.0 {
                HealthStatus::Excellent
            } else if score >= 70.0 {
                HealthStatus::Good
            } else if score >= 50.0 {
                HealthStatus::Fair
            } else if score >= 30.0 {
                HealthStatus::Poor
            } else {
                HealthStatus::Critical
            }
        });

        let health = SectionHealth::from_metrics(&[
            &equity_deviation,
            &concentration,
            &expense_ratio,
            &tax_efficiency,
            &illiquid_net_worth,
            &behavioral_score,
        ]);

        if !issues.is_empty() {
            tracing::warn!(
                client_id = %snapshot.client.id,
                excluded = issues.len(),
                "holdings excluded from portfolio metrics"
            );
        }

        PortfolioSummary {
            total_value: total,
            valuation_basis: snapshot.valuation_basis(),
            allocation,
            equity_percent,
            equity_target_percent,
            equity_deviation,
            concentration,
            largest_position,
            concentrated,
            weighted_expense_ratio: expense_ratio,
            annual_fee_drag,
            tax_efficiency,
            illiquid_assets,
            illiquid_net_worth,
            behavioral_score,
            behavioral_flags,
            health,
            recommendations,
            issues,
        }
    }
}
