// 🎯 Goal Entities - targets and the accounts earmarked for them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub target_amount: f64,
    pub target_date: NaiveDate,

    /// 1 (highest) to 5
    pub priority: u8,

    pub monthly_contribution: f64,
}

/// Share of one account's value earmarked for one goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalAllocation {
    pub goal_id: String,
    pub account_id: String,

    /// 0 to 100
    pub allocation_percentage: f64,
}
