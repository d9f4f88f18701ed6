//! Goals domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Lifecycle state of a goal.
///
/// `Failed` exists in the schema but the enrichment engine never enters it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
            GoalStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(GoalStatus::InProgress),
            "completed" => Ok(GoalStatus::Completed),
            "failed" => Ok(GoalStatus::Failed),
            other => Err(Error::invalid_input(format!(
                "Unknown goal status '{}'",
                other
            ))),
        }
    }
}

/// Cached projection of the owner's balance.
///
/// `value` is what the last enrichment pass derived from a fetched balance.
/// `computed_at` is when that value was written; `None` means the goal has
/// never been enriched and `value` is the creation baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedAmount {
    #[serde(rename = "currentAmount")]
    pub value: Decimal,
    #[serde(rename = "balanceComputedAt")]
    pub computed_at: Option<NaiveDateTime>,
}

impl CachedAmount {
    /// The value a goal is created with.
    pub fn baseline() -> Self {
        Self {
            value: Decimal::ZERO,
            computed_at: None,
        }
    }

    pub fn computed(value: Decimal, computed_at: NaiveDateTime) -> Self {
        Self {
            value,
            computed_at: Some(computed_at),
        }
    }

    pub fn is_derived(&self) -> bool {
        self.computed_at.is_some()
    }
}

/// Domain model representing a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub goal_name: String,
    pub target_amount: Decimal,
    #[serde(flatten)]
    pub progress: CachedAmount,
    pub deadline: NaiveDate,
    pub status: GoalStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Goal {
    pub fn current_amount(&self) -> Decimal {
        self.progress.value
    }
}

/// Input model for creating a new goal
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub user_id: String,
    pub goal_name: String,
    pub target_amount: Decimal,
    /// ISO-8601 date (`YYYY-MM-DD`) or datetime.
    pub deadline: String,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    /// Accepted for compatibility with older clients; never persisted.
    #[serde(default)]
    pub current_amount: Option<Decimal>,
}

/// Partial update of a goal. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(default)]
    pub goal_name: Option<String>,
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    /// Accepted by the type but ignored: the derived value always wins.
    #[serde(default)]
    pub current_amount: Option<Decimal>,
}

/// Result of reconciling a user's goals against a fresh balance.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Balance was fetched; `updated` of `examined` goals were written.
    Applied { examined: usize, updated: usize },
    /// Balance was unavailable; no goal was touched.
    Skipped { reason: String },
}
