//! Database models for goals.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::errors::StorageError;
use fintrack_core::goals::{CachedAmount, Goal, GoalStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for goals.
///
/// Amounts are stored as decimal text and the deadline as `YYYY-MM-DD`.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct GoalDB {
    pub id: String,
    pub user_id: String,
    pub goal_name: String,
    pub target_amount: String,
    pub current_amount: String,
    pub balance_computed_at: Option<NaiveDateTime>,
    pub deadline: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The derived columns of a goal. Writing only these leaves every
/// user-settable field alone.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
pub struct GoalProjectionDB {
    pub status: String,
    pub current_amount: String,
    pub balance_computed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl GoalProjectionDB {
    pub fn new(status: GoalStatus, progress: CachedAmount, updated_at: NaiveDateTime) -> Self {
        Self {
            status: status.as_str().to_string(),
            current_amount: progress.value.to_string(),
            balance_computed_at: progress.computed_at,
            updated_at,
        }
    }
}

impl From<&Goal> for GoalDB {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id.clone(),
            user_id: goal.user_id.clone(),
            goal_name: goal.goal_name.clone(),
            target_amount: goal.target_amount.to_string(),
            current_amount: goal.progress.value.to_string(),
            balance_computed_at: goal.progress.computed_at,
            deadline: goal.deadline.format(DATE_FORMAT).to_string(),
            status: goal.status.as_str().to_string(),
            created_at: goal.created_at,
            updated_at: goal.updated_at,
        }
    }
}

fn decode_decimal(column: &str, raw: &str, goal_id: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw).map_err(|e| {
        StorageError::Corrupted(format!(
            "goal {}: column {} holds '{}': {}",
            goal_id, column, raw, e
        ))
    })
}

impl TryFrom<GoalDB> for Goal {
    type Error = StorageError;

    fn try_from(db: GoalDB) -> Result<Self, Self::Error> {
        let target_amount = decode_decimal("target_amount", &db.target_amount, &db.id)?;
        let current_amount = decode_decimal("current_amount", &db.current_amount, &db.id)?;
        let deadline = NaiveDate::parse_from_str(&db.deadline, DATE_FORMAT).map_err(|e| {
            StorageError::Corrupted(format!(
                "goal {}: column deadline holds '{}': {}",
                db.id, db.deadline, e
            ))
        })?;
        let status = GoalStatus::from_str(&db.status)
            .map_err(|e| StorageError::Corrupted(format!("goal {}: {}", db.id, e)))?;

        Ok(Goal {
            id: db.id,
            user_id: db.user_id,
            goal_name: db.goal_name,
            target_amount,
            progress: CachedAmount {
                value: current_amount,
                computed_at: db.balance_computed_at,
            },
            deadline,
            status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
