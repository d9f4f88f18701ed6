//! Goal enrichment engine.
//!
//! Derives a goal's effective `currentAmount` and `status` from a freshly
//! fetched balance. The functions here are pure: the same goal and balance
//! always produce the same [`Enrichment`], which is what makes replaying a
//! transaction event harmless.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::goals_model::{CachedAmount, Goal, GoalStatus};

/// Derived view of a goal for a given balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    /// Balance as observed by this pass.
    pub balance: Decimal,
    /// Effective progress, the balance clamped at zero.
    pub current_amount: Decimal,
    pub status: GoalStatus,
}

/// Computes the effective progress and status of `goal` for `balance`.
///
/// The stored `currentAmount` is ignored; the balance is the only source.
pub fn enrich(goal: &Goal, balance: Decimal) -> Enrichment {
    Enrichment {
        balance,
        current_amount: balance.max(Decimal::ZERO),
        status: derive_status(goal.status, balance, goal.target_amount),
    }
}

/// Status transition rules.
///
/// `Failed` is sticky. Otherwise reaching the target completes the goal and
/// falling below it moves a completed goal back to in progress.
pub fn derive_status(stored: GoalStatus, balance: Decimal, target: Decimal) -> GoalStatus {
    match stored {
        GoalStatus::Failed => GoalStatus::Failed,
        _ if balance >= target => GoalStatus::Completed,
        GoalStatus::Completed => GoalStatus::InProgress,
        GoalStatus::InProgress => GoalStatus::InProgress,
    }
}

/// Writes `enrichment` into `goal` as a cache refreshed at `computed_at`.
pub fn apply(goal: &mut Goal, enrichment: &Enrichment, computed_at: NaiveDateTime) {
    goal.status = enrichment.status;
    goal.progress = CachedAmount::computed(enrichment.current_amount, computed_at);
}

/// Whether the stored projection differs from `enrichment`.
///
/// A goal that was never enriched always needs a write so its cache gets a
/// timestamp.
pub fn needs_persist(goal: &Goal, enrichment: &Enrichment) -> bool {
    goal.status != enrichment.status
        || goal.progress.value != enrichment.current_amount
        || !goal.progress.is_derived()
}
