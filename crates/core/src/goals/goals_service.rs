use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::goals_enrichment::{apply, enrich, needs_persist};
use super::goals_model::{CachedAmount, Goal, GoalStatus, GoalUpdate, NewGoal, ReconcileOutcome};
use super::goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
use super::goals_validation::{
    parse_deadline, require_id, validate_goal_name, validate_target_amount,
};
use crate::balance::BalanceProviderTrait;
use crate::errors::{Error, Result};

/// Statuses the reconciliation pass looks at. `Failed` goals are never revisited.
const RECONCILED_STATUSES: [GoalStatus; 2] = [GoalStatus::InProgress, GoalStatus::Completed];

pub struct GoalService {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    balance_provider: Arc<dyn BalanceProviderTrait>,
}

impl GoalService {
    pub fn new(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        balance_provider: Arc<dyn BalanceProviderTrait>,
    ) -> Self {
        GoalService {
            goal_repository,
            balance_provider,
        }
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn not_found(goal_id: &str, user_id: &str) -> Error {
        Error::NotFound(format!(
            "Goal with ID \"{}\" not found or does not belong to user \"{}\"",
            goal_id, user_id
        ))
    }

    /// Enriches a goal on a request path and writes the projection back when it
    /// drifted. A failed write is logged and the enriched value is still
    /// returned; the next read or event re-converges the row.
    async fn refresh(
        &self,
        mut goal: Goal,
        balance: Decimal,
        computed_at: NaiveDateTime,
        operation: &str,
    ) -> Goal {
        let enrichment = enrich(&goal, balance);
        let drifted = needs_persist(&goal, &enrichment);
        let previous_status = goal.status;
        apply(&mut goal, &enrichment, computed_at);

        if drifted {
            if let Err(e) = self
                .goal_repository
                .update_goal_projection(&goal.id, goal.status, goal.progress)
                .await
            {
                warn!(
                    "Failed to persist enriched goal {} for user {} during {}: {}",
                    goal.id, goal.user_id, operation, e
                );
            } else if previous_status != goal.status {
                info!(
                    "Goal {} of user {} moved from {} to {} (balance {}, target {})",
                    goal.id,
                    goal.user_id,
                    previous_status,
                    goal.status,
                    balance,
                    goal.target_amount
                );
            }
        }
        goal
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    async fn create_goal(&self, caller_id: &str, new_goal: NewGoal) -> Result<Goal> {
        require_id(caller_id, "callerId")?;
        if new_goal.user_id != caller_id {
            return Err(Error::Forbidden(
                "You can only create goals for yourself.".to_string(),
            ));
        }

        let goal_name = validate_goal_name(&new_goal.goal_name)?;
        let target_amount = validate_target_amount(new_goal.target_amount)?;
        let deadline = parse_deadline(&new_goal.deadline)?;
        if new_goal.current_amount.is_some() {
            warn!(
                "Ignoring client-supplied currentAmount on new goal for user {}",
                caller_id
            );
        }

        let now = Self::now();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: new_goal.user_id,
            goal_name,
            target_amount,
            progress: CachedAmount::baseline(),
            deadline,
            status: new_goal.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let saved = self.goal_repository.insert_goal(goal).await?;
        info!(
            "Created goal {} for user {} with target {}",
            saved.id, saved.user_id, saved.target_amount
        );

        match self.balance_provider.fetch_balance(caller_id).await {
            Ok(summary) => Ok(self
                .refresh(saved, summary.balance, Self::now(), "create")
                .await),
            Err(e) => {
                warn!(
                    "Balance unavailable after creating goal {} for user {} ({}): {}. Returning baseline values.",
                    saved.id,
                    caller_id,
                    e.kind(),
                    e
                );
                Ok(saved)
            }
        }
    }

    async fn get_goals_for_user(&self, caller_id: &str, user_id: &str) -> Result<Vec<Goal>> {
        require_id(user_id, "userId")?;
        if caller_id != user_id {
            return Err(Error::Forbidden(
                "You can only view your own goals.".to_string(),
            ));
        }

        let goals = self.goal_repository.list_goals_by_user(user_id)?;
        if goals.is_empty() {
            debug!("No goals stored for user {}", user_id);
            return Ok(goals);
        }

        let summary = match self.balance_provider.fetch_balance(user_id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    "Balance unavailable while listing {} goal(s) for user {} ({}): {}. Returning persisted values.",
                    goals.len(),
                    user_id,
                    e.kind(),
                    e
                );
                return Ok(goals);
            }
        };

        let computed_at = Self::now();
        let mut enriched = Vec::with_capacity(goals.len());
        for goal in goals {
            enriched.push(
                self.refresh(goal, summary.balance, computed_at, "list")
                    .await,
            );
        }
        Ok(enriched)
    }

    async fn get_goal(&self, caller_id: &str, goal_id: &str, user_id: &str) -> Result<Goal> {
        require_id(user_id, "userId")?;
        require_id(goal_id, "goalId")?;
        if caller_id != user_id {
            return Err(Error::Forbidden(
                "You can only view your own goals.".to_string(),
            ));
        }

        let goal = self
            .goal_repository
            .get_goal(goal_id, user_id)?
            .ok_or_else(|| Self::not_found(goal_id, user_id))?;

        match self.balance_provider.fetch_balance(user_id).await {
            Ok(summary) => Ok(self
                .refresh(goal, summary.balance, Self::now(), "get")
                .await),
            Err(e) => {
                warn!(
                    "Balance unavailable while reading goal {} for user {} ({}): {}. Returning persisted values.",
                    goal_id,
                    user_id,
                    e.kind(),
                    e
                );
                Ok(goal)
            }
        }
    }

    async fn update_goal(
        &self,
        caller_id: &str,
        goal_id: &str,
        update: GoalUpdate,
    ) -> Result<Goal> {
        require_id(caller_id, "callerId")?;
        require_id(goal_id, "goalId")?;

        let mut goal = self
            .goal_repository
            .get_goal(goal_id, caller_id)?
            .ok_or_else(|| Self::not_found(goal_id, caller_id))?;

        // Validate everything before touching the loaded goal.
        let goal_name = update
            .goal_name
            .as_deref()
            .map(validate_goal_name)
            .transpose()?;
        let target_amount = update
            .target_amount
            .map(validate_target_amount)
            .transpose()?;
        let deadline = update.deadline.as_deref().map(parse_deadline).transpose()?;

        if let Some(goal_name) = goal_name {
            goal.goal_name = goal_name;
        }
        if let Some(target_amount) = target_amount {
            goal.target_amount = target_amount;
        }
        if let Some(deadline) = deadline {
            goal.deadline = deadline;
        }
        if let Some(status) = update.status {
            goal.status = status;
        }
        if update.current_amount.is_some() {
            warn!(
                "Ignoring client-supplied currentAmount for goal {}; it is derived from the balance",
                goal_id
            );
        }

        let now = Self::now();
        goal.updated_at = now;

        match self.balance_provider.fetch_balance(caller_id).await {
            Ok(summary) => {
                let enrichment = enrich(&goal, summary.balance);
                apply(&mut goal, &enrichment, now);
                debug!(
                    "Saving goal {} with status {} derived from balance {}",
                    goal_id, goal.status, summary.balance
                );
            }
            Err(e) => {
                warn!(
                    "Balance unavailable while updating goal {} for user {} ({}): {}. Saving field changes only; status may be stale.",
                    goal_id,
                    caller_id,
                    e.kind(),
                    e
                );
            }
        }

        self.goal_repository.update_goal(goal).await
    }

    async fn delete_goal(&self, caller_id: &str, goal_id: &str) -> Result<()> {
        require_id(caller_id, "callerId")?;
        require_id(goal_id, "goalId")?;

        let affected = self.goal_repository.delete_goal(goal_id, caller_id).await?;
        if affected == 0 {
            warn!("Goal {} not found for removal (user {})", goal_id, caller_id);
            return Err(Self::not_found(goal_id, caller_id));
        }
        info!("Removed goal {} of user {}", goal_id, caller_id);
        Ok(())
    }

    async fn reconcile_user_goals(&self, user_id: &str) -> Result<ReconcileOutcome> {
        let summary = match self.balance_provider.fetch_balance(user_id).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(
                    "Balance unavailable while reconciling goals of user {} ({}): {}. Leaving goals untouched.",
                    user_id,
                    e.kind(),
                    e
                );
                return Ok(ReconcileOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
        };

        let goals = self
            .goal_repository
            .list_goals_by_user_and_status(user_id, &RECONCILED_STATUSES)?;
        if goals.is_empty() {
            debug!("No in-progress or completed goals for user {}", user_id);
            return Ok(ReconcileOutcome::Applied {
                examined: 0,
                updated: 0,
            });
        }

        let computed_at = Self::now();
        let mut updated = 0;
        for goal in &goals {
            let enrichment = enrich(goal, summary.balance);
            if !needs_persist(goal, &enrichment) {
                debug!(
                    "No change for goal {} of user {} (status {}, balance {})",
                    goal.id, user_id, goal.status, summary.balance
                );
                continue;
            }

            if goal.status != enrichment.status {
                info!(
                    "Goal {} of user {} moved from {} to {} (balance {}, target {})",
                    goal.id,
                    user_id,
                    goal.status,
                    enrichment.status,
                    summary.balance,
                    goal.target_amount
                );
            }
            self.goal_repository
                .update_goal_projection(
                    &goal.id,
                    enrichment.status,
                    CachedAmount::computed(enrichment.current_amount, computed_at),
                )
                .await?;
            updated += 1;
        }

        Ok(ReconcileOutcome::Applied {
            examined: goals.len(),
            updated,
        })
    }
}
