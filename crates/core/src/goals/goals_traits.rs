use crate::errors::Result;
use crate::goals::goals_model::{
    CachedAmount, Goal, GoalStatus, GoalUpdate, NewGoal, ReconcileOutcome,
};
use async_trait::async_trait;

/// Trait for goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    /// Loads a goal only if it belongs to `user_id`.
    fn get_goal(&self, goal_id: &str, user_id: &str) -> Result<Option<Goal>>;
    /// Goals of a user, newest first.
    fn list_goals_by_user(&self, user_id: &str) -> Result<Vec<Goal>>;
    fn list_goals_by_user_and_status(
        &self,
        user_id: &str,
        statuses: &[GoalStatus],
    ) -> Result<Vec<Goal>>;
    async fn insert_goal(&self, goal: Goal) -> Result<Goal>;
    /// Persists every user-settable field plus the derived projection.
    async fn update_goal(&self, goal: Goal) -> Result<Goal>;
    /// Persists only the derived columns (status and cached amount).
    async fn update_goal_projection(
        &self,
        goal_id: &str,
        status: GoalStatus,
        progress: CachedAmount,
    ) -> Result<usize>;
    async fn delete_goal(&self, goal_id: &str, user_id: &str) -> Result<usize>;
}

/// Trait for goal service operations.
///
/// `caller_id` is the identity of the requesting user as established by the
/// gateway. Every operation enforces ownership against it.
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    async fn create_goal(&self, caller_id: &str, new_goal: NewGoal) -> Result<Goal>;
    async fn get_goals_for_user(&self, caller_id: &str, user_id: &str) -> Result<Vec<Goal>>;
    async fn get_goal(&self, caller_id: &str, goal_id: &str, user_id: &str) -> Result<Goal>;
    async fn update_goal(&self, caller_id: &str, goal_id: &str, update: GoalUpdate)
        -> Result<Goal>;
    async fn delete_goal(&self, caller_id: &str, goal_id: &str) -> Result<()>;
    /// Re-enriches every in-progress or completed goal of `user_id`.
    async fn reconcile_user_goals(&self, user_id: &str) -> Result<ReconcileOutcome>;
}
