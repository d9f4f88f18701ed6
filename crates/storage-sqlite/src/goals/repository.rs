use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use fintrack_core::goals::{CachedAmount, Goal, GoalRepositoryTrait, GoalStatus};
use fintrack_core::{Error, Result};

use super::model::{GoalDB, GoalProjectionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::goals;
use crate::schema::goals::dsl::*;

fn into_domain(rows: Vec<GoalDB>) -> Result<Vec<Goal>> {
    rows.into_iter()
        .map(|row| Goal::try_from(row).map_err(Error::from))
        .collect()
}

pub struct GoalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GoalRepository { pool, writer }
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn get_goal(&self, goal_id: &str, owner_id: &str) -> Result<Option<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let row = goals
            .filter(id.eq(goal_id))
            .filter(user_id.eq(owner_id))
            .select(GoalDB::as_select())
            .first::<GoalDB>(&mut conn)
            .optional()
            .into_core()?;
        row.map(|row| Goal::try_from(row).map_err(Error::from))
            .transpose()
    }

    fn list_goals_by_user(&self, owner_id: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals
            .filter(user_id.eq(owner_id))
            .order((created_at.desc(), id.desc()))
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .into_core()?;
        into_domain(rows)
    }

    fn list_goals_by_user_and_status(
        &self,
        owner_id: &str,
        statuses: &[GoalStatus],
    ) -> Result<Vec<Goal>> {
        let wanted: Vec<&str> = statuses.iter().map(GoalStatus::as_str).collect();
        let mut conn = get_connection(&self.pool)?;
        let rows = goals
            .filter(user_id.eq(owner_id))
            .filter(status.eq_any(wanted))
            .order((created_at.desc(), id.desc()))
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .into_core()?;
        into_domain(rows)
    }

    async fn insert_goal(&self, goal: Goal) -> Result<Goal> {
        let row = GoalDB::from(&goal);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let inserted = diesel::insert_into(goals::table)
                    .values(&row)
                    .returning(GoalDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                Ok(Goal::try_from(inserted)?)
            })
            .await
    }

    async fn update_goal(&self, goal: Goal) -> Result<Goal> {
        let row = GoalDB::from(&goal);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let updated = diesel::update(
                    goals
                        .filter(id.eq(row.id.clone()))
                        .filter(user_id.eq(row.user_id.clone())),
                )
                .set(&row)
                .returning(GoalDB::as_returning())
                .get_result(conn)
                .optional()
                .into_core()?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "Goal with ID \"{}\" not found or does not belong to user \"{}\"",
                        row.id, row.user_id
                    ))
                })?;
                Ok(Goal::try_from(updated)?)
            })
            .await
    }

    async fn update_goal_projection(
        &self,
        goal_id: &str,
        new_status: GoalStatus,
        progress: CachedAmount,
    ) -> Result<usize> {
        let goal_id = goal_id.to_string();
        let changes =
            GoalProjectionDB::new(new_status, progress, Utc::now().naive_utc());
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::update(goals.find(goal_id))
                    .set(&changes)
                    .execute(conn)
                    .into_core()
            })
            .await
    }

    async fn delete_goal(&self, goal_id: &str, owner_id: &str) -> Result<usize> {
        let goal_id = goal_id.to_string();
        let owner_id = owner_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(goals.filter(id.eq(goal_id)).filter(user_id.eq(owner_id)))
                    .execute(conn)
                    .into_core()
            })
            .await
    }
}
