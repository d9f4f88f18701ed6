use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};

use fintrack_core::events::{DeadLetter, MessageQueueTrait, QueuedMessage};
use fintrack_core::{Error, Result};

use super::model::{DeadLetterDB, NewQueueMessageDB, QueueMessageDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{dead_letters, queue_messages};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Durable queue over the `queue_messages` table.
///
/// A message is claimable while `lease_until` is NULL or in the past.
/// Claiming sets the lease and bumps `attempts` in the same transaction, so
/// two consumers never hold the same message at once.
pub struct SqliteMessageQueue {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteMessageQueue {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteMessageQueue { pool, writer }
    }
}

#[async_trait]
impl MessageQueueTrait for SqliteMessageQueue {
    async fn enqueue(&self, queue: &str, routing_key: &str, payload: &str) -> Result<i64> {
        let row = NewQueueMessageDB {
            queue: queue.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_string(),
            enqueued_at: now(),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<i64> {
                diesel::insert_into(queue_messages::table)
                    .values(&row)
                    .returning(queue_messages::id)
                    .get_result::<i64>(conn)
                    .into_core()
            })
            .await
    }

    async fn claim(&self, limit: usize, lease: Duration) -> Result<Vec<QueuedMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let lease = TimeDelta::from_std(lease)
            .map_err(|e| Error::InvalidConfigValue(format!("lease duration: {}", e)))?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<QueuedMessage>> {
                let claimed_at = now();
                let rows = queue_messages::table
                    .filter(
                        queue_messages::lease_until
                            .is_null()
                            .or(queue_messages::lease_until.le(claimed_at)),
                    )
                    .order(queue_messages::id.asc())
                    .limit(limit)
                    .select(QueueMessageDB::as_select())
                    .load::<QueueMessageDB>(conn)
                    .into_core()?;
                if rows.is_empty() {
                    return Ok(Vec::new());
                }

                let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
                diesel::update(queue_messages::table.filter(queue_messages::id.eq_any(ids)))
                    .set((
                        queue_messages::attempts.eq(queue_messages::attempts + 1),
                        queue_messages::lease_until.eq(Some(claimed_at + lease)),
                    ))
                    .execute(conn)
                    .into_core()?;

                Ok(rows
                    .into_iter()
                    .map(|mut row| {
                        row.attempts += 1;
                        QueuedMessage::from(row)
                    })
                    .collect())
            })
            .await
    }

    async fn ack(&self, message_id: i64) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let deleted =
                    diesel::delete(queue_messages::table.find(message_id))
                        .execute(conn)
                        .into_core()?;
                if deleted == 0 {
                    debug!("Message {} was already gone when acknowledged", message_id);
                }
                Ok(())
            })
            .await
    }

    async fn release(&self, message_id: i64, error: &str, retry_after: Duration) -> Result<()> {
        let error = error.to_string();
        let retry_after = TimeDelta::from_std(retry_after)
            .map_err(|e| Error::InvalidConfigValue(format!("retry delay: {}", e)))?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(queue_messages::table.find(message_id))
                    .set((
                        queue_messages::lease_until.eq(Some(now() + retry_after)),
                        queue_messages::last_error.eq(Some(error)),
                    ))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn dead_letter(&self, message_id: i64, reason: &str) -> Result<()> {
        let reason = reason.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let Some(row) = queue_messages::table
                    .find(message_id)
                    .select(QueueMessageDB::as_select())
                    .first::<QueueMessageDB>(conn)
                    .optional()
                    .into_core()?
                else {
                    warn!("Message {} vanished before it could be dead-lettered", message_id);
                    return Ok(());
                };

                diesel::insert_into(dead_letters::table)
                    .values(&DeadLetterDB::from_message(row, reason, now()))
                    .execute(conn)
                    .into_core()?;
                diesel::delete(queue_messages::table.find(message_id))
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    fn pending_count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        queue_messages::table
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn list_dead_letters(&self) -> Result<Vec<DeadLetter>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dead_letters::table
            .order(dead_letters::dead_lettered_at.desc())
            .select(DeadLetterDB::as_select())
            .load::<DeadLetterDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(DeadLetter::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use tempfile::TempDir;

    fn queue() -> (TempDir, SqliteMessageQueue) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let db_path = init(path.to_str().unwrap()).unwrap();
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());
        (dir, SqliteMessageQueue::new(pool, writer))
    }

    const LEASE: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_claim_hides_message_until_released() {
        let (_dir, q) = queue();
        let id = q
            .enqueue("created_q", "transaction.created", r#"{"userId":"u-1"}"#)
            .await
            .unwrap();

        let claimed = q.claim(10, LEASE).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, id);
        assert_eq!(claimed[0].attempts, 1);
        assert_eq!(claimed[0].routing_key, "transaction.created");

        assert!(q.claim(10, LEASE).await.unwrap().is_empty());

        q.release(id, "database is locked", Duration::ZERO).await.unwrap();
        let again = q.claim(10, LEASE).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].attempts, 2);
    }

    #[tokio::test]
    async fn test_expired_lease_is_redelivered() {
        let (_dir, q) = queue();
        q.enqueue("q", "transaction.deleted", "{}").await.unwrap();

        assert_eq!(q.claim(1, Duration::ZERO).await.unwrap().len(), 1);
        // A zero lease has already run out: the consumer is presumed dead.
        let redelivered = q.claim(1, LEASE).await.unwrap();
        assert_eq!(redelivered.len(), 1);
        assert_eq!(redelivered[0].attempts, 2);
    }

    #[tokio::test]
    async fn test_claim_respects_limit_and_order() {
        let (_dir, q) = queue();
        let first = q.enqueue("q", "k", "1").await.unwrap();
        let second = q.enqueue("q", "k", "2").await.unwrap();
        q.enqueue("q", "k", "3").await.unwrap();

        let claimed: Vec<i64> = q
            .claim(2, LEASE)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(claimed, vec![first, second]);
        assert_eq!(q.pending_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ack_and_dead_letter_remove_message() {
        let (_dir, q) = queue();
        let acked = q.enqueue("q", "transaction.created", "{}").await.unwrap();
        let parked = q.enqueue("q", "transaction.created", "not json").await.unwrap();
        q.claim(10, LEASE).await.unwrap();

        q.ack(acked).await.unwrap();
        q.dead_letter(parked, "payload is not valid JSON").await.unwrap();

        assert_eq!(q.pending_count().unwrap(), 0);
        let dead = q.list_dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, parked);
        assert_eq!(dead[0].payload, "not json");
        assert_eq!(dead[0].attempts, 1);
        assert_eq!(dead[0].reason, "payload is not valid JSON");

        // Both are idempotent.
        q.ack(acked).await.unwrap();
        q.dead_letter(parked, "again").await.unwrap();
        assert_eq!(q.list_dead_letters().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_released_message_waits_out_retry_delay() {
        let (_dir, q) = queue();
        let id = q.enqueue("q", "transaction.created", "{}").await.unwrap();
        q.claim(10, LEASE).await.unwrap();

        q.release(id, "query failed", Duration::from_secs(60)).await.unwrap();

        assert!(q.claim(10, LEASE).await.unwrap().is_empty());
        assert_eq!(q.pending_count().unwrap(), 1);
    }
}
