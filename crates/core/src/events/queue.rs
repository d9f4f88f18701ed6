//! Durable message queue contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::errors::Result;

/// A message claimed from a durable queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub id: i64,
    pub queue: String,
    pub routing_key: String,
    pub payload: String,
    /// Deliveries so far, including the current one.
    pub attempts: u32,
    pub enqueued_at: NaiveDateTime,
}

/// A message that was given up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub id: i64,
    pub queue: String,
    pub routing_key: String,
    pub payload: String,
    pub attempts: u32,
    pub reason: String,
    pub enqueued_at: NaiveDateTime,
    pub dead_lettered_at: NaiveDateTime,
}

/// Durable, at-least-once queue storage.
///
/// A claimed message is invisible to other claimers until its lease runs out.
/// A consumer that dies before acknowledging therefore causes redelivery,
/// never loss.
#[async_trait]
pub trait MessageQueueTrait: Send + Sync {
    /// Persists a message on `queue` and returns its id.
    async fn enqueue(&self, queue: &str, routing_key: &str, payload: &str) -> Result<i64>;

    /// Claims up to `limit` pending or lease-expired messages, oldest first,
    /// incrementing their attempt counters.
    async fn claim(&self, limit: usize, lease: Duration) -> Result<Vec<QueuedMessage>>;

    /// Removes a processed message.
    async fn ack(&self, id: i64) -> Result<()>;

    /// Makes a claimed message claimable again once `retry_after` has
    /// passed, recording `error`.
    async fn release(&self, id: i64, error: &str, retry_after: Duration) -> Result<()>;

    /// Moves a message to the dead letter table.
    async fn dead_letter(&self, id: i64, reason: &str) -> Result<()>;

    /// Messages not yet acknowledged or dead-lettered.
    fn pending_count(&self) -> Result<i64>;

    fn list_dead_letters(&self) -> Result<Vec<DeadLetter>>;
}
