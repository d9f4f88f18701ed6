//! Routing-key to handler dispatch for queued messages.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::queue::QueuedMessage;
use super::transaction_event::{TransactionEvent, TransactionEventKind};
use crate::constants::{RETRY_BACKOFF_BASE_MS, RETRY_BACKOFF_MAX_MS};
use crate::errors::{Error, Result};
use crate::goals::{GoalServiceTrait, ReconcileOutcome};

/// What a handler did with a message it accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Applied { changes: usize },
    Skipped { reason: String },
}

/// What the consumer should do with a message after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Done; remove it from the queue.
    Ack { outcome: HandlerOutcome },
    /// Never going to succeed; park it with a reason.
    DeadLetter { reason: String },
    /// Transient failure; make it visible again once `retry_after` has passed.
    Requeue { error: String, retry_after: Duration },
}

/// Redelivery delay after the `attempts`-th failed delivery: exponential from
/// [`RETRY_BACKOFF_BASE_MS`], capped at [`RETRY_BACKOFF_MAX_MS`].
pub fn retry_backoff(attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1).min(16);
    let delay = RETRY_BACKOFF_BASE_MS.saturating_mul(1u64 << exponent);
    Duration::from_millis(delay.min(RETRY_BACKOFF_MAX_MS))
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, routing_key: &str, payload: &str) -> Result<HandlerOutcome>;
}

/// Explicit registration table of handlers, built once at startup.
pub struct EventDispatcher {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
    max_attempts: u32,
}

impl EventDispatcher {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            handlers: HashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn register(mut self, routing_key: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(routing_key.into(), handler);
        self
    }

    pub fn routing_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn dispatch(&self, message: &QueuedMessage) -> Disposition {
        let Some(handler) = self.handlers.get(&message.routing_key) else {
            return Disposition::DeadLetter {
                reason: format!(
                    "no handler registered for routing key '{}'",
                    message.routing_key
                ),
            };
        };

        match handler.handle(&message.routing_key, &message.payload).await {
            Ok(outcome) => Disposition::Ack { outcome },
            Err(e @ (Error::MalformedEvent(_) | Error::Validation(_))) => Disposition::DeadLetter {
                reason: e.to_string(),
            },
            Err(e) if message.attempts >= self.max_attempts => Disposition::DeadLetter {
                reason: format!("giving up after {} attempts: {}", message.attempts, e),
            },
            Err(e) => Disposition::Requeue {
                error: e.to_string(),
                retry_after: retry_backoff(message.attempts),
            },
        }
    }
}

/// Reconciles the goals of the user named in a transaction event.
pub struct ReconcileGoalsHandler {
    goal_service: Arc<dyn GoalServiceTrait>,
}

impl ReconcileGoalsHandler {
    pub fn new(goal_service: Arc<dyn GoalServiceTrait>) -> Self {
        Self { goal_service }
    }
}

#[async_trait]
impl EventHandler for ReconcileGoalsHandler {
    async fn handle(&self, routing_key: &str, payload: &str) -> Result<HandlerOutcome> {
        let event = TransactionEvent::decode(payload)?;
        debug!(
            "Reconciling goals of user {} after {} (transaction {:?})",
            event.user_id, routing_key, event.transaction_id
        );

        match self.goal_service.reconcile_user_goals(&event.user_id).await? {
            ReconcileOutcome::Applied { examined, updated } => {
                info!(
                    "Reconciled goals of user {} after {}: {} examined, {} updated",
                    event.user_id, routing_key, examined, updated
                );
                Ok(HandlerOutcome::Applied { changes: updated })
            }
            ReconcileOutcome::Skipped { reason } => {
                warn!(
                    "Skipped reconciliation of user {} after {}: {}",
                    event.user_id, routing_key, reason
                );
                Ok(HandlerOutcome::Skipped { reason })
            }
        }
    }
}

/// The dispatcher the goal service runs with: both transaction routing keys
/// reconcile the user's goals.
pub fn transaction_event_dispatcher(
    goal_service: Arc<dyn GoalServiceTrait>,
    max_attempts: u32,
) -> EventDispatcher {
    let handler: Arc<dyn EventHandler> = Arc::new(ReconcileGoalsHandler::new(goal_service));
    TransactionEventKind::ALL
        .into_iter()
        .fold(EventDispatcher::new(max_attempts), |dispatcher, kind| {
            dispatcher.register(kind.routing_key(), handler.clone())
        })
}
