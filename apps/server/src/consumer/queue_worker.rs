use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify, Semaphore};
use tokio::task::JoinSet;

use fintrack_core::events::{
    Disposition, EventDispatcher, HandlerOutcome, MessageQueueTrait, QueuedMessage,
};

/// Dependencies of the consumer loop.
pub struct ConsumerDeps {
    pub queue: Arc<dyn MessageQueueTrait>,
    pub dispatcher: Arc<EventDispatcher>,
    pub notify: Arc<Notify>,
    /// Maximum number of messages in flight.
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub lease: Duration,
}

/// Runs the consumer until `shutdown` flips to `true`.
///
/// Idle waits end on whichever comes first: a publish notification, the
/// poll interval, a finished task freeing a slot, or shutdown. On shutdown no
/// new messages are claimed and in-flight ones are awaited; anything still
/// queued is picked up on the next start.
pub async fn run_consumer(deps: Arc<ConsumerDeps>, mut shutdown: watch::Receiver<bool>) {
    tracing::info!(
        "Queue consumer started (concurrency {}, poll {:?}, lease {:?})",
        deps.concurrency,
        deps.poll_interval,
        deps.lease
    );

    let slots = Arc::new(Semaphore::new(deps.concurrency.max(1)));
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let free = slots.available_permits();
        let mut saturated = false;
        if free > 0 {
            match deps.queue.claim(free, deps.lease).await {
                Ok(messages) => {
                    saturated = messages.len() == free;
                    for message in messages {
                        let Ok(permit) = slots.clone().acquire_owned().await else {
                            break;
                        };
                        let worker = deps.clone();
                        in_flight.spawn(async move {
                            let _permit = permit;
                            process_message(worker.queue.as_ref(), &worker.dispatcher, message)
                                .await;
                        });
                    }
                }
                Err(e) => tracing::error!("Failed to claim queued messages: {}", e),
            }
        }

        if saturated && slots.available_permits() > 0 {
            // A full batch suggests more work is waiting.
            continue;
        }

        tokio::select! {
            _ = deps.notify.notified() => {}
            _ = tokio::time::sleep(deps.poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("Message task failed: {}", e);
                }
            }
        }
    }

    tracing::info!(
        "Queue consumer stopping; waiting for {} in-flight message(s)",
        in_flight.len()
    );
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Message task failed: {}", e);
        }
    }
    tracing::info!("Queue consumer stopped");
}

/// Dispatches one claimed message and settles it on the queue.
pub async fn process_message(
    queue: &dyn MessageQueueTrait,
    dispatcher: &EventDispatcher,
    message: QueuedMessage,
) -> Disposition {
    let disposition = dispatcher.dispatch(&message).await;

    let settled = match &disposition {
        Disposition::Ack { outcome } => {
            match outcome {
                HandlerOutcome::Applied { changes } => tracing::debug!(
                    "Message {} ({}) applied with {} change(s)",
                    message.id,
                    message.routing_key,
                    changes
                ),
                HandlerOutcome::Skipped { reason } => tracing::warn!(
                    "Message {} ({}) skipped: {}",
                    message.id,
                    message.routing_key,
                    reason
                ),
            }
            queue.ack(message.id).await
        }
        Disposition::DeadLetter { reason } => {
            tracing::error!(
                "Message {} ({}) from '{}' dead-lettered after {} attempt(s): {}",
                message.id,
                message.routing_key,
                message.queue,
                message.attempts,
                reason
            );
            queue.dead_letter(message.id, reason).await
        }
        Disposition::Requeue { error, retry_after } => {
            tracing::warn!(
                "Message {} ({}) failed on attempt {}/{}, retrying in {:?}: {}",
                message.id,
                message.routing_key,
                message.attempts,
                dispatcher.max_attempts(),
                retry_after,
                error
            );
            queue.release(message.id, error, *retry_after).await
        }
    };

    if let Err(e) = settled {
        // The lease will expire and the message will be redelivered.
        tracing::error!("Failed to settle message {}: {}", message.id, e);
    }
    disposition
}

/// Claims and processes everything currently claimable, one message at a
/// time. Requeued messages wait out their retry delay and are left for a
/// later call. Returns the number of deliveries processed.
pub async fn drain_once(
    queue: &dyn MessageQueueTrait,
    dispatcher: &EventDispatcher,
    batch_size: usize,
    lease: Duration,
) -> fintrack_core::Result<usize> {
    let mut processed = 0;
    loop {
        let messages = queue.claim(batch_size.max(1), lease).await?;
        if messages.is_empty() {
            return Ok(processed);
        }
        for message in messages {
            process_message(queue, dispatcher, message).await;
            processed += 1;
        }
    }
}
