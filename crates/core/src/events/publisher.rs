//! Publishing into the topic exchange.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Notify;

use super::exchange::TopicExchange;
use super::queue::MessageQueueTrait;
use crate::errors::Result;

#[async_trait]
pub trait EventPublisherTrait: Send + Sync {
    /// Routes `payload` through the exchange and persists one copy per bound
    /// queue. Returns the number of queues the message landed on; zero means
    /// the routing key is unbound and the message was dropped.
    async fn publish_raw(&self, routing_key: &str, payload: &str) -> Result<usize>;
}

/// Publisher backed by a durable queue store.
///
/// Wakes the consumer through `notify` after every persisted message so it
/// does not have to wait for its next poll.
pub struct ExchangePublisher {
    exchange: Arc<TopicExchange>,
    queue: Arc<dyn MessageQueueTrait>,
    notify: Arc<Notify>,
}

impl ExchangePublisher {
    pub fn new(
        exchange: Arc<TopicExchange>,
        queue: Arc<dyn MessageQueueTrait>,
        notify: Arc<Notify>,
    ) -> Self {
        Self {
            exchange,
            queue,
            notify,
        }
    }
}

#[async_trait]
impl EventPublisherTrait for ExchangePublisher {
    async fn publish_raw(&self, routing_key: &str, payload: &str) -> Result<usize> {
        let queues = self.exchange.route(routing_key);
        if queues.is_empty() {
            info!(
                "No queue bound to '{}' on exchange '{}'; message dropped",
                routing_key,
                self.exchange.name()
            );
            return Ok(0);
        }

        for queue in &queues {
            let id = self.queue.enqueue(queue, routing_key, payload).await?;
            debug!("Enqueued message {} on '{}' ({})", id, queue, routing_key);
        }
        self.notify.notify_one();
        Ok(queues.len())
    }
}
