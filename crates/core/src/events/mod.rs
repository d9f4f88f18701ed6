//! Transaction events module.
//!
//! Carries transaction events from the exchange into the goal domain. The
//! exchange routes a published message into durable queues, the consumer
//! claims queued messages, and the dispatcher hands each one to the handler
//! registered for its routing key.

mod dispatcher;
mod exchange;
mod publisher;
mod queue;
mod transaction_event;

pub use dispatcher::{
    retry_backoff, transaction_event_dispatcher, Disposition, EventDispatcher, EventHandler, HandlerOutcome,
    ReconcileGoalsHandler,
};
pub use exchange::{topic_matches, Binding, TopicExchange};
pub use publisher::{EventPublisherTrait, ExchangePublisher};
pub use queue::{DeadLetter, MessageQueueTrait, QueuedMessage};
pub use transaction_event::{TransactionEvent, TransactionEventKind, TransactionType};
