//! Background consumer of the durable transaction event queues.
//!
//! Claims messages in batches, dispatches each one on its own task through
//! the handler registration table, then acknowledges, requeues or
//! dead-letters it according to the handler's verdict.

mod queue_worker;

pub use queue_worker::{drain_once, process_message, run_consumer, ConsumerDeps};
