//! SQLite-backed durable message queue.

mod model;
mod repository;

pub use model::{DeadLetterDB, NewQueueMessageDB, QueueMessageDB};
pub use repository::SqliteMessageQueue;
