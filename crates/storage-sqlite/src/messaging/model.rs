//! Database models for queued and dead-lettered messages.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use fintrack_core::events::{DeadLetter, QueuedMessage};

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::queue_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QueueMessageDB {
    pub id: i64,
    pub queue: String,
    pub routing_key: String,
    pub payload: String,
    pub attempts: i32,
    pub lease_until: Option<NaiveDateTime>,
    pub last_error: Option<String>,
    pub enqueued_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::queue_messages)]
pub struct NewQueueMessageDB {
    pub queue: String,
    pub routing_key: String,
    pub payload: String,
    pub enqueued_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::dead_letters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DeadLetterDB {
    pub id: i64,
    pub queue: String,
    pub routing_key: String,
    pub payload: String,
    pub attempts: i32,
    pub reason: String,
    pub enqueued_at: NaiveDateTime,
    pub dead_lettered_at: NaiveDateTime,
}

impl DeadLetterDB {
    pub fn from_message(message: QueueMessageDB, reason: String, at: NaiveDateTime) -> Self {
        Self {
            id: message.id,
            queue: message.queue,
            routing_key: message.routing_key,
            payload: message.payload,
            attempts: message.attempts,
            reason,
            enqueued_at: message.enqueued_at,
            dead_lettered_at: at,
        }
    }
}

impl From<QueueMessageDB> for QueuedMessage {
    fn from(db: QueueMessageDB) -> Self {
        Self {
            id: db.id,
            queue: db.queue,
            routing_key: db.routing_key,
            payload: db.payload,
            attempts: u32::try_from(db.attempts).unwrap_or(0),
            enqueued_at: db.enqueued_at,
        }
    }
}

impl From<DeadLetterDB> for DeadLetter {
    fn from(db: DeadLetterDB) -> Self {
        Self {
            id: db.id,
            queue: db.queue,
            routing_key: db.routing_key,
            payload: db.payload,
            attempts: u32::try_from(db.attempts).unwrap_or(0),
            reason: db.reason,
            enqueued_at: db.enqueued_at,
            dead_lettered_at: db.dead_lettered_at,
        }
    }
}
