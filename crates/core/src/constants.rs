/// Topic exchange the transaction service publishes to.
pub const EXCHANGE_NAME: &str = "finance_exchange";

/// Routing key emitted after a transaction is committed.
pub const TRANSACTION_CREATED_ROUTING_KEY: &str = "transaction.created";

/// Routing key emitted after a transaction is deleted.
pub const TRANSACTION_DELETED_ROUTING_KEY: &str = "transaction.deleted";

/// Durable queue bound to `transaction.created`.
pub const TRANSACTION_CREATED_QUEUE: &str = "goal_service_transaction_created_queue";

/// Durable queue bound to `transaction.deleted`.
pub const TRANSACTION_DELETED_QUEUE: &str = "goal_service_transaction_deleted_queue";

/// Delay before the first redelivery of a requeued message, in milliseconds.
/// Doubles with every further attempt.
pub const RETRY_BACKOFF_BASE_MS: u64 = 1_000;

/// Upper bound on the redelivery delay, in milliseconds.
pub const RETRY_BACKOFF_MAX_MS: u64 = 60_000;

/// Default timeout for the balance summary call, in milliseconds.
pub const DEFAULT_BALANCE_TIMEOUT_MS: u64 = 5_000;

/// Path of the balance summary endpoint on the transaction service.
pub const BALANCE_SUMMARY_PATH: &str = "/transactions/summary/overall";

/// Decimal places allowed for monetary amounts.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;
