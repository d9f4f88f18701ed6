use std::sync::Arc;

use tokio::sync::Notify;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};
use crate::consumer::ConsumerDeps;
use fintrack_core::{
    balance::TransactionServiceClient,
    constants::{
        EXCHANGE_NAME, TRANSACTION_CREATED_QUEUE, TRANSACTION_CREATED_ROUTING_KEY,
        TRANSACTION_DELETED_QUEUE, TRANSACTION_DELETED_ROUTING_KEY,
    },
    events::{
        transaction_event_dispatcher, EventDispatcher, EventPublisherTrait, ExchangePublisher,
        MessageQueueTrait, TopicExchange,
    },
    goals::{GoalService, GoalServiceTrait},
};
use fintrack_storage_sqlite::{
    db::{self, write_actor},
    goals::GoalRepository,
    messaging::SqliteMessageQueue,
};

pub struct AppState {
    pub goal_service: Arc<dyn GoalServiceTrait>,
    pub publisher: Arc<dyn EventPublisherTrait>,
    pub message_queue: Arc<dyn MessageQueueTrait>,
    pub exchange: Arc<TopicExchange>,
    pub dispatcher: Arc<EventDispatcher>,
    /// Wakes the consumer when a message is published.
    pub queue_notify: Arc<Notify>,
}

impl AppState {
    /// Everything the background consumer needs, sized by `config`.
    pub fn consumer_deps(&self, config: &Config) -> ConsumerDeps {
        ConsumerDeps {
            queue: self.message_queue.clone(),
            dispatcher: self.dispatcher.clone(),
            notify: self.queue_notify.clone(),
            concurrency: config.consumer_concurrency,
            poll_interval: config.consumer_poll_interval,
            lease: config.consumer_lease,
        }
    }
}

pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// The exchange topology the goal service declares on startup.
pub fn goal_service_exchange() -> TopicExchange {
    TopicExchange::new(EXCHANGE_NAME)
        .bind(TRANSACTION_CREATED_ROUTING_KEY, TRANSACTION_CREATED_QUEUE)
        .bind(TRANSACTION_DELETED_ROUTING_KEY, TRANSACTION_DELETED_QUEUE)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let balance_client =
        TransactionServiceClient::new(&config.transaction_service_url, config.balance_timeout)?;
    tracing::info!(
        "Transaction service at {} (balance timeout {:?})",
        balance_client.base_url(),
        config.balance_timeout
    );

    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer.clone()));
    let goal_service: Arc<dyn GoalServiceTrait> =
        Arc::new(GoalService::new(goal_repository, Arc::new(balance_client)));

    let message_queue: Arc<dyn MessageQueueTrait> =
        Arc::new(SqliteMessageQueue::new(pool.clone(), writer));
    let exchange = Arc::new(goal_service_exchange());
    for binding in exchange.bindings() {
        tracing::info!(
            "Exchange '{}' routes '{}' to queue '{}'",
            exchange.name(),
            binding.pattern,
            binding.queue
        );
    }

    let queue_notify = Arc::new(Notify::new());
    let publisher: Arc<dyn EventPublisherTrait> = Arc::new(ExchangePublisher::new(
        exchange.clone(),
        message_queue.clone(),
        queue_notify.clone(),
    ));
    let dispatcher = Arc::new(transaction_event_dispatcher(
        goal_service.clone(),
        config.consumer_max_attempts,
    ));
    tracing::info!("Event handlers registered for {:?}", dispatcher.routing_keys());

    Ok(Arc::new(AppState {
        goal_service,
        publisher,
        message_queue,
        exchange,
        dispatcher,
        queue_notify,
    }))
}
