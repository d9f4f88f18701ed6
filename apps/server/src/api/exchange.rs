use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fintrack_core::events::{Binding, DeadLetter};
use fintrack_core::Error as CoreError;
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishReceipt {
    exchange: String,
    routing_key: String,
    /// Number of durable queues the message was persisted to.
    routed_to: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeStatus {
    exchange: String,
    bindings: Vec<Binding>,
    pending_messages: i64,
    dead_letters: Vec<DeadLetter>,
}

/// Publishes a message onto the exchange. The body is stored as-is once it
/// is known to be JSON; payload-level problems surface later as dead letters.
async fn publish(
    State(state): State<Arc<AppState>>,
    Path(routing_key): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PublishReceipt>)> {
    let payload = std::str::from_utf8(&body)
        .map_err(|_| CoreError::MalformedEvent("body is not UTF-8".to_string()))?;
    serde_json::from_str::<serde_json::Value>(payload)
        .map_err(|e| CoreError::MalformedEvent(format!("body is not valid JSON: {}", e)))?;

    let routed_to = state.publisher.publish_raw(&routing_key, payload).await?;
    if routed_to == 0 {
        tracing::info!("Accepted unrouted message with key '{}'", routing_key);
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(PublishReceipt {
            exchange: state.exchange.name().to_string(),
            routing_key,
            routed_to,
        }),
    ))
}

async fn status(State(state): State<Arc<AppState>>) -> ApiResult<Json<ExchangeStatus>> {
    Ok(Json(ExchangeStatus {
        exchange: state.exchange.name().to_string(),
        bindings: state.exchange.bindings().to_vec(),
        pending_messages: state.message_queue.pending_count()?,
        dead_letters: state.message_queue.list_dead_letters()?,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exchange/status", get(status))
        .route("/exchange/{routing_key}", post(publish))
}
