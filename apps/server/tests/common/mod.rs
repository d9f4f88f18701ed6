#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use fintrack_goal_server::{api::app_router, build_state, config::Config, AppState};
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ALICE: &str = "03c73555-77c7-4037-90e8-f0316862f8a7";
pub const BOB: &str = "5d1f0c3e-2f55-4b8e-9f43-8c1f3a9e7b21";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub config: Config,
    pub transactions: MockServer,
    _dir: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let transactions = MockServer::start_async().await;
        let mut config = Config::with_defaults(
            dir.path().join("goals.db").to_string_lossy().to_string(),
            transactions.base_url(),
        );
        config.balance_timeout = std::time::Duration::from_millis(300);
        let state = build_state(&config).await.unwrap();
        let router = app_router(state.clone(), &config);
        Self {
            router,
            state,
            config,
            transactions,
            _dir: dir,
        }
    }

    /// Serves `balance` as the user's summary until the returned mock is deleted.
    pub async fn serve_balance(&self, user_id: &str, balance: f64) -> Mock<'_> {
        let path = format!("/transactions/summary/overall/{}", user_id);
        self.transactions
            .mock_async(|when, then| {
                when.method(Method::GET).path(path.as_str());
                then.status(200).json_body(json!({
                    "totalIncome": balance.max(0.0),
                    "totalExpense": (-balance).max(0.0),
                    "balance": balance
                }));
            })
            .await
    }

    /// Makes the user's summary endpoint respond slower than the client timeout.
    pub async fn stall_balance(&self, user_id: &str) -> Mock<'_> {
        let path = format!("/transactions/summary/overall/{}", user_id);
        self.transactions
            .mock_async(|when, then| {
                when.method(Method::GET).path(path.as_str());
                then.status(200)
                    .delay(std::time::Duration::from_millis(1_500))
                    .json_body(json!({"totalIncome": 0, "totalExpense": 0, "balance": 0}));
            })
            .await
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header("X-User-Id", caller);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }
}

impl TestApp {
    /// Posts a raw body, bypassing JSON encoding.
    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

pub fn new_goal(user_id: &str, name: &str, target: f64) -> Value {
    json!({
        "userId": user_id,
        "goalName": name,
        "targetAmount": target,
        "deadline": "2026-12-31"
    })
}
