mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{new_goal, TestApp, ALICE};
use fintrack_goal_server::consumer::{drain_once, run_consumer};
use serde_json::json;
use tokio::sync::watch;

const LEASE: Duration = Duration::from_secs(30);

async fn drain(app: &TestApp) -> usize {
    drain_once(
        app.state.message_queue.as_ref(),
        &app.state.dispatcher,
        10,
        LEASE,
    )
    .await
    .unwrap()
}

fn transaction_payload(user_id: &str) -> String {
    json!({
        "userId": user_id,
        "amount": 20,
        "transactionType": "expense",
        "transactionId": "7d0b5bd4-3f51-4c59-a7a4-1f4c3c1f2b11"
    })
    .to_string()
}

#[tokio::test]
async fn transaction_deleted_event_regresses_completed_goal() {
    let app = TestApp::start().await;
    let mut balance = app.serve_balance(ALICE, 500.0).await;
    let (_, created) = app
        .send("POST", "/api/v1/goals", Some(ALICE), Some(new_goal(ALICE, "Laptop", 500.0)))
        .await;
    assert_eq!(created["status"], "completed");
    let goal_id = created["id"].as_str().unwrap().to_string();

    balance.delete_async().await;
    balance = app.serve_balance(ALICE, 480.0).await;

    let (status, receipt) = app
        .post_raw("/api/v1/exchange/transaction.deleted", &transaction_payload(ALICE))
        .await;
    assert_eq!(status, 202);
    assert_eq!(receipt["routedTo"], 1);
    assert_eq!(receipt["exchange"], "finance_exchange");

    assert_eq!(drain(&app).await, 1);

    // Read back with the balance source down so only persisted values show.
    balance.delete_async().await;
    let _stall = app.stall_balance(ALICE).await;
    let (status, goal) = app
        .send("GET", &format!("/api/v1/goals/{}/user/{}", goal_id, ALICE), Some(ALICE), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(goal["status"], "in_progress");
    assert_eq!(goal["currentAmount"].as_f64().unwrap(), 480.0);

    let (_, queues) = app.send("GET", "/api/v1/exchange/status", None, None).await;
    assert_eq!(queues["pendingMessages"], 0);
    assert!(queues["deadLetters"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn replayed_event_is_idempotent() {
    let app = TestApp::start().await;
    let _balance = app.serve_balance(ALICE, 650.0).await;
    let (_, created) = app
        .send("POST", "/api/v1/goals", Some(ALICE), Some(new_goal(ALICE, "Sofa", 600.0)))
        .await;
    let goal_id = created["id"].as_str().unwrap().to_string();

    for _ in 0..3 {
        app.post_raw("/api/v1/exchange/transaction.created", &transaction_payload(ALICE))
            .await;
    }
    assert_eq!(drain(&app).await, 3);

    let (_, goal) = app
        .send("GET", &format!("/api/v1/goals/{}/user/{}", goal_id, ALICE), Some(ALICE), None)
        .await;
    assert_eq!(goal["status"], "completed");
    assert_eq!(goal["currentAmount"].as_f64().unwrap(), 650.0);
    assert_eq!(goal["goalName"], "Sofa");
}

#[tokio::test]
async fn event_without_balance_is_skipped_and_acknowledged() {
    let app = TestApp::start().await;
    let mut balance = app.serve_balance(ALICE, 100.0).await;
    let (_, created) = app
        .send("POST", "/api/v1/goals", Some(ALICE), Some(new_goal(ALICE, "Phone", 90.0)))
        .await;
    assert_eq!(created["status"], "completed");
    balance.delete_async().await;
    let _stall = app.stall_balance(ALICE).await;

    app.post_raw("/api/v1/exchange/transaction.deleted", &transaction_payload(ALICE))
        .await;
    assert_eq!(drain(&app).await, 1);

    let (_, queues) = app.send("GET", "/api/v1/exchange/status", None, None).await;
    assert_eq!(queues["pendingMessages"], 0);
    assert!(queues["deadLetters"].as_array().unwrap().is_empty());

    let (_, goal) = app
        .send(
            "GET",
            &format!("/api/v1/goals/{}/user/{}", created["id"].as_str().unwrap(), ALICE),
            Some(ALICE),
            None,
        )
        .await;
    assert_eq!(goal["status"], "completed");
}

#[tokio::test]
async fn malformed_events_are_dead_lettered() {
    let app = TestApp::start().await;

    let (status, _) = app
        .post_raw("/api/v1/exchange/transaction.created", "not json")
        .await;
    assert_eq!(status, 400);

    let (status, _) = app
        .post_raw("/api/v1/exchange/transaction.created", r#"{"amount": 12}"#)
        .await;
    assert_eq!(status, 202);
    assert_eq!(drain(&app).await, 1);

    let (_, queues) = app.send("GET", "/api/v1/exchange/status", None, None).await;
    assert_eq!(queues["pendingMessages"], 0);
    let dead = queues["deadLetters"].as_array().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0]["routingKey"], "transaction.created");
    assert_eq!(dead[0]["queue"], "goal_service_transaction_created_queue");
    assert!(dead[0]["reason"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn unrouted_keys_are_accepted_and_dropped() {
    let app = TestApp::start().await;
    let (status, receipt) = app
        .post_raw("/api/v1/exchange/transaction.updated", &transaction_payload(ALICE))
        .await;
    assert_eq!(status, 202);
    assert_eq!(receipt["routedTo"], 0);
    assert_eq!(app.state.message_queue.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn background_consumer_processes_and_stops() {
    let app = TestApp::start().await;
    let _balance = app.serve_balance(ALICE, 50.0).await;
    app.send("POST", "/api/v1/goals", Some(ALICE), Some(new_goal(ALICE, "Books", 40.0)))
        .await;

    let mut deps = app.state.consumer_deps(&app.config);
    deps.poll_interval = Duration::from_millis(50);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = tokio::spawn(run_consumer(Arc::new(deps), shutdown_rx));

    app.post_raw("/api/v1/exchange/transaction.created", &transaction_payload(ALICE))
        .await;

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while app.state.message_queue.pending_count().unwrap() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "consumer did not drain the queue");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .unwrap()
        .unwrap();
}
