//! HTTP client for the transaction service's summary endpoint.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use super::{BalanceError, BalanceProviderTrait, BalanceSummary};
use crate::constants::{AMOUNT_DECIMAL_PLACES, BALANCE_SUMMARY_PATH};

/// Calls `GET {base_url}/transactions/summary/overall/{userId}`.
pub struct TransactionServiceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl TransactionServiceClient {
    /// Creates a client for the transaction service rooted at `base_url`.
    ///
    /// An empty base URL is a configuration error, reported as
    /// [`BalanceError::NotConfigured`]. A client that cannot be built with the
    /// timeout is reported as [`BalanceError::ClientBuild`].
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BalanceError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BalanceError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BalanceError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn summary_url(&self, user_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            BALANCE_SUMMARY_PATH,
            urlencoding::encode(user_id)
        )
    }

    fn classify(&self, user_id: &str, err: reqwest::Error) -> BalanceError {
        if err.is_timeout() {
            BalanceError::Timeout {
                user_id: user_id.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if err.is_decode() {
            BalanceError::Malformed {
                user_id: user_id.to_string(),
                message: err.to_string(),
            }
        } else {
            BalanceError::Network {
                user_id: user_id.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl BalanceProviderTrait for TransactionServiceClient {
    async fn fetch_balance(&self, user_id: &str) -> Result<BalanceSummary, BalanceError> {
        let url = self.summary_url(user_id);
        debug!("Fetching balance for user {} from {}", user_id, url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(user_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BalanceError::Status {
                user_id: user_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.classify(user_id, e))?;
        let summary = parse_summary(user_id, &body)?;

        debug!(
            "Fetched balance for user {}: {}",
            user_id, summary.balance
        );
        Ok(summary)
    }
}

/// Extracts a [`BalanceSummary`] from the endpoint's JSON body.
///
/// `balance` must be a JSON number. The totals are informational: a missing
/// or non-numeric total is reported as zero with a warning.
pub(crate) fn parse_summary(user_id: &str, body: &Value) -> Result<BalanceSummary, BalanceError> {
    let malformed = |message: String| BalanceError::Malformed {
        user_id: user_id.to_string(),
        message,
    };

    let object = body
        .as_object()
        .ok_or_else(|| malformed(format!("expected a JSON object, got {}", body)))?;

    let balance = match object.get("balance") {
        Some(value) => json_number_to_decimal(value)
            .ok_or_else(|| malformed(format!("'balance' is not a number: {}", value)))?,
        None => return Err(malformed("'balance' field is missing".to_string())),
    };

    let total = |field: &str| -> Decimal {
        match object.get(field).and_then(json_number_to_decimal) {
            Some(value) => value,
            None => {
                warn!(
                    "Balance summary for user {} has no numeric '{}', reporting 0",
                    user_id, field
                );
                Decimal::ZERO
            }
        }
    };

    Ok(BalanceSummary::new(
        total("totalIncome"),
        total("totalExpense"),
        balance,
    ))
}

/// Reads a JSON number through its decimal text, then truncates toward zero
/// to [`AMOUNT_DECIMAL_PLACES`]. Truncation never lifts a balance over a
/// target it has not reached.
fn json_number_to_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    let parsed = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    Some(parsed.round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::ToZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn client_for(server: &MockServer, timeout: Duration) -> TransactionServiceClient {
        TransactionServiceClient::new(&server.base_url(), timeout).unwrap()
    }

    #[test]
    fn test_empty_base_url_is_not_configured() {
        let result = TransactionServiceClient::new("   ", Duration::from_secs(5));
        assert!(matches!(result, Err(BalanceError::NotConfigured)));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client =
            TransactionServiceClient::new("http://tx:3002/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://tx:3002");
        assert_eq!(
            client.summary_url("u-1"),
            "http://tx:3002/transactions/summary/overall/u-1"
        );
    }

    #[tokio::test]
    async fn test_fetch_balance_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(Method::GET)
                    .path("/transactions/summary/overall/user-1");
                then.status(200).json_body(json!({
                    "totalIncome": 1000.5,
                    "totalExpense": 580.25,
                    "balance": 420.25
                }));
            })
            .await;

        let summary = client_for(&server, Duration::from_secs(5))
            .fetch_balance("user-1")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(summary.balance, dec!(420.25));
        assert_eq!(summary.total_income, dec!(1000.5));
        assert_eq!(summary.total_expense, dec!(580.25));
    }

    #[tokio::test]
    async fn test_negative_balance_is_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET)
                    .path("/transactions/summary/overall/user-1");
                then.status(200).json_body(json!({
                    "totalIncome": 100,
                    "totalExpense": 150,
                    "balance": -50
                }));
            })
            .await;

        let summary = client_for(&server, Duration::from_secs(5))
            .fetch_balance("user-1")
            .await
            .unwrap();
        assert_eq!(summary.balance, dec!(-50));
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(503);
            })
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .fetch_balance("user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, BalanceError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_non_numeric_balance_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(200)
                    .json_body(json!({"totalIncome": 1, "totalExpense": 0, "balance": "1"}));
            })
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .fetch_balance("user-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(200).body("not json");
            })
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .fetch_balance("user-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET);
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({"totalIncome": 1, "totalExpense": 0, "balance": 1}));
            })
            .await;

        let err = client_for(&server, Duration::from_millis(50))
            .fetch_balance("user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, BalanceError::Timeout { timeout_ms: 50, .. }));
    }

    #[test]
    fn test_parse_summary_missing_balance() {
        let err = parse_summary("u", &json!({"totalIncome": 5})).unwrap_err();
        assert!(matches!(err, BalanceError::Malformed { .. }));
    }

    #[test]
    fn test_sub_cent_balance_is_truncated_not_rounded_up() {
        let summary = parse_summary("u", &json!({"balance": 499.996})).unwrap();
        assert_eq!(summary.balance, dec!(499.99));

        let summary = parse_summary("u", &json!({"balance": -10.129})).unwrap();
        assert_eq!(summary.balance, dec!(-10.12));

        let summary = parse_summary("u", &json!({"balance": 1e3})).unwrap();
        assert_eq!(summary.balance, dec!(1000));
    }

    #[test]
    fn test_parse_summary_tolerates_missing_totals() {
        let summary = parse_summary("u", &json!({"balance": 12.5})).unwrap();
        assert_eq!(summary.balance, dec!(12.5));
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
    }
}
