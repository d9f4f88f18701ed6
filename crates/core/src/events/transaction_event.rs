//! Transaction event payloads published by the transaction service.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{TRANSACTION_CREATED_ROUTING_KEY, TRANSACTION_DELETED_ROUTING_KEY};
use crate::errors::{Error, Result};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// The routing keys the goal service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEventKind {
    Created,
    Deleted,
}

impl TransactionEventKind {
    pub const ALL: [TransactionEventKind; 2] =
        [TransactionEventKind::Created, TransactionEventKind::Deleted];

    pub fn routing_key(&self) -> &'static str {
        match self {
            TransactionEventKind::Created => TRANSACTION_CREATED_ROUTING_KEY,
            TransactionEventKind::Deleted => TRANSACTION_DELETED_ROUTING_KEY,
        }
    }
}

/// Payload of `transaction.created` and `transaction.deleted`.
///
/// Only `user_id` drives reconciliation. The other fields are informational
/// and tolerated when absent or oddly typed, since the balance is always
/// re-fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    pub user_id: String,
    pub amount: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub transaction_id: Option<String>,
}

impl TransactionEvent {
    /// Decodes a raw message body.
    ///
    /// Fails with [`Error::MalformedEvent`] when the body is not a JSON object
    /// or carries no usable `userId`.
    pub fn decode(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| Error::MalformedEvent(format!("payload is not valid JSON: {}", e)))?;
        let Value::Object(fields) = value else {
            return Err(Error::MalformedEvent(
                "payload is not a JSON object".to_string(),
            ));
        };

        let user_id = match fields.get("userId") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(_) => {
                return Err(Error::MalformedEvent(
                    "userId must be a non-empty string".to_string(),
                ))
            }
            None => return Err(Error::MalformedEvent("userId is missing".to_string())),
        };

        Ok(Self {
            user_id,
            amount: fields.get("amount").and_then(decimal_from_json),
            transaction_type: fields
                .get("transactionType")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            transaction_id: fields.get("transactionId").and_then(|v| match v {
                Value::String(id) => Some(id.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        })
    }
}

/// Amounts arrive either as JSON numbers or as decimal strings.
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_full_payload() {
        let event = TransactionEvent::decode(
            r#"{"userId":"u-1","amount":"120.50","transactionType":"expense","transactionId":"t-9"}"#,
        )
        .unwrap();

        assert_eq!(event.user_id, "u-1");
        assert_eq!(event.amount, Some(dec!(120.50)));
        assert_eq!(event.transaction_type, Some(TransactionType::Expense));
        assert_eq!(event.transaction_id.as_deref(), Some("t-9"));
    }

    #[test]
    fn test_decode_tolerates_missing_details() {
        let event = TransactionEvent::decode(r#"{"userId":"u-1","amount":42}"#).unwrap();
        assert_eq!(event.amount, Some(dec!(42)));
        assert!(event.transaction_type.is_none());
        assert!(event.transaction_id.is_none());
    }

    #[test]
    fn test_decode_rejects_unusable_payloads() {
        for payload in [
            "not json",
            "[1,2]",
            r#"{"amount":10}"#,
            r#"{"userId":""}"#,
            r#"{"userId":  "   "}"#,
            r#"{"userId":17}"#,
        ] {
            let err = TransactionEvent::decode(payload).unwrap_err();
            assert!(
                matches!(err, Error::MalformedEvent(_)),
                "expected malformed event for {payload}"
            );
        }
    }

    #[test]
    fn test_routing_keys() {
        let keys: Vec<&str> = TransactionEventKind::ALL
            .iter()
            .map(TransactionEventKind::routing_key)
            .collect();
        assert_eq!(keys, vec!["transaction.created", "transaction.deleted"]);
    }

    #[test]
    fn test_decode_ignores_unknown_transaction_type() {
        let event =
            TransactionEvent::decode(r#"{"userId":"u-1","transactionType":"refund","transactionId":7}"#)
                .unwrap();
        assert!(event.transaction_type.is_none());
        assert_eq!(event.transaction_id.as_deref(), Some("7"));
    }
}
