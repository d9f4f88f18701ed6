//! Balance domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Financial summary of a user as computed by the transaction service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// `total_income - total_expense`. May be negative.
    pub balance: Decimal,
}

impl BalanceSummary {
    pub fn new(total_income: Decimal, total_expense: Decimal, balance: Decimal) -> Self {
        Self {
            total_income,
            total_expense,
            balance,
        }
    }
}
