use async_trait::async_trait;

use super::{BalanceError, BalanceSummary};

/// Source of a user's live balance.
#[async_trait]
pub trait BalanceProviderTrait: Send + Sync {
    /// Fetches the current summary for `user_id`.
    ///
    /// Implementations must fail with a [`BalanceError`] instead of returning
    /// a zero balance when the answer is unknown.
    async fn fetch_balance(&self, user_id: &str) -> Result<BalanceSummary, BalanceError>;
}
