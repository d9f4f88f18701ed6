//! Balance module - the synchronous query against the transaction service.
//!
//! The goal service never stores balances. Every enrichment pass asks the
//! transaction service for the user's current summary through
//! [`BalanceProviderTrait`].

mod balance_client;
mod balance_errors;
mod balance_model;
mod balance_traits;

pub use balance_client::TransactionServiceClient;
pub use balance_errors::BalanceError;
pub use balance_model::BalanceSummary;
pub use balance_traits::BalanceProviderTrait;
