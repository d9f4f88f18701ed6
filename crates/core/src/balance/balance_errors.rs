use thiserror::Error;

/// Reasons a balance could not be obtained.
///
/// Every variant maps to the `BalanceUnavailable` condition. None of them is
/// retried within the same call.
#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("timed out after {timeout_ms}ms fetching balance for user {user_id}")]
    Timeout { user_id: String, timeout_ms: u64 },

    #[error("transaction service answered {status} for user {user_id}")]
    Status { user_id: String, status: u16 },

    #[error("malformed balance response for user {user_id}: {message}")]
    Malformed { user_id: String, message: String },

    #[error("network error fetching balance for user {user_id}: {message}")]
    Network { user_id: String, message: String },

    #[error("transaction service URL is not configured")]
    NotConfigured,

    #[error("could not build the transaction service HTTP client: {message}")]
    ClientBuild { message: String },
}

impl BalanceError {
    /// Short machine-friendly label, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BalanceError::Timeout { .. } => "timeout",
            BalanceError::Status { .. } => "status",
            BalanceError::Malformed { .. } => "malformed",
            BalanceError::Network { .. } => "network",
            BalanceError::NotConfigured => "not_configured",
            BalanceError::ClientBuild { .. } => "client_build",
        }
    }
}
