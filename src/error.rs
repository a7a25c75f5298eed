//! Error types for the wallet client

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wallet client
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Local input validation errors (rejected before any request is made)
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    // Backend API errors
    #[error("{message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Network error. Please check your connection.")]
    Network(String),

    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("Backend returned an empty payload")]
    EmptyResponse,

    // Auth flow errors
    #[error("Please wait {remaining_secs}s before requesting another OTP")]
    ResendCooldown { remaining_secs: u64 },

    // Bank account registry errors
    #[error("Maximum {max} bank accounts allowed")]
    AccountLimitReached { max: usize },

    #[error("Bank account not found: {0}")]
    AccountNotFound(String),

    // Withdrawal guard errors
    #[error("Minimum withdrawal amount is ₹{minimum}")]
    BelowMinimum { minimum: Decimal },

    #[error("Insufficient balance: ₹{available} available, ₹{required} requested")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    #[error("No bank account selected")]
    NoAccountSelected,

    #[error("Balance changed, please re-enter the amount")]
    BalanceChanged { available: Decimal },

    #[error("A withdrawal is already being submitted")]
    SubmissionInFlight,

    #[error("Withdrawal flow: {0}")]
    FlowState(String),

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error means the session is gone and credentials were wiped
    pub fn is_auth_expiry(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }

    /// Check if this error is transient connectivity (cached data may be shown)
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Check if this error was raised locally, before any request went out
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput { .. }
                | Error::AccountLimitReached { .. }
                | Error::ResendCooldown { .. }
        )
    }

    /// Check if this error is a withdrawal guard rejection
    pub fn is_withdrawal_block(&self) -> bool {
        matches!(
            self,
            Error::BelowMinimum { .. }
                | Error::InsufficientBalance { .. }
                | Error::NoAccountSelected
                | Error::BalanceChanged { .. }
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
