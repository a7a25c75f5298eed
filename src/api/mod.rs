//! Backend client for the TradeHub wallet service
//!
//! The REST contract lives behind the `BackendClient` trait so flows can be
//! driven against the HTTP implementation or an in-memory double. Envelope
//! decoding, bearer injection and the 401 credential wipe all live inside the
//! implementation; callers see decoded payloads and typed errors only.

use async_trait::async_trait;

use crate::api::types::{
    AddMoneyRequest, AuthData, BankAccount, LoginOtpRequest, NewBankAccount, SignupOtpRequest,
    TransactionPage, TransactionQuery, UserProfile, VerifyLoginOtpRequest, VerifySignupOtpRequest,
    WithdrawData, WithdrawRequest,
};
use crate::error::Result;

pub mod http;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use http::HttpBackendClient;

/// Operations the wallet backend exposes.
///
/// Mutating endpoints answer with a human-readable message (when the backend
/// sends one); read endpoints answer with the decoded `data` payload.
#[async_trait]
pub trait BackendClient: Send + Sync {
    // Auth
    async fn send_signup_otp(&self, request: &SignupOtpRequest) -> Result<Option<String>>;
    async fn verify_signup_otp(&self, request: &VerifySignupOtpRequest) -> Result<AuthData>;
    async fn resend_signup_otp(&self, request: &SignupOtpRequest) -> Result<Option<String>>;
    async fn send_login_otp(&self, request: &LoginOtpRequest) -> Result<Option<String>>;
    async fn verify_login_otp(&self, request: &VerifyLoginOtpRequest) -> Result<AuthData>;
    async fn resend_login_otp(&self, request: &LoginOtpRequest) -> Result<Option<String>>;

    // Profile
    async fn get_user_profile(&self) -> Result<UserProfile>;

    // Bank accounts
    async fn get_bank_accounts(&self) -> Result<Vec<BankAccount>>;
    async fn add_bank_account(&self, account: &NewBankAccount) -> Result<Option<String>>;
    async fn delete_bank_account(&self, id: &str) -> Result<Option<String>>;
    async fn set_primary_bank_account(&self, id: &str) -> Result<Option<String>>;

    // Money movement
    async fn withdraw_money(&self, request: &WithdrawRequest) -> Result<WithdrawData>;
    async fn add_money(&self, request: &AddMoneyRequest) -> Result<Option<String>>;
    async fn get_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage>;
}
