//! HTTP implementation of the backend contract
//!
//! One reqwest client with an instance-wide timeout. Every request carries the
//! stored bearer token when one exists. A 401 from any endpoint wipes the
//! credential store before the error is returned, so the next caller sees a
//! clean logged-out state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::types::{
    AddMoneyRequest, ApiEnvelope, ApiErrorBody, AuthData, BankAccount, BankAccountsData,
    LoginOtpRequest, NewBankAccount, SignupOtpRequest, Transaction, TransactionPage,
    TransactionQuery, UserProfile, VerifyLoginOtpRequest, VerifySignupOtpRequest, WithdrawData,
    WithdrawRequest,
};
use crate::api::BackendClient;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::store::CredentialStore;

const SIGNUP_SEND_OTP: &str = "/auth/signup/send-otp";
const SIGNUP_VERIFY_OTP: &str = "/auth/signup/verify-otp";
const SIGNUP_RESEND_OTP: &str = "/auth/signup/resend-otp";
const LOGIN_SEND_OTP: &str = "/auth/login/send-otp";
const LOGIN_VERIFY_OTP: &str = "/auth/login/verify-otp";
const LOGIN_RESEND_OTP: &str = "/auth/login/resend-otp";
const PROFILE: &str = "/auth/profile";
const BANK_ACCOUNTS: &str = "/bank-accounts";
const WALLET_WITHDRAW: &str = "/wallet/withdraw";
const WALLET_ADD_MONEY: &str = "/wallet/add-money";
const WALLET_TRANSACTIONS: &str = "/wallet/transactions";

/// Message shown when the backend gives us nothing better
const GENERIC_FAILURE: &str = "Something went wrong";

pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
}

impl HttpBackendClient {
    pub fn new(config: &ApiConfig, store: Arc<CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a prepared request and decode the response envelope
    async fn dispatch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<ApiEnvelope<T>> {
        let builder = match self.store.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let request = builder
            .build()
            .map_err(|e| Error::Config(format!("Invalid request: {}", e)))?;
        debug!("{} {}", request.method(), request.url().path());

        let response = self.http.execute(request).await.map_err(|e| {
            warn!("Request failed in transit: {}", e);
            Error::Network(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Token is dead; forget it so the caller can route back to login
            if let Err(e) = self.store.clear_auth().await {
                warn!("Failed to clear credentials after 401: {}", e);
            }
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let body = response.json::<ApiErrorBody>().await.ok();
            let message = body
                .and_then(|b| b.message)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(Error::Api {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Malformed response body: {}", e)))?;
        if envelope.success == Some(false) {
            return Err(Error::Api {
                message: envelope
                    .message
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                status_code: Some(status.as_u16()),
            });
        }
        Ok(envelope)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn send_signup_otp(&self, request: &SignupOtpRequest) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(SIGNUP_SEND_OTP)).json(request))
            .await?;
        Ok(envelope.message)
    }

    async fn verify_signup_otp(&self, request: &VerifySignupOtpRequest) -> Result<AuthData> {
        let envelope: ApiEnvelope<AuthData> = self
            .dispatch(self.http.post(self.url(SIGNUP_VERIFY_OTP)).json(request))
            .await?;
        envelope.data.ok_or(Error::EmptyResponse)
    }

    async fn resend_signup_otp(&self, request: &SignupOtpRequest) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(SIGNUP_RESEND_OTP)).json(request))
            .await?;
        Ok(envelope.message)
    }

    async fn send_login_otp(&self, request: &LoginOtpRequest) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(LOGIN_SEND_OTP)).json(request))
            .await?;
        Ok(envelope.message)
    }

    async fn verify_login_otp(&self, request: &VerifyLoginOtpRequest) -> Result<AuthData> {
        let envelope: ApiEnvelope<AuthData> = self
            .dispatch(self.http.post(self.url(LOGIN_VERIFY_OTP)).json(request))
            .await?;
        envelope.data.ok_or(Error::EmptyResponse)
    }

    async fn resend_login_otp(&self, request: &LoginOtpRequest) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(LOGIN_RESEND_OTP)).json(request))
            .await?;
        Ok(envelope.message)
    }

    async fn get_user_profile(&self) -> Result<UserProfile> {
        let envelope: ApiEnvelope<UserProfile> =
            self.dispatch(self.http.get(self.url(PROFILE))).await?;
        envelope.data.ok_or(Error::EmptyResponse)
    }

    async fn get_bank_accounts(&self) -> Result<Vec<BankAccount>> {
        // The listing nests the array one level down: data.bankAccounts
        let envelope: ApiEnvelope<BankAccountsData> = self
            .dispatch(self.http.get(self.url(BANK_ACCOUNTS)))
            .await?;
        Ok(envelope
            .data
            .map(|data| data.bank_accounts)
            .unwrap_or_default())
    }

    async fn add_bank_account(&self, account: &NewBankAccount) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(BANK_ACCOUNTS)).json(account))
            .await?;
        Ok(envelope.message)
    }

    async fn delete_bank_account(&self, id: &str) -> Result<Option<String>> {
        let path = format!("{}/{}", BANK_ACCOUNTS, id);
        let envelope: ApiEnvelope<serde_json::Value> =
            self.dispatch(self.http.delete(self.url(&path))).await?;
        Ok(envelope.message)
    }

    async fn set_primary_bank_account(&self, id: &str) -> Result<Option<String>> {
        let path = format!("{}/{}/primary", BANK_ACCOUNTS, id);
        let envelope: ApiEnvelope<serde_json::Value> =
            self.dispatch(self.http.patch(self.url(&path))).await?;
        Ok(envelope.message)
    }

    async fn withdraw_money(&self, request: &WithdrawRequest) -> Result<WithdrawData> {
        let envelope: ApiEnvelope<WithdrawData> = self
            .dispatch(self.http.post(self.url(WALLET_WITHDRAW)).json(request))
            .await?;
        Ok(envelope.data.unwrap_or(WithdrawData { transaction: None }))
    }

    async fn add_money(&self, request: &AddMoneyRequest) -> Result<Option<String>> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .dispatch(self.http.post(self.url(WALLET_ADD_MONEY)).json(request))
            .await?;
        Ok(envelope.message)
    }

    async fn get_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let envelope: ApiEnvelope<Vec<Transaction>> = self
            .dispatch(self.http.get(self.url(WALLET_TRANSACTIONS)).query(query))
            .await?;
        Ok(TransactionPage {
            transactions: envelope.data.unwrap_or_default(),
            pagination: envelope.pagination.unwrap_or_default(),
        })
    }
}
