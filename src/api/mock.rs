//! Scripted in-memory backend for driving flows in tests
//!
//! Each operation pops the next scripted response from its queue and bumps a
//! call counter. An unscripted call fails with a network error, which keeps
//! "no request was made" assertions honest: the counter stays at zero only
//! when the flow never reached the backend.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::types::{
    AddMoneyRequest, AuthData, BankAccount, LoginOtpRequest, NewBankAccount, SignupOtpRequest,
    TransactionPage, TransactionQuery, UserProfile, VerifyLoginOtpRequest, VerifySignupOtpRequest,
    WithdrawData, WithdrawRequest,
};
use crate::api::BackendClient;
use crate::error::{Error, Result};

#[derive(Default)]
pub struct MockBackend {
    profiles: Mutex<VecDeque<Result<UserProfile>>>,
    accounts: Mutex<VecDeque<Result<Vec<BankAccount>>>>,
    withdrawals: Mutex<VecDeque<Result<WithdrawData>>>,
    mutations: Mutex<VecDeque<Result<Option<String>>>>,
    otp_messages: Mutex<VecDeque<Result<Option<String>>>>,
    verifications: Mutex<VecDeque<Result<AuthData>>>,
    pages: Mutex<VecDeque<Result<TransactionPage>>>,

    pub profile_calls: AtomicUsize,
    pub list_account_calls: AtomicUsize,
    pub add_account_calls: AtomicUsize,
    pub delete_account_calls: AtomicUsize,
    pub set_primary_calls: AtomicUsize,
    pub withdraw_calls: AtomicUsize,
    pub otp_send_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub add_money_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,

    pub sent_withdrawals: Mutex<Vec<WithdrawRequest>>,
    pub sent_accounts: Mutex<Vec<NewBankAccount>>,
    pub sent_deposits: Mutex<Vec<AddMoneyRequest>>,
    pub sent_queries: Mutex<Vec<TransactionQuery>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_profile(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().push_back(Ok(profile));
    }

    pub fn push_profile_err(&self, err: Error) {
        self.profiles.lock().unwrap().push_back(Err(err));
    }

    pub fn push_accounts(&self, accounts: Vec<BankAccount>) {
        self.accounts.lock().unwrap().push_back(Ok(accounts));
    }

    pub fn push_accounts_err(&self, err: Error) {
        self.accounts.lock().unwrap().push_back(Err(err));
    }

    pub fn push_withdrawal(&self, data: WithdrawData) {
        self.withdrawals.lock().unwrap().push_back(Ok(data));
    }

    pub fn push_withdrawal_err(&self, err: Error) {
        self.withdrawals.lock().unwrap().push_back(Err(err));
    }

    pub fn push_mutation(&self, message: &str) {
        self.mutations
            .lock()
            .unwrap()
            .push_back(Ok(Some(message.to_string())));
    }

    pub fn push_mutation_err(&self, err: Error) {
        self.mutations.lock().unwrap().push_back(Err(err));
    }

    pub fn push_otp_message(&self, message: &str) {
        self.otp_messages
            .lock()
            .unwrap()
            .push_back(Ok(Some(message.to_string())));
    }

    pub fn push_verification(&self, data: AuthData) {
        self.verifications.lock().unwrap().push_back(Ok(data));
    }

    pub fn push_verification_err(&self, err: Error) {
        self.verifications.lock().unwrap().push_back(Err(err));
    }

    pub fn push_page(&self, page: TransactionPage) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T>>>) -> Result<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("unscripted call".to_string())))
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn send_signup_otp(&self, _request: &SignupOtpRequest) -> Result<Option<String>> {
        self.otp_send_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.otp_messages)
    }

    async fn verify_signup_otp(&self, _request: &VerifySignupOtpRequest) -> Result<AuthData> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.verifications)
    }

    async fn resend_signup_otp(&self, _request: &SignupOtpRequest) -> Result<Option<String>> {
        self.otp_send_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.otp_messages)
    }

    async fn send_login_otp(&self, _request: &LoginOtpRequest) -> Result<Option<String>> {
        self.otp_send_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.otp_messages)
    }

    async fn verify_login_otp(&self, _request: &VerifyLoginOtpRequest) -> Result<AuthData> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.verifications)
    }

    async fn resend_login_otp(&self, _request: &LoginOtpRequest) -> Result<Option<String>> {
        self.otp_send_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.otp_messages)
    }

    async fn get_user_profile(&self) -> Result<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.profiles)
    }

    async fn get_bank_accounts(&self) -> Result<Vec<BankAccount>> {
        self.list_account_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.accounts)
    }

    async fn add_bank_account(&self, account: &NewBankAccount) -> Result<Option<String>> {
        self.add_account_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_accounts.lock().unwrap().push(account.clone());
        Self::next(&self.mutations)
    }

    async fn delete_bank_account(&self, _id: &str) -> Result<Option<String>> {
        self.delete_account_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.mutations)
    }

    async fn set_primary_bank_account(&self, _id: &str) -> Result<Option<String>> {
        self.set_primary_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.mutations)
    }

    async fn withdraw_money(&self, request: &WithdrawRequest) -> Result<WithdrawData> {
        self.withdraw_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_withdrawals.lock().unwrap().push(request.clone());
        Self::next(&self.withdrawals)
    }

    async fn add_money(&self, request: &AddMoneyRequest) -> Result<Option<String>> {
        self.add_money_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_deposits.lock().unwrap().push(request.clone());
        Self::next(&self.mutations)
    }

    async fn get_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        self.sent_queries.lock().unwrap().push(query.clone());
        Self::next(&self.pages)
    }
}
