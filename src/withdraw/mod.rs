//! Withdrawal flow
//!
//! Drives a withdrawal from amount entry through review to submission.
//! The flow owns the amount keypad, checks the entry against the latest
//! balance snapshot and the selected destination, and guarantees a
//! confirmed withdrawal hits the backend exactly once. A submission
//! failure drops back to entry with the amount kept, so the user retries
//! without retyping.

pub mod amount;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::types::{BankAccount, WithdrawRequest};
use crate::api::BackendClient;
use crate::balance::BalanceStore;
use crate::bank::AccountSource;
use crate::config::WithdrawalConfig;
use crate::error::{Error, Result};

pub use amount::AmountInput;

/// What the user is asked to confirm
#[derive(Debug, Clone)]
pub struct WithdrawalPreview {
    pub amount: Decimal,
    pub destination: BankAccount,
    /// Wallet balance left after the withdrawal
    pub remaining_balance: Decimal,
    /// Amount that reaches the bank account
    pub receivable: Decimal,
}

/// Identifier of the submitted withdrawal.
///
/// The backend normally returns one; when it accepts the withdrawal but
/// omits the id, a provisional `WD...` id is minted locally and the
/// receipt is flagged for reconciliation against the transaction history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionId {
    Backend(String),
    Provisional(String),
}

impl TransactionId {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionId::Backend(id) | TransactionId::Provisional(id) => id,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, TransactionId::Provisional(_))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub transaction_id: TransactionId,
    pub amount: Decimal,
    pub destination: BankAccount,
    /// True when the id is provisional and the real transaction must be
    /// looked up in the history
    pub needs_reconciliation: bool,
}

enum Stage {
    Entering,
    Confirming,
    Submitting,
}

struct FlowInner {
    amount: AmountInput,
    stage: Stage,
    pending: Option<WithdrawalPreview>,
}

pub struct WithdrawalFlow {
    client: Arc<dyn BackendClient>,
    balance: Arc<BalanceStore>,
    accounts: Arc<dyn AccountSource>,
    minimum: Decimal,
    state: Mutex<FlowInner>,
}

impl WithdrawalFlow {
    pub fn new(
        client: Arc<dyn BackendClient>,
        balance: Arc<BalanceStore>,
        accounts: Arc<dyn AccountSource>,
        config: &WithdrawalConfig,
    ) -> Self {
        Self {
            client,
            balance,
            accounts,
            minimum: Decimal::from(config.minimum_amount_inr),
            state: Mutex::new(FlowInner {
                amount: AmountInput::new(config.max_amount_digits),
                stage: Stage::Entering,
                pending: None,
            }),
        }
    }

    pub async fn press_digit(&self, digit: char) {
        self.state.lock().await.amount.press_digit(digit);
    }

    pub async fn press_decimal(&self) {
        self.state.lock().await.amount.press_decimal();
    }

    pub async fn backspace(&self) {
        self.state.lock().await.amount.backspace();
    }

    pub async fn clear_amount(&self) {
        self.state.lock().await.amount.clear();
    }

    /// Fill the keypad with the full withdrawable balance
    pub async fn set_max(&self) {
        let available = self.balance.snapshot().await.withdrawable();
        self.state.lock().await.amount.set_max(available);
    }

    pub async fn amount_text(&self) -> String {
        self.state.lock().await.amount.text().to_string()
    }

    pub async fn amount_value(&self) -> Option<Decimal> {
        self.state.lock().await.amount.value()
    }

    /// Check the entered amount and build the confirmation preview.
    ///
    /// Exactly one blocker is reported, checked in order: amount below the
    /// minimum, amount over the available balance, no destination selected.
    pub async fn review(&self) -> Result<WithdrawalPreview> {
        let mut inner = self.state.lock().await;
        if matches!(inner.stage, Stage::Submitting) {
            return Err(Error::SubmissionInFlight);
        }
        let amount = inner.amount.value().ok_or_else(|| Error::InvalidInput {
            field: "amount".to_string(),
            reason: "Please enter a valid amount".to_string(),
        })?;

        let available = self.balance.snapshot().await.withdrawable();
        let destination = self.guards(amount, available).await?;

        let preview = WithdrawalPreview {
            amount,
            destination,
            remaining_balance: available - amount,
            receivable: amount,
        };
        inner.stage = Stage::Confirming;
        inner.pending = Some(preview.clone());
        Ok(preview)
    }

    /// Leave the confirmation step without submitting. The amount stays.
    pub async fn cancel_review(&self) {
        let mut inner = self.state.lock().await;
        if matches!(inner.stage, Stage::Confirming) {
            inner.stage = Stage::Entering;
            inner.pending = None;
        }
    }

    /// Submit the reviewed withdrawal.
    ///
    /// The balance is re-checked against the latest snapshot first; if it
    /// no longer covers the amount the submission is refused and the flow
    /// returns to entry. At most one submission is in flight per flow, a
    /// second confirm during submission fails instead of queueing.
    pub async fn confirm(&self) -> Result<WithdrawalReceipt> {
        let pending = {
            let mut inner = self.state.lock().await;
            if matches!(inner.stage, Stage::Submitting) {
                return Err(Error::SubmissionInFlight);
            }
            let pending = inner.pending.clone().ok_or_else(|| {
                Error::FlowState("no withdrawal awaiting confirmation".to_string())
            })?;
            inner.stage = Stage::Submitting;
            pending
        };

        let available = self.balance.snapshot().await.withdrawable();
        if pending.amount > available {
            let mut inner = self.state.lock().await;
            inner.stage = Stage::Entering;
            inner.pending = None;
            return Err(Error::BalanceChanged { available });
        }

        let request = WithdrawRequest::new(pending.amount, &pending.destination);
        info!(
            "Submitting withdrawal of ₹{} to {}",
            pending.amount,
            pending.destination.masked_number()
        );

        match self.client.withdraw_money(&request).await {
            Ok(data) => {
                let transaction_id = match data.transaction.and_then(|t| t.id) {
                    Some(id) => TransactionId::Backend(id),
                    None => {
                        let id = provisional_id();
                        warn!(
                            "Withdrawal accepted without a transaction id, recorded as {}",
                            id
                        );
                        TransactionId::Provisional(id)
                    }
                };
                let receipt = WithdrawalReceipt {
                    needs_reconciliation: transaction_id.is_provisional(),
                    transaction_id,
                    amount: pending.amount,
                    destination: pending.destination,
                };
                {
                    let mut inner = self.state.lock().await;
                    inner.stage = Stage::Entering;
                    inner.pending = None;
                    inner.amount.clear();
                }
                info!("Withdrawal {} submitted", receipt.transaction_id);
                let refreshed = self.balance.refresh().await;
                if !refreshed.is_live() {
                    warn!("Balance refresh after withdrawal used {:?} data", refreshed.source);
                }
                Ok(receipt)
            }
            Err(e) => {
                let mut inner = self.state.lock().await;
                inner.stage = Stage::Entering;
                inner.pending = None;
                Err(e)
            }
        }
    }

    async fn guards(&self, amount: Decimal, available: Decimal) -> Result<BankAccount> {
        if amount < self.minimum {
            return Err(Error::BelowMinimum {
                minimum: self.minimum,
            });
        }
        if amount > available {
            return Err(Error::InsufficientBalance {
                available,
                required: amount,
            });
        }
        self.accounts
            .selected_account()
            .await
            .ok_or(Error::NoAccountSelected)
    }
}

fn provisional_id() -> String {
    use rand::Rng;
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("WD{}{}", Utc::now().timestamp_millis(), suffix)
}
