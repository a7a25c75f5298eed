//! Bank account registry
//!
//! Destination accounts for withdrawals. The backend owns the set; this
//! registry mirrors it, enforces the client-side rules (at most
//! `max_accounts` accounts, candidate validation before any request goes
//! out) and tracks which account is currently selected as the withdrawal
//! destination. After every mutation the set is refetched, never patched
//! locally, so a failed call leaves nothing half-applied.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::types::{AccountType, BankAccount, NewBankAccount};
use crate::api::BackendClient;
use crate::config::WithdrawalConfig;
use crate::error::{Error, Result};

const MIN_ACCOUNT_DIGITS: usize = 9;
const MAX_ACCOUNT_DIGITS: usize = 18;
const IFSC_LENGTH: usize = 11;

static IFSC_PATTERN: OnceLock<Regex> = OnceLock::new();

fn ifsc_pattern() -> &'static Regex {
    IFSC_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("Invalid IFSC regex")
    })
}

/// Candidate account as entered by the user, before validation
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub bank_name: String,
    pub account_holder_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_type: AccountType,
    /// Explicitly request primary; the first account becomes primary anyway
    pub make_primary: bool,
}

/// Where the withdrawal flow gets its destination from.
///
/// The live registry implements this; tests and demos can hand the flow a
/// fixed account instead of a full registry.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn selected_account(&self) -> Option<BankAccount>;
}

/// Stand-in source holding a preselected destination
pub struct FixedAccounts {
    selected: Option<BankAccount>,
}

impl FixedAccounts {
    pub fn new(selected: Option<BankAccount>) -> Self {
        Self { selected }
    }
}

#[async_trait]
impl AccountSource for FixedAccounts {
    async fn selected_account(&self) -> Option<BankAccount> {
        self.selected.clone()
    }
}

struct RegistryState {
    accounts: Vec<BankAccount>,
    selected_id: Option<String>,
}

pub struct BankRegistry {
    client: Arc<dyn BackendClient>,
    max_accounts: usize,
    state: RwLock<RegistryState>,
}

impl BankRegistry {
    pub fn new(client: Arc<dyn BackendClient>, config: &WithdrawalConfig) -> Self {
        Self {
            client,
            max_accounts: config.max_bank_accounts,
            state: RwLock::new(RegistryState {
                accounts: Vec::new(),
                selected_id: None,
            }),
        }
    }

    /// Fetch the account list and, when nothing is selected, default the
    /// selection to the primary account.
    pub async fn load(&self) -> Result<Vec<BankAccount>> {
        let accounts = self.sync_accounts().await?;
        let mut state = self.state.write().await;
        if state.selected_id.is_none() {
            if let Some(primary) = accounts.iter().find(|a| a.is_primary) {
                debug!("Defaulting selection to primary account {}", primary.id);
                state.selected_id = Some(primary.id.clone());
            }
        }
        Ok(accounts)
    }

    /// Fetch the account list without touching an empty selection. A
    /// selection pointing at an account that no longer exists is dropped.
    pub async fn refresh(&self) -> Result<Vec<BankAccount>> {
        self.sync_accounts().await
    }

    async fn sync_accounts(&self) -> Result<Vec<BankAccount>> {
        let accounts = self.client.get_bank_accounts().await?;
        let mut state = self.state.write().await;
        if let Some(selected) = &state.selected_id {
            if !accounts.iter().any(|a| &a.id == selected) {
                state.selected_id = None;
            }
        }
        state.accounts = accounts.clone();
        Ok(accounts)
    }

    pub async fn accounts(&self) -> Vec<BankAccount> {
        self.state.read().await.accounts.clone()
    }

    pub async fn selected(&self) -> Option<BankAccount> {
        let state = self.state.read().await;
        let id = state.selected_id.as_ref()?;
        state.accounts.iter().find(|a| &a.id == id).cloned()
    }

    pub async fn select(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.accounts.iter().any(|a| a.id == id) {
            return Err(Error::AccountNotFound(id.to_string()));
        }
        state.selected_id = Some(id.to_string());
        Ok(())
    }

    /// Validate and register a new account.
    ///
    /// The limit check runs against the mirrored set before any request is
    /// made. The first account of an empty registry becomes primary whether
    /// or not the draft asked for it.
    pub async fn add(&self, draft: AccountDraft) -> Result<Option<String>> {
        let (registry_empty, count) = {
            let state = self.state.read().await;
            (state.accounts.is_empty(), state.accounts.len())
        };
        if count >= self.max_accounts {
            return Err(Error::AccountLimitReached {
                max: self.max_accounts,
            });
        }

        let payload = validate_draft(&draft, registry_empty)?;
        let message = self.client.add_bank_account(&payload).await?;
        info!("Added bank account at {}", payload.bank_name);
        self.load().await?;
        Ok(message)
    }

    /// Delete an account. When the deleted account was the selected
    /// destination the selection is cleared and stays cleared until the user
    /// picks again.
    pub async fn delete(&self, id: &str) -> Result<Option<String>> {
        {
            let state = self.state.read().await;
            if !state.accounts.iter().any(|a| a.id == id) {
                return Err(Error::AccountNotFound(id.to_string()));
            }
        }
        let message = self.client.delete_bank_account(id).await?;
        {
            let mut state = self.state.write().await;
            if state.selected_id.as_deref() == Some(id) {
                state.selected_id = None;
            }
        }
        info!("Deleted bank account {}", id);
        self.refresh().await?;
        Ok(message)
    }

    /// Promote an account to primary. The backend demotes the old primary;
    /// the refetched list is taken as is.
    pub async fn set_primary(&self, id: &str) -> Result<Option<String>> {
        {
            let state = self.state.read().await;
            if !state.accounts.iter().any(|a| a.id == id) {
                return Err(Error::AccountNotFound(id.to_string()));
            }
        }
        let message = self.client.set_primary_bank_account(id).await?;
        info!("Set primary bank account {}", id);
        self.refresh().await?;
        Ok(message)
    }
}

#[async_trait]
impl AccountSource for BankRegistry {
    async fn selected_account(&self) -> Option<BankAccount> {
        self.selected().await
    }
}

/// Check a draft against the field rules and build the wire payload
fn validate_draft(draft: &AccountDraft, registry_empty: bool) -> Result<NewBankAccount> {
    let bank_name = draft.bank_name.trim();
    if bank_name.is_empty() {
        return Err(Error::InvalidInput {
            field: "bank_name".to_string(),
            reason: "Please enter the bank name".to_string(),
        });
    }

    let holder = draft.account_holder_name.trim();
    if holder.is_empty() {
        return Err(Error::InvalidInput {
            field: "account_holder_name".to_string(),
            reason: "Please enter the account holder name".to_string(),
        });
    }

    let number = draft.account_number.trim();
    if number.len() < MIN_ACCOUNT_DIGITS
        || number.len() > MAX_ACCOUNT_DIGITS
        || !number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::InvalidInput {
            field: "account_number".to_string(),
            reason: format!(
                "Account number must be {}-{} digits",
                MIN_ACCOUNT_DIGITS, MAX_ACCOUNT_DIGITS
            ),
        });
    }

    let ifsc = draft.ifsc_code.trim().to_uppercase();
    if ifsc.len() != IFSC_LENGTH || !ifsc_pattern().is_match(&ifsc) {
        return Err(Error::InvalidInput {
            field: "ifsc_code".to_string(),
            reason: "Please enter a valid IFSC code (e.g. SBIN0001234)".to_string(),
        });
    }

    Ok(NewBankAccount {
        bank_name: bank_name.to_string(),
        account_holder_name: holder.to_string(),
        account_number: number.to_string(),
        ifsc_code: ifsc,
        account_type: draft.account_type,
        is_primary: draft.make_primary || registry_empty,
    })
}
