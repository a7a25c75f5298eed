//! CLI command implementations

use std::sync::Arc;

use anyhow::Result;
use dialoguer::{Confirm, Input};
use tracing::{info, warn};

use crate::add_money::AddMoney;
use crate::api::types::{AccountType, Direction, Transaction};
use crate::api::{BackendClient, HttpBackendClient};
use crate::auth::AuthFlow;
use crate::balance::{BalanceSnapshot, BalanceSource, BalanceStore};
use crate::bank::{AccountDraft, BankRegistry};
use crate::config::Config;
use crate::history::{TransactionFilter, TransactionHistory};
use crate::money::{format_inr, parse_amount};
use crate::store::CredentialStore;
use crate::withdraw::WithdrawalFlow;

struct Context {
    client: Arc<HttpBackendClient>,
    store: Arc<CredentialStore>,
}

fn context(config: &Config) -> Result<Context> {
    let store = Arc::new(CredentialStore::new(config.storage.data_dir.as_str()));
    let client = Arc::new(HttpBackendClient::new(&config.api, store.clone())?);
    Ok(Context { client, store })
}

async fn require_login(store: &CredentialStore) -> Result<()> {
    if !store.is_authenticated().await {
        anyhow::bail!("Not logged in. Run 'tradehub login' first.");
    }
    Ok(())
}

/// Create an account: send the signup OTP, verify it, store the session
pub async fn signup(config: &Config, name: &str, phone: &str, otp: Option<String>) -> Result<()> {
    let ctx = context(config)?;
    let auth = AuthFlow::new(ctx.client.clone(), ctx.store.clone(), &config.auth);

    let message = auth.request_signup_otp(name, phone).await?;
    println!("{}", message.as_deref().unwrap_or("OTP sent"));

    let otp = match otp {
        Some(otp) => otp,
        None => prompt_otp(&auth, Some(name), phone).await?,
    };

    let user = auth.verify_signup_otp(name, phone, &otp).await?;
    println!("\nWelcome, {}! Your account is ready.", user.full_name);
    println!("Total balance: {}", format_inr(user.total_balance()));
    Ok(())
}

/// Log in: send the login OTP, verify it, store the session
pub async fn login(config: &Config, phone: &str, otp: Option<String>) -> Result<()> {
    let ctx = context(config)?;
    let auth = AuthFlow::new(ctx.client.clone(), ctx.store.clone(), &config.auth);

    let message = auth.request_login_otp(phone).await?;
    println!("{}", message.as_deref().unwrap_or("OTP sent"));

    let otp = match otp {
        Some(otp) => otp,
        None => prompt_otp(&auth, None, phone).await?,
    };

    let user = auth.verify_login_otp(phone, &otp).await?;
    println!("\nLogged in as {}.", user.full_name);
    println!("Total balance: {}", format_inr(user.total_balance()));
    Ok(())
}

/// Drop the stored session
pub async fn logout(config: &Config) -> Result<()> {
    let ctx = context(config)?;
    let auth = AuthFlow::new(ctx.client.clone(), ctx.store.clone(), &config.auth);

    if !auth.is_authenticated().await {
        println!("Already logged out.");
        return Ok(());
    }
    auth.logout().await?;
    println!("Logged out.");
    Ok(())
}

/// Show the profile with balances (live, cached fallback)
pub async fn profile(config: &Config) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let balance = BalanceStore::new(ctx.client.clone(), ctx.store.clone());
    let snapshot = balance.refresh().await;

    println!("\n=== PROFILE ===\n");
    match ctx.store.user().await {
        Some(user) => {
            println!("{:<18} {}", "Name:", user.full_name);
            println!("{:<18} {}", "Phone:", user.phone_number);
        }
        None => println!("Profile details unavailable."),
    }
    println!();
    print_snapshot(&snapshot);
    Ok(())
}

/// Show balances only
pub async fn balance(config: &Config) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let balance = BalanceStore::new(ctx.client.clone(), ctx.store.clone());
    let snapshot = balance.refresh().await;

    println!("\n=== BALANCE ===\n");
    print_snapshot(&snapshot);
    Ok(())
}

/// List registered bank accounts
pub async fn banks_list(config: &Config) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let registry = BankRegistry::new(ctx.client.clone(), &config.withdrawal);
    let accounts = registry.load().await?;

    println!("\n=== BANK ACCOUNTS ===\n");
    if accounts.is_empty() {
        println!("No bank accounts registered.");
        return Ok(());
    }

    println!(
        "{:<26} {:<20} {:<14} {:<9} {}",
        "ID", "BANK", "ACCOUNT", "PRIMARY", "HOLDER"
    );
    println!("{}", "-".repeat(84));
    for account in &accounts {
        println!(
            "{:<26} {:<20} {:<14} {:<9} {}",
            account.id,
            account.bank_name,
            account.masked_number(),
            if account.is_primary { "yes" } else { "" },
            account.account_holder_name
        );
    }
    println!();
    Ok(())
}

/// Register a new bank account
pub async fn banks_add(
    config: &Config,
    bank: &str,
    holder: &str,
    number: &str,
    ifsc: &str,
    account_type: &str,
    primary: bool,
) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let account_type = match account_type.to_lowercase().as_str() {
        "savings" => AccountType::Savings,
        "current" => AccountType::Current,
        other => anyhow::bail!("Invalid account type: {}. Use: savings, current", other),
    };

    let registry = BankRegistry::new(ctx.client.clone(), &config.withdrawal);
    registry.load().await?;

    let message = registry
        .add(AccountDraft {
            bank_name: bank.to_string(),
            account_holder_name: holder.to_string(),
            account_number: number.to_string(),
            ifsc_code: ifsc.to_string(),
            account_type,
            make_primary: primary,
        })
        .await?;

    println!("{}", message.as_deref().unwrap_or("Bank account added"));
    println!(
        "{} of {} account slots used.",
        registry.accounts().await.len(),
        config.withdrawal.max_bank_accounts
    );
    Ok(())
}

/// Delete a bank account
pub async fn banks_delete(config: &Config, id: &str, force: bool) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let registry = BankRegistry::new(ctx.client.clone(), &config.withdrawal);
    let accounts = registry.load().await?;
    let account = accounts
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| anyhow::anyhow!("No bank account with id {}", id))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} {}? This cannot be undone.",
                account.bank_name,
                account.masked_number()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Delete cancelled by user");
            return Ok(());
        }
    }

    let message = registry.delete(id).await?;
    println!("{}", message.as_deref().unwrap_or("Bank account deleted"));
    Ok(())
}

/// Promote a bank account to primary
pub async fn banks_set_primary(config: &Config, id: &str) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let registry = BankRegistry::new(ctx.client.clone(), &config.withdrawal);
    registry.load().await?;
    let message = registry.set_primary(id).await?;
    println!("{}", message.as_deref().unwrap_or("Primary account updated"));

    for account in registry.accounts().await {
        if account.is_primary {
            println!(
                "Primary: {} {} ({})",
                account.bank_name,
                account.masked_number(),
                account.account_holder_name
            );
        }
    }
    Ok(())
}

/// Withdraw money to the selected bank account
pub async fn withdraw(
    config: &Config,
    amount: Option<String>,
    max: bool,
    account: Option<String>,
    force: bool,
) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let client: Arc<dyn BackendClient> = ctx.client.clone();
    let balance = Arc::new(BalanceStore::new(client.clone(), ctx.store.clone()));
    let registry = Arc::new(BankRegistry::new(client.clone(), &config.withdrawal));

    let snapshot = balance.refresh().await;
    if !snapshot.is_live() {
        anyhow::bail!("Live balance unavailable, refusing to withdraw against stale data");
    }
    registry.load().await?;
    if let Some(id) = account.as_deref() {
        registry.select(id).await?;
    }

    let flow = WithdrawalFlow::new(client, balance.clone(), registry, &config.withdrawal);
    if max {
        flow.set_max().await;
    } else if let Some(text) = amount.as_deref() {
        let text = text.trim();
        if !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
            anyhow::bail!("Invalid amount: {}", text);
        }
        for c in text.chars() {
            if c == '.' {
                flow.press_decimal().await;
            } else {
                flow.press_digit(c).await;
            }
        }
    } else {
        anyhow::bail!("Provide an amount or --max");
    }

    let preview = flow.review().await?;
    println!("\n=== WITHDRAWAL REVIEW ===\n");
    println!("{:<20} {}", "Amount:", format_inr(preview.amount));
    println!(
        "{:<20} {} {}",
        "Destination:",
        preview.destination.bank_name,
        preview.destination.masked_number()
    );
    println!(
        "{:<20} {}",
        "Account holder:",
        preview.destination.account_holder_name
    );
    println!(
        "{:<20} {}",
        "You will receive:",
        format_inr(preview.receivable)
    );
    println!(
        "{:<20} {}",
        "Remaining balance:",
        format_inr(preview.remaining_balance)
    );

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Withdraw {} to {}?",
                format_inr(preview.amount),
                preview.destination.masked_number()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Withdrawal cancelled by user");
            return Ok(());
        }
    }

    let receipt = flow.confirm().await?;
    println!("\nWithdrawal submitted!");
    println!("Transaction ID: {}", receipt.transaction_id);
    if receipt.needs_reconciliation {
        warn!("Backend returned no transaction id, issued a provisional one");
        println!("Note: provisional id, match the final record in the history.");
    }
    println!(
        "Remaining balance: {}",
        format_inr(balance.snapshot().await.total())
    );
    Ok(())
}

/// Submit a UPI payment with its UTR reference
pub async fn add_money(config: &Config, amount: &str, utr: &str, gateway: &str) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let amount =
        parse_amount(amount).ok_or_else(|| anyhow::anyhow!("Invalid amount: {}", amount))?;
    let flow = AddMoney::new(ctx.client.clone());
    let message = flow.submit(amount, utr, gateway).await?;

    println!(
        "{}",
        message
            .as_deref()
            .unwrap_or("Payment submitted for verification")
    );
    println!("The credit appears in your history once reconciled.");
    Ok(())
}

/// Show a page of transaction history
pub async fn history(
    config: &Config,
    page: u32,
    filter: &str,
    search: Option<String>,
) -> Result<()> {
    let ctx = context(config)?;
    require_login(&ctx.store).await?;

    let filter = parse_filter(filter)?;
    let service = TransactionHistory::new(ctx.client.clone());
    let fetched = service.fetch_page(filter, page).await?;

    let rows: Vec<&Transaction> = match search.as_deref() {
        Some(needle) => crate::history::search(&fetched.transactions, needle),
        None => fetched.transactions.iter().collect(),
    };

    println!("\n=== TRANSACTIONS ({}) ===\n", filter.label());
    if rows.is_empty() {
        println!("No transactions.");
    } else {
        println!(
            "{:<12} {:<32} {:<14} {}",
            "DATE", "DESCRIPTION", "AMOUNT", "STATUS"
        );
        println!("{}", "-".repeat(72));
        for txn in &rows {
            let date = txn
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            let title = crate::history::transaction_title(txn);
            let title = if title.chars().count() > 30 {
                let short: String = title.chars().take(27).collect();
                format!("{}...", short)
            } else {
                title.to_string()
            };
            let sign = match txn.direction {
                Direction::Credit => "+",
                Direction::Debit => "-",
            };
            println!(
                "{:<12} {:<32} {:<14} {:?}",
                date,
                title,
                format!("{}{}", sign, format_inr(txn.amount)),
                txn.status
            );
        }
    }

    let summary = crate::history::summarize(&fetched.transactions);
    println!(
        "\nPage {} of {} ({} transactions total)",
        fetched.pagination.current_page,
        fetched.pagination.total_pages,
        fetched.pagination.total_transactions
    );
    println!(
        "Credit: {}  Debit: {}  Withdrawals: {}  Pending: {}",
        summary.credit, summary.debit, summary.withdrawals, summary.pending
    );
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

fn print_snapshot(snapshot: &BalanceSnapshot) {
    println!(
        "{:<18} {}",
        "Wallet balance:",
        format_inr(snapshot.wallet_balance)
    );
    println!(
        "{:<18} {}",
        "Bonus balance:",
        format_inr(snapshot.bonus_balance)
    );
    println!("{:<18} {}", "Total balance:", format_inr(snapshot.total()));
    match snapshot.source {
        BalanceSource::Live => {}
        BalanceSource::Cached => {
            println!("\nShowing cached balances, the backend could not be reached.")
        }
        BalanceSource::Unavailable => {
            println!("\nBalances unavailable and no cached data to fall back to.")
        }
    }
}

/// Read the OTP from the terminal; 'r' requests a resend
async fn prompt_otp(auth: &AuthFlow, signup_name: Option<&str>, phone: &str) -> Result<String> {
    loop {
        let entry: String = Input::new()
            .with_prompt("Enter the 6-digit OTP (or 'r' to resend)")
            .interact_text()?;
        let entry = entry.trim().to_string();

        if entry.eq_ignore_ascii_case("r") {
            let result = match signup_name {
                Some(name) => auth.resend_signup_otp(name, phone).await,
                None => auth.resend_login_otp(phone).await,
            };
            match result {
                Ok(message) => println!("{}", message.as_deref().unwrap_or("OTP resent")),
                Err(e) => println!("{}", e),
            }
            continue;
        }

        return Ok(entry);
    }
}

fn parse_filter(value: &str) -> Result<TransactionFilter> {
    match value.to_lowercase().as_str() {
        "all" => Ok(TransactionFilter::All),
        "credit" => Ok(TransactionFilter::Credit),
        "debit" => Ok(TransactionFilter::Debit),
        "withdrawals" | "withdrawal" => Ok(TransactionFilter::Withdrawals),
        "pending" => Ok(TransactionFilter::Pending),
        other => anyhow::bail!(
            "Invalid filter: {}. Use: all, credit, debit, withdrawals, pending",
            other
        ),
    }
}
