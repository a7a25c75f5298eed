//! TradeHub operator CLI - drives the wallet SDK end to end
//!
//! # WARNING
//! - Withdrawals and deposits move real money on the configured backend.
//! - Point TRADEHUB_API__BASE_URL at a staging environment for testing.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use tradehub_client::cli::commands;
use tradehub_client::config::Config;

/// TradeHub wallet client - operator CLI
#[derive(Parser)]
#[command(name = "tradehub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with phone number and OTP
    Signup {
        /// Full name (at least 3 characters)
        #[arg(long)]
        name: String,

        /// 10-digit phone number
        #[arg(long)]
        phone: String,

        /// OTP code; prompted for when omitted
        #[arg(long)]
        otp: Option<String>,
    },

    /// Log in with phone number and OTP
    Login {
        /// 10-digit phone number
        #[arg(long)]
        phone: String,

        /// OTP code; prompted for when omitted
        #[arg(long)]
        otp: Option<String>,
    },

    /// Drop the stored session
    Logout,

    /// Show profile and balances
    Profile,

    /// Show balances (live, with cached fallback)
    Balance,

    /// Bank account management commands
    Banks {
        #[command(subcommand)]
        action: BankAction,
    },

    /// Withdraw money to a registered bank account
    Withdraw {
        /// Amount in rupees, e.g. 499.99
        amount: Option<String>,

        /// Withdraw the full wallet balance
        #[arg(long, conflicts_with = "amount")]
        max: bool,

        /// Destination account id (default: the primary account)
        #[arg(long)]
        account: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Submit a UPI payment with its UTR reference
    AddMoney {
        /// Amount in rupees
        amount: String,

        /// 10-22 digit UTR reference from the UPI app
        #[arg(long)]
        utr: String,

        /// Payment gateway label
        #[arg(long, default_value = "manual")]
        gateway: String,
    },

    /// Show transaction history
    History {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Filter: all, credit, debit, withdrawals, pending
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Free-text search over the fetched page
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[derive(Subcommand)]
enum BankAction {
    /// List registered accounts
    List,

    /// Register a new account
    Add {
        /// Bank name
        #[arg(long)]
        bank: String,

        /// Account holder name
        #[arg(long)]
        holder: String,

        /// Account number (9-18 digits)
        #[arg(long)]
        number: String,

        /// IFSC code, e.g. SBIN0001234
        #[arg(long)]
        ifsc: String,

        /// Account type: savings or current
        #[arg(long, default_value = "savings")]
        account_type: String,

        /// Make this the primary account
        #[arg(long)]
        primary: bool,
    },

    /// Delete an account
    Delete {
        /// Account id
        id: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Make an account the primary withdrawal destination
    SetPrimary {
        /// Account id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tradehub_client=info".parse().unwrap()),
        )
        .with_target(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Signup { name, phone, otp } => {
            commands::signup(&config, &name, &phone, otp).await
        }
        Commands::Login { phone, otp } => commands::login(&config, &phone, otp).await,
        Commands::Logout => commands::logout(&config).await,
        Commands::Profile => commands::profile(&config).await,
        Commands::Balance => commands::balance(&config).await,
        Commands::Banks { action } => match action {
            BankAction::List => commands::banks_list(&config).await,
            BankAction::Add {
                bank,
                holder,
                number,
                ifsc,
                account_type,
                primary,
            } => {
                commands::banks_add(&config, &bank, &holder, &number, &ifsc, &account_type, primary)
                    .await
            }
            BankAction::Delete { id, force } => commands::banks_delete(&config, &id, force).await,
            BankAction::SetPrimary { id } => commands::banks_set_primary(&config, &id).await,
        },
        Commands::Withdraw {
            amount,
            max,
            account,
            force,
        } => commands::withdraw(&config, amount, max, account, force).await,
        Commands::AddMoney {
            amount,
            utr,
            gateway,
        } => commands::add_money(&config, &amount, &utr, &gateway).await,
        Commands::History {
            page,
            filter,
            search,
        } => commands::history(&config, page, &filter, search).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
