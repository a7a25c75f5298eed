//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub withdrawal: WithdrawalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the API version prefix, e.g. http://host:5000/api/v1
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the bearer token and the cached profile
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Seconds a user must wait before asking for another OTP
    #[serde(default = "default_resend_cooldown_secs")]
    pub resend_cooldown_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: default_resend_cooldown_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalConfig {
    /// Smallest amount the backend will pay out, in whole rupees
    #[serde(default = "default_minimum_amount_inr")]
    pub minimum_amount_inr: u64,
    /// Hard cap on registered destination accounts
    #[serde(default = "default_max_bank_accounts")]
    pub max_bank_accounts: usize,
    /// Keypad length cap for the amount field
    #[serde(default = "default_max_amount_digits")]
    pub max_amount_digits: usize,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            minimum_amount_inr: default_minimum_amount_inr(),
            max_bank_accounts: default_max_bank_accounts(),
            max_amount_digits: default_max_amount_digits(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    std::env::var("TRADEHUB_API_URL").unwrap_or_else(|_| "http://127.0.0.1:5000/api/v1".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_data_dir() -> String {
    ".tradehub".to_string()
}

fn default_resend_cooldown_secs() -> u64 {
    60
}

fn default_minimum_amount_inr() -> u64 {
    100
}

fn default_max_bank_accounts() -> usize {
    3
}

fn default_max_amount_digits() -> usize {
    10
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("api.base_url", default_base_url())?
            .set_default("api.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix TRADEHUB_)
            .add_source(
                config::Environment::with_prefix("TRADEHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("api.base_url must be http or https, got {}", parsed.scheme());
        }

        if self.api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be positive");
        }

        if self.storage.data_dir.trim().is_empty() {
            anyhow::bail!("storage.data_dir must not be empty");
        }

        if self.withdrawal.minimum_amount_inr == 0 {
            anyhow::bail!("withdrawal.minimum_amount_inr must be positive");
        }

        if self.withdrawal.max_bank_accounts == 0 {
            anyhow::bail!("withdrawal.max_bank_accounts must be positive");
        }

        // The keypad needs room for the minimum amount plus paise
        if self.withdrawal.max_amount_digits < 4 {
            anyhow::bail!("withdrawal.max_amount_digits must be at least 4");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide anything baked into the URL)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  API:
    base_url: {}
    timeout: {}ms
  Storage:
    data_dir: {}
  Auth:
    resend_cooldown: {}s
  Withdrawal:
    minimum_amount: ₹{}
    max_bank_accounts: {}
    max_amount_digits: {}
"#,
            mask_url(&self.api.base_url),
            self.api.timeout_ms,
            self.storage.data_dir,
            self.auth.resend_cooldown_secs,
            self.withdrawal.minimum_amount_inr,
            self.withdrawal.max_bank_accounts,
            self.withdrawal.max_amount_digits,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            withdrawal: WithdrawalConfig::default(),
        }
    }
}
