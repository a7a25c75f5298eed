//! Phone/OTP signup and login flows
//!
//! Local validation runs before anything touches the network: a malformed
//! phone number, name or OTP never produces a request. A successful
//! verification persists the bearer token first and the profile snapshot
//! second (two independent writes, last one wins).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::types::{
    LoginOtpRequest, SignupOtpRequest, UserProfile, VerifyLoginOtpRequest, VerifySignupOtpRequest,
};
use crate::api::BackendClient;
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::store::CredentialStore;

pub const OTP_LENGTH: usize = 6;
pub const PHONE_LENGTH: usize = 10;
pub const MIN_NAME_CHARS: usize = 3;

pub struct AuthFlow {
    client: Arc<dyn BackendClient>,
    store: Arc<CredentialStore>,
    resend_cooldown: Duration,
    last_otp_sent: Mutex<Option<Instant>>,
}

impl AuthFlow {
    pub fn new(
        client: Arc<dyn BackendClient>,
        store: Arc<CredentialStore>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            client,
            store,
            resend_cooldown: Duration::from_secs(config.resend_cooldown_secs),
            last_otp_sent: Mutex::new(None),
        }
    }

    pub async fn request_signup_otp(
        &self,
        full_name: &str,
        phone: &str,
    ) -> Result<Option<String>> {
        let request = SignupOtpRequest {
            full_name: validate_full_name(full_name)?,
            phone_number: validate_phone(phone)?,
        };
        let message = self.client.send_signup_otp(&request).await?;
        self.mark_sent().await;
        info!("Signup OTP requested for {}", request.phone_number);
        Ok(message)
    }

    pub async fn resend_signup_otp(&self, full_name: &str, phone: &str) -> Result<Option<String>> {
        let request = SignupOtpRequest {
            full_name: validate_full_name(full_name)?,
            phone_number: validate_phone(phone)?,
        };
        self.check_cooldown().await?;
        let message = self.client.resend_signup_otp(&request).await?;
        self.mark_sent().await;
        Ok(message)
    }

    /// Verify the signup OTP and sign the new user in
    pub async fn verify_signup_otp(
        &self,
        full_name: &str,
        phone: &str,
        otp: &str,
    ) -> Result<UserProfile> {
        let request = VerifySignupOtpRequest {
            full_name: validate_full_name(full_name)?,
            phone_number: validate_phone(phone)?,
            otp: validate_otp(otp)?,
        };
        let auth = self.client.verify_signup_otp(&request).await?;
        self.persist(&auth.token, &auth.user).await?;
        info!("Signup verified for {}", auth.user.phone_number);
        Ok(auth.user)
    }

    pub async fn request_login_otp(&self, phone: &str) -> Result<Option<String>> {
        let request = LoginOtpRequest {
            phone_number: validate_phone(phone)?,
        };
        let message = self.client.send_login_otp(&request).await?;
        self.mark_sent().await;
        info!("Login OTP requested for {}", request.phone_number);
        Ok(message)
    }

    pub async fn resend_login_otp(&self, phone: &str) -> Result<Option<String>> {
        let request = LoginOtpRequest {
            phone_number: validate_phone(phone)?,
        };
        self.check_cooldown().await?;
        let message = self.client.resend_login_otp(&request).await?;
        self.mark_sent().await;
        Ok(message)
    }

    /// Verify the login OTP and sign the user in
    pub async fn verify_login_otp(&self, phone: &str, otp: &str) -> Result<UserProfile> {
        let request = VerifyLoginOtpRequest {
            phone_number: validate_phone(phone)?,
            otp: validate_otp(otp)?,
        };
        let auth = self.client.verify_login_otp(&request).await?;
        self.persist(&auth.token, &auth.user).await?;
        info!("Login verified for {}", auth.user.phone_number);
        Ok(auth.user)
    }

    /// Drop the stored session. Safe to call when already logged out.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear_auth().await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.store.is_authenticated().await
    }

    /// Time left before another OTP may be requested, `None` when allowed now
    pub async fn resend_available_in(&self) -> Option<Duration> {
        let last = self.last_otp_sent.lock().await;
        let at = (*last)?;
        let elapsed = at.elapsed();
        if elapsed < self.resend_cooldown {
            Some(self.resend_cooldown - elapsed)
        } else {
            None
        }
    }

    async fn persist(&self, token: &str, user: &UserProfile) -> Result<()> {
        self.store.save_token(token).await?;
        self.store.save_user(user).await?;
        Ok(())
    }

    async fn mark_sent(&self) {
        *self.last_otp_sent.lock().await = Some(Instant::now());
    }

    async fn check_cooldown(&self) -> Result<()> {
        if let Some(remaining) = self.resend_available_in().await {
            debug!("OTP resend blocked for another {:?}", remaining);
            return Err(Error::ResendCooldown {
                remaining_secs: remaining.as_secs().max(1),
            });
        }
        Ok(())
    }
}

pub fn validate_phone(phone: &str) -> Result<String> {
    let phone = phone.trim();
    if phone.len() != PHONE_LENGTH || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput {
            field: "phone_number".to_string(),
            reason: "Please enter a valid 10-digit phone number".to_string(),
        });
    }
    Ok(phone.to_string())
}

pub fn validate_full_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(Error::InvalidInput {
            field: "full_name".to_string(),
            reason: "Please enter your full name (at least 3 characters)".to_string(),
        });
    }
    Ok(name.to_string())
}

pub fn validate_otp(otp: &str) -> Result<String> {
    let otp = otp.trim();
    if otp.len() != OTP_LENGTH || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput {
            field: "otp".to_string(),
            reason: "Please enter the complete 6-digit OTP".to_string(),
        });
    }
    Ok(otp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockBackend;
    use crate::api::types::AuthData;
    use rust_decimal::Decimal;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn profile() -> UserProfile {
        UserProfile {
            id: Some("u1".to_string()),
            full_name: "Asha Rao".to_string(),
            phone_number: "9876543210".to_string(),
            wallet_balance: Decimal::ZERO,
            bonus_balance: Decimal::from(200),
        }
    }

    fn flow_with_cooldown(
        mock: Arc<MockBackend>,
        store: Arc<CredentialStore>,
        secs: u64,
    ) -> AuthFlow {
        AuthFlow::new(
            mock,
            store,
            &AuthConfig {
                resend_cooldown_secs: secs,
            },
        )
    }

    #[tokio::test]
    async fn test_bad_phone_never_reaches_the_backend() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        let flow = flow_with_cooldown(mock.clone(), store, 60);

        let err = flow.request_login_otp("98765").await.unwrap_err();
        assert!(err.is_local_validation());
        assert_eq!(mock.otp_send_calls.load(Ordering::SeqCst), 0);

        let err = flow.request_login_otp("987654321a").await.unwrap_err();
        assert!(err.is_local_validation());
        assert_eq!(mock.otp_send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_name_blocks_signup_request() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        let flow = flow_with_cooldown(mock.clone(), store, 60);

        let err = flow.request_signup_otp("  Al ", "9876543210").await.unwrap_err();
        match err {
            Error::InvalidInput { field, .. } => assert_eq!(field, "full_name"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        assert_eq!(mock.otp_send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_incomplete_otp_blocks_verification() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        let flow = flow_with_cooldown(mock.clone(), store, 60);

        let err = flow.verify_login_otp("9876543210", "123").await.unwrap_err();
        assert!(err.is_local_validation());
        assert_eq!(mock.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_persists_token_then_profile() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        mock.push_verification(AuthData {
            token: "tok-9".to_string(),
            user: profile(),
        });
        let flow = flow_with_cooldown(mock.clone(), store.clone(), 60);

        let user = flow.verify_login_otp("9876543210", "123456").await.unwrap();
        assert_eq!(user.full_name, "Asha Rao");
        assert_eq!(store.token().await.as_deref(), Some("tok-9"));
        assert_eq!(store.user().await.unwrap().bonus_balance, Decimal::from(200));
    }

    #[tokio::test]
    async fn test_failed_verification_leaves_store_empty() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        mock.push_verification_err(Error::Api {
            message: "Invalid OTP".to_string(),
            status_code: Some(400),
        });
        let flow = flow_with_cooldown(mock.clone(), store.clone(), 60);

        let err = flow.verify_login_otp("9876543210", "000000").await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_resend_waits_out_the_cooldown() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        mock.push_otp_message("OTP sent");
        let flow = flow_with_cooldown(mock.clone(), store, 60);

        flow.request_login_otp("9876543210").await.unwrap();
        let err = flow.resend_login_otp("9876543210").await.unwrap_err();
        match err {
            Error::ResendCooldown { remaining_secs } => assert!(remaining_secs >= 1),
            other => panic!("expected ResendCooldown, got {:?}", other),
        }
        assert_eq!(mock.otp_send_calls.load(Ordering::SeqCst), 1);
        assert!(flow.resend_available_in().await.is_some());
    }

    #[tokio::test]
    async fn test_zero_cooldown_allows_immediate_resend() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        mock.push_otp_message("OTP sent");
        mock.push_otp_message("OTP resent");
        let flow = flow_with_cooldown(mock.clone(), store, 0);

        flow.request_login_otp("9876543210").await.unwrap();
        let message = flow.resend_login_otp("9876543210").await.unwrap();
        assert_eq!(message.as_deref(), Some("OTP resent"));
        assert_eq!(mock.otp_send_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_the_session() {
        let mock = Arc::new(MockBackend::new());
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()));
        store.save_token("tok-1").await.unwrap();
        let flow = flow_with_cooldown(mock, store.clone(), 60);

        assert!(flow.is_authenticated().await);
        flow.logout().await.unwrap();
        assert!(!flow.is_authenticated().await);
    }
}
