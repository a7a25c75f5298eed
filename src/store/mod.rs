//! Credential persistence
//!
//! The bearer token and the last fetched user profile live in two independent
//! files under the data directory. Writes are last-write-wins and there is no
//! transactional guarantee across the two, so interleaved writers can leave a
//! token from one session next to a profile from another. Reads never fail
//! loudly: missing or unreadable files read back as `None`.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::types::UserProfile;
use crate::error::{Error, Result};

const TOKEN_FILE: &str = "token";
const USER_FILE: &str = "user.json";

pub struct CredentialStore {
    dir: PathBuf,
    // Serializes writers; readers share
    io: RwLock<()>,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            io: RwLock::new(()),
        }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join(USER_FILE)
    }

    pub async fn save_token(&self, token: &str) -> Result<()> {
        let _guard = self.io.write().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", self.dir.display(), e)))?;
        let path = self.token_path();
        tokio::fs::write(&path, token)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write token: {}", e)))?;
        restrict_permissions(&path).await;
        debug!("Saved bearer token");
        Ok(())
    }

    /// Current bearer token, `None` when logged out or unreadable
    pub async fn token(&self) -> Option<String> {
        let _guard = self.io.read().await;
        match tokio::fs::read_to_string(self.token_path()).await {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token: {}", e);
                None
            }
        }
    }

    pub async fn save_user(&self, user: &UserProfile) -> Result<()> {
        let _guard = self.io.write().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", self.dir.display(), e)))?;
        let json = serde_json::to_string_pretty(user)?;
        tokio::fs::write(self.user_path(), json)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write user profile: {}", e)))?;
        debug!("Cached user profile for {}", user.phone_number);
        Ok(())
    }

    /// Last cached user profile, `None` when absent or corrupt
    pub async fn user(&self) -> Option<UserProfile> {
        let _guard = self.io.read().await;
        let raw = match tokio::fs::read_to_string(self.user_path()).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read cached profile: {}", e);
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Cached profile is corrupt, ignoring it: {}", e);
                None
            }
        }
    }

    /// Remove both credential files. Missing files are fine.
    pub async fn clear_auth(&self) -> Result<()> {
        let _guard = self.io.write().await;
        for path in [self.token_path(), self.user_path()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        debug!("Cleared stored credentials");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    if let Err(e) = tokio::fs::set_permissions(path, perms).await {
        warn!("Failed to restrict token permissions: {}", e);
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn profile() -> UserProfile {
        UserProfile {
            id: Some("u1".to_string()),
            full_name: "Asha Rao".to_string(),
            phone_number: "9876543210".to_string(),
            wallet_balance: Decimal::from(5000),
            bonus_balance: Decimal::from(200),
        }
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        assert!(!store.is_authenticated().await);
        store.save_token("tok-123").await.unwrap();
        assert_eq!(store.token().await.as_deref(), Some("tok-123"));
        assert!(store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        assert!(store.user().await.is_none());
        store.save_user(&profile()).await.unwrap();
        let cached = store.user().await.unwrap();
        assert_eq!(cached.full_name, "Asha Rao");
        assert_eq!(cached.wallet_balance, Decimal::from(5000));
    }

    #[tokio::test]
    async fn test_clear_auth_removes_both_keys() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store.save_token("tok-123").await.unwrap();
        store.save_user(&profile()).await.unwrap();
        store.clear_auth().await.unwrap();

        assert!(store.token().await.is_none());
        assert!(store.user().await.is_none());
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_clear_auth_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.clear_auth().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_profile_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        tokio::fs::write(dir.path().join(USER_FILE), "{not json")
            .await
            .unwrap();
        assert!(store.user().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        tokio::fs::write(dir.path().join(TOKEN_FILE), "  ")
            .await
            .unwrap();
        assert!(!store.is_authenticated().await);
    }
}
