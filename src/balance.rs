//! Wallet balance read model
//!
//! One owned snapshot feeds every consumer; screens subscribe instead of
//! keeping private copies. `refresh` fetches the live profile, persists it to
//! the credential store and publishes the result. When the fetch fails the
//! cached profile is published instead (zeros when no cache exists), so read
//! paths degrade without surfacing a blocking error.
//!
//! Each refresh carries a generation number. A fetch that completes after a
//! newer refresh has started is discarded, so the snapshot always reflects
//! the last refresh *started*, not the last one that happened to finish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::api::types::UserProfile;
use crate::api::BackendClient;
use crate::store::CredentialStore;

/// Where the numbers in a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSource {
    /// Fresh from the backend
    Live,
    /// Last persisted profile, shown because the fetch failed
    Cached,
    /// No live data and no cache
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    pub wallet_balance: Decimal,
    pub bonus_balance: Decimal,
    pub source: BalanceSource,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl BalanceSnapshot {
    pub fn empty() -> Self {
        Self {
            wallet_balance: Decimal::ZERO,
            bonus_balance: Decimal::ZERO,
            source: BalanceSource::Unavailable,
            fetched_at: None,
        }
    }

    /// Figure shown as "total balance", never negative
    pub fn total(&self) -> Decimal {
        (self.wallet_balance + self.bonus_balance).max(Decimal::ZERO)
    }

    /// Amount available for withdrawal; the bonus is not withdrawable
    pub fn withdrawable(&self) -> Decimal {
        self.wallet_balance.max(Decimal::ZERO)
    }

    pub fn is_live(&self) -> bool {
        self.source == BalanceSource::Live
    }
}

struct Inner {
    snapshot: BalanceSnapshot,
    generation: u64,
}

pub struct BalanceStore {
    client: Arc<dyn BackendClient>,
    store: Arc<CredentialStore>,
    inner: RwLock<Inner>,
    tx: watch::Sender<BalanceSnapshot>,
}

impl BalanceStore {
    pub fn new(client: Arc<dyn BackendClient>, store: Arc<CredentialStore>) -> Self {
        let snapshot = BalanceSnapshot::empty();
        let (tx, _rx) = watch::channel(snapshot.clone());
        Self {
            client,
            store,
            inner: RwLock::new(Inner {
                snapshot,
                generation: 0,
            }),
            tx,
        }
    }

    /// Watch for snapshot changes. The receiver starts on the current value.
    pub fn subscribe(&self) -> watch::Receiver<BalanceSnapshot> {
        self.tx.subscribe()
    }

    pub async fn snapshot(&self) -> BalanceSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    /// Fetch the live profile and publish the outcome
    pub async fn refresh(&self) -> BalanceSnapshot {
        let generation = self.begin().await;

        let snapshot = match self.client.get_user_profile().await {
            Ok(profile) => {
                if let Err(e) = self.store.save_user(&profile).await {
                    warn!("Could not cache fetched profile: {}", e);
                }
                info!(
                    "Balance refreshed: wallet ₹{}, bonus ₹{}",
                    profile.wallet_balance, profile.bonus_balance
                );
                from_profile(&profile, BalanceSource::Live, Some(Utc::now()))
            }
            Err(e) => {
                warn!("Balance fetch failed, falling back to cache: {}", e);
                match self.store.user().await {
                    Some(cached) => from_profile(&cached, BalanceSource::Cached, None),
                    None => BalanceSnapshot::empty(),
                }
            }
        };

        self.apply(generation, snapshot).await
    }

    async fn begin(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.generation
    }

    /// Publish `snapshot` unless a newer refresh started in the meantime
    async fn apply(&self, generation: u64, snapshot: BalanceSnapshot) -> BalanceSnapshot {
        let mut inner = self.inner.write().await;
        if generation != inner.generation {
            debug!(
                "Discarding stale balance response (generation {}, current {})",
                generation, inner.generation
            );
            return inner.snapshot.clone();
        }
        inner.snapshot = snapshot.clone();
        self.tx.send_replace(snapshot.clone());
        snapshot
    }
}

fn from_profile(
    profile: &UserProfile,
    source: BalanceSource,
    fetched_at: Option<DateTime<Utc>>,
) -> BalanceSnapshot {
    BalanceSnapshot {
        wallet_balance: profile.wallet_balance,
        bonus_balance: profile.bonus_balance,
        source,
        fetched_at,
    }
}
