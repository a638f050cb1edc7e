//! Usage polling state.
//!
//! Caches the linked accounts and keeps the latest reading per account, with
//! change notifications for watchers.

use chrono::{DateTime, Utc};
use epbmeter_core::{AccountLink, BillingPeriod, UsageReading};
use epbmeter_fetch::{EpbError, UsageSource};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;

// ============================================================================
// Account Usage
// ============================================================================

/// Latest known usage for one linked account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountUsage {
    /// Utility account number.
    pub account_id: String,
    /// Reading from the last successful fetch.
    pub reading: Option<UsageReading>,
    /// False when the last fetch for this account failed.
    pub has_usage_data: bool,
    /// Service address of the premise.
    pub service_address: Option<String>,
    /// City of the premise.
    pub city: Option<String>,
    /// State of the premise.
    pub state: Option<String>,
    /// ZIP code of the premise.
    pub zip_code: Option<String>,
    /// Error from the last fetch, if it failed.
    pub error: Option<String>,
    /// When this entry was produced.
    pub updated_at: DateTime<Utc>,
}

impl AccountUsage {
    fn base(link: &AccountLink, at: DateTime<Utc>) -> Self {
        Self {
            account_id: link.account_id().to_string(),
            reading: None,
            has_usage_data: false,
            service_address: link.service_address().map(str::to_string),
            city: link.city().map(str::to_string),
            state: link.state().map(str::to_string),
            zip_code: link.zip_code().map(str::to_string),
            error: None,
            updated_at: at,
        }
    }

    /// Entry for a successful fetch.
    pub fn with_reading(link: &AccountLink, reading: UsageReading, at: DateTime<Utc>) -> Self {
        Self {
            reading: Some(reading),
            has_usage_data: true,
            ..Self::base(link, at)
        }
    }

    /// Entry for a failed fetch.
    pub fn failed(link: &AccountLink, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(link, at)
        }
    }
}

// ============================================================================
// Fetching
// ============================================================================

/// Fetches usage for `links` concurrently, in `period` or the current one.
///
/// Per-account failures become entries without data.
///
/// # Errors
///
/// `AuthFailed` as soon as any account reports rejected credentials; no
/// entries are returned in that case.
pub async fn fetch_usage(
    source: &dyn UsageSource,
    links: &[AccountLink],
    period: Option<BillingPeriod>,
) -> Result<Vec<AccountUsage>, StoreError> {
    let fetches = links.iter().map(|link| async move {
        let result = match period {
            Some(period) => {
                source
                    .get_usage_for_period(link.account_id(), link.gis_id(), period)
                    .await
            }
            None => source.get_usage(link.account_id(), link.gis_id()).await,
        };
        (link, result)
    });
    let results = join_all(fetches).await;

    let now = Utc::now();
    let mut usages = Vec::with_capacity(results.len());
    for (link, result) in results {
        match result {
            Ok(reading) => {
                debug!(account = %link.account_id(), kwh = reading.kwh, cost = reading.cost, "Usage updated");
                usages.push(AccountUsage::with_reading(link, reading, now));
            }
            Err(EpbError::Auth(msg)) => {
                warn!(account = %link.account_id(), error = %msg, "Authentication failed while fetching usage");
                return Err(StoreError::AuthFailed(msg));
            }
            Err(e) => {
                warn!(account = %link.account_id(), error = %e, "Failed to fetch usage");
                usages.push(AccountUsage::failed(link, e.to_string(), now));
            }
        }
    }
    Ok(usages)
}

// ============================================================================
// Inner State
// ============================================================================

#[derive(Default)]
struct UsageStoreInner {
    /// Linked accounts, fetched once and reused.
    accounts: Option<Vec<AccountLink>>,
    /// Latest usage by account id.
    usage: BTreeMap<String, AccountUsage>,
    /// Last completed refresh.
    last_refresh: Option<DateTime<Utc>>,
}

// ============================================================================
// Usage Store
// ============================================================================

/// Polling coordinator for all linked accounts.
///
/// Observable via a watch channel carrying a version counter.
pub struct UsageStore {
    source: Arc<dyn UsageSource>,
    inner: Arc<RwLock<UsageStoreInner>>,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl UsageStore {
    /// Creates a store that polls `source`.
    pub fn new(source: Arc<dyn UsageSource>) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            source,
            inner: Arc::new(RwLock::new(UsageStoreInner::default())),
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Fetches usage for every linked account.
    ///
    /// The account list is fetched on the first call only. Per-account
    /// failures are recorded on that account and do not abort the cycle.
    ///
    /// # Errors
    ///
    /// `AuthFailed` if the credentials are rejected (the caller should stop
    /// polling), `FetchFailed` if the account list cannot be fetched.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<AccountUsage>, StoreError> {
        let accounts = self.linked_accounts().await?;

        let updates = fetch_usage(self.source.as_ref(), &accounts, None).await?;
        let now = updates.first().map_or_else(Utc::now, |u| u.updated_at);

        {
            let mut inner = self.inner.write().await;
            for update in &updates {
                inner.usage.insert(update.account_id.clone(), update.clone());
            }
            inner.last_refresh = Some(now);
        }
        self.notify_change().await;

        info!(accounts = updates.len(), "Refresh complete");
        Ok(updates)
    }

    /// Returns the cached account list, fetching it if empty.
    pub async fn linked_accounts(&self) -> Result<Vec<AccountLink>, StoreError> {
        if let Some(accounts) = self.inner.read().await.accounts.clone() {
            return Ok(accounts);
        }

        let accounts = self
            .source
            .list_linked_accounts()
            .await
            .map_err(StoreError::from_fetch)?;

        if accounts.is_empty() {
            warn!("No linked accounts found");
        } else {
            info!(count = accounts.len(), "Discovered linked accounts");
        }

        self.inner.write().await.accounts = Some(accounts.clone());
        Ok(accounts)
    }

    /// Drops the cached account list so the next refresh re-discovers it.
    pub async fn clear_accounts(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.accounts = None;
            inner.usage.clear();
        }
        self.notify_change().await;
        debug!("Cleared cached accounts");
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Gets the latest usage for an account.
    pub async fn get(&self, account_id: &str) -> Option<AccountUsage> {
        self.inner.read().await.usage.get(account_id).cloned()
    }

    /// Gets the latest usage for all accounts, ordered by account id.
    pub async fn all(&self) -> Vec<AccountUsage> {
        self.inner.read().await.usage.values().cloned().collect()
    }

    /// Gets the last refresh time.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    /// Checks if the data is older than `threshold`.
    pub async fn is_stale(&self, threshold: Duration) -> bool {
        match self.last_refresh().await {
            Some(time) => {
                let age = Utc::now().signed_duration_since(time);
                age > chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX)
            }
            None => true,
        }
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to store changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================
