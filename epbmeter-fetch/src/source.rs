//! Usage source abstraction.
//!
//! Hosts that poll usage depend on this trait rather than on [`EpbClient`]
//! directly, so they can be driven by a fake in tests.

use async_trait::async_trait;
use epbmeter_core::{AccountLink, BillingPeriod, UsageReading};

use crate::client::EpbClient;
use crate::error::EpbError;

/// Something that can list accounts and report their usage.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Lists the accounts linked to the user.
    async fn list_linked_accounts(&self) -> Result<Vec<AccountLink>, EpbError>;

    /// Fetches usage for one account in the current billing period.
    async fn get_usage(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
    ) -> Result<UsageReading, EpbError>;

    /// Fetches usage for one account in a specific billing period.
    async fn get_usage_for_period(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
        period: BillingPeriod,
    ) -> Result<UsageReading, EpbError>;
}

#[async_trait]
impl UsageSource for EpbClient {
    async fn list_linked_accounts(&self) -> Result<Vec<AccountLink>, EpbError> {
        EpbClient::list_linked_accounts(self).await
    }

    async fn get_usage(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
    ) -> Result<UsageReading, EpbError> {
        EpbClient::get_usage(self, account_id, gis_id).await
    }

    async fn get_usage_for_period(
        &self,
        account_id: &str,
        gis_id: Option<&str>,
        period: BillingPeriod,
    ) -> Result<UsageReading, EpbError> {
        EpbClient::get_usage_for_period(self, account_id, gis_id, period).await
    }
}
