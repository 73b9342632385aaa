use crate::error::{FetchError, StoreError};
use crate::types::{Category, RateRecord, RawTable};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches a page and hands back every table on it once fully loaded.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Must give up with `FetchErrorKind::Timeout` once `ready_timeout` elapses.
    async fn fetch(&self, url: &str, ready_timeout: Duration) -> Result<Vec<RawTable>, FetchError>;
}

/// Replace-on-write storage for the latest snapshot of a vendor's rates.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Deletes every stored row for `(vendor_id, category)` and inserts
    /// `records` as one logical operation.
    async fn replace(
        &self,
        vendor_id: &str,
        category: Category,
        records: &[RateRecord],
    ) -> Result<(), StoreError>;

    /// Current snapshot for a vendor, all categories.
    async fn list(&self, vendor_id: &str) -> Result<Vec<RateRecord>, StoreError>;
}
