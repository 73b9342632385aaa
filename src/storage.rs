use crate::app::ports::RateStore;
use crate::error::StoreError;
use crate::types::{Category, RateRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// One `replace` invocation as seen by the store.
pub type ReplaceCall = (String, Category, Vec<RateRecord>);

/// In-memory rate store for development/testing
#[derive(Clone, Default)]
pub struct InMemoryRateStore {
    snapshots: Arc<Mutex<HashMap<(String, Category), Vec<RateRecord>>>>,
    calls: Arc<Mutex<Vec<ReplaceCall>>>,
}

impl InMemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every replace call so far, oldest first.
    pub fn replace_calls(&self) -> Vec<ReplaceCall> {
        lock(&self.calls).map(|c| c.clone()).unwrap_or_default()
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::connection("in-memory store lock poisoned"))
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn replace(
        &self,
        vendor_id: &str,
        category: Category,
        records: &[RateRecord],
    ) -> Result<(), StoreError> {
        let mut snapshots = lock(&self.snapshots)?;
        snapshots.insert((vendor_id.to_string(), category), records.to_vec());
        lock(&self.calls)?.push((vendor_id.to_string(), category, records.to_vec()));

        debug!("Replaced {} {} records for {}", records.len(), category, vendor_id);
        Ok(())
    }

    async fn list(&self, vendor_id: &str) -> Result<Vec<RateRecord>, StoreError> {
        let snapshots = lock(&self.snapshots)?;
        let mut keys: Vec<&(String, Category)> =
            snapshots.keys().filter(|(v, _)| v == vendor_id).collect();
        keys.sort_by_key(|(_, c)| *c);
        Ok(keys
            .into_iter()
            .flat_map(|k| snapshots[k].iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(vendor: &str, category: Category, name: &str) -> RateRecord {
        RateRecord {
            vendor_id: vendor.into(),
            category,
            detail_name: name.into(),
            we_buy: Decimal::new(25010, 2),
            we_sell: None,
            purity: None,
        }
    }

    #[tokio::test]
    async fn replace_discards_previous_snapshot_for_that_category_only() {
        let store = InMemoryRateStore::new();
        store
            .replace("a", Category::OurRates, &[record("a", Category::OurRates, "old")])
            .await
            .unwrap();
        store
            .replace("a", Category::CustomerSell, &[record("a", Category::CustomerSell, "keep")])
            .await
            .unwrap();
        store
            .replace("b", Category::OurRates, &[record("b", Category::OurRates, "other")])
            .await
            .unwrap();
        store
            .replace("a", Category::OurRates, &[record("a", Category::OurRates, "new")])
            .await
            .unwrap();

        let names: Vec<String> = store
            .list("a")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.detail_name)
            .collect();
        assert_eq!(names, vec!["new", "keep"]);
        assert_eq!(store.replace_calls().len(), 4);
    }
}
