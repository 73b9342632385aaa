use crate::app::ports::{PageSource, RateStore};
use crate::config::VendorProfile;
use crate::constants::NO_DATA_REASON;
use crate::extract::{classify, extract_rows};
use crate::idempotency::batch_fingerprint;
use crate::types::{ExtractionBatch, ExtractionOutcome, RawTable};
use metrics::{counter, histogram};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Per-run knobs that are not part of a vendor profile.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ready_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(crate::constants::DEFAULT_READY_TIMEOUT_SECS),
        }
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Classify the page's tables and extract every category into one batch.
    ///
    /// Categories with no classified table contribute nothing; the others
    /// are unaffected.
    #[instrument(skip(profile, tables), fields(vendor = %profile.vendor_id, tables = tables.len()))]
    pub fn extract_batch(profile: &VendorProfile, tables: &[RawTable]) -> ExtractionBatch {
        let classification = classify(tables, profile);
        let mut records = Vec::new();

        for category in &profile.categories {
            let Some(Some(classified)) = classification.get(&category.category) else {
                continue;
            };
            let extracted = extract_rows(classified, category, profile);
            info!(
                "Extracted {} {} records from table {}",
                extracted.len(),
                category.category,
                classified.index
            );
            counter!(
                "gold_rates_records_total",
                "vendor" => profile.vendor_id.clone(),
                "category" => category.category.as_str()
            )
            .increment(extracted.len() as u64);
            records.extend(extracted);
        }

        ExtractionBatch::new(profile.vendor_id.clone(), records)
    }

    /// Run fetch, classify, extract, validate and replace for one vendor.
    ///
    /// The caller must not start a second run for the same vendor while this
    /// one is in flight; see [`crate::tasks::VendorRunGuard`].
    #[instrument(skip(profile, source, store, options), fields(vendor = %profile.vendor_id))]
    pub async fn run_for_vendor(
        profile: &VendorProfile,
        source: &dyn PageSource,
        store: &dyn RateStore,
        options: RunOptions,
    ) -> ExtractionOutcome {
        info!("Starting extraction for {} at {}", profile.display_name, profile.url);

        // Step 1: Fetch
        let t_fetch = std::time::Instant::now();
        let fetched = source.fetch(&profile.url, options.ready_timeout).await;
        histogram!("gold_rates_fetch_duration_seconds", "vendor" => profile.vendor_id.clone())
            .record(t_fetch.elapsed().as_secs_f64());
        let tables = match fetched {
            Ok(tables) => tables,
            Err(e) => {
                error!("Fetch failed for {}: {}", profile.vendor_id, e);
                return Self::finish(profile, ExtractionOutcome::failed(0, e.to_string()));
            }
        };
        info!("Found {} tables on the page", tables.len());

        // Step 2 + 3: Classify and extract
        let batch = Self::extract_batch(profile, &tables);

        // Step 4: Validate; an empty batch must never clear stored data
        if batch.is_empty() {
            warn!("No data extracted for {}; store left untouched", profile.vendor_id);
            return Self::finish(profile, ExtractionOutcome::failed(0, NO_DATA_REASON));
        }
        info!(
            "Extracted {} records, fingerprint {}",
            batch.len(),
            batch_fingerprint(batch.vendor_id(), batch.records())
        );

        // Step 5: Replace, one category at a time
        if let Err(reason) = Self::replace_batch(profile, &batch, store).await {
            return Self::finish(profile, ExtractionOutcome::failed(batch.len(), reason));
        }

        Self::finish(profile, ExtractionOutcome::succeeded(batch.len()))
    }

    /// Every category in the profile is replaced, empty ones included, so
    /// the stored snapshot always comes from a single run.
    async fn replace_batch(
        profile: &VendorProfile,
        batch: &ExtractionBatch,
        store: &dyn RateStore,
    ) -> Result<(), String> {
        for category in &profile.categories {
            let records = batch.for_category(category.category);
            if records.is_empty() {
                debug!("No {} records this run; clearing stored rows", category.category);
            }
            match store.replace(batch.vendor_id(), category.category, &records).await {
                Ok(()) => info!("Replaced {} {} records", records.len(), category.category),
                Err(e) => {
                    error!("Replacing {} records failed: {}", category.category, e);
                    return Err(e.to_string());
                }
            }
        }
        Ok(())
    }

    fn finish(profile: &VendorProfile, outcome: ExtractionOutcome) -> ExtractionOutcome {
        let label = if outcome.success { "success" } else { "failure" };
        counter!(
            "gold_rates_runs_total",
            "vendor" => profile.vendor_id.clone(),
            "outcome" => label
        )
        .increment(1);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use crate::storage::InMemoryRateStore;
    use crate::types::{Category, RateRecord};
    use crate::vendors;
    use async_trait::async_trait;

    struct FixedPage(Result<Vec<RawTable>, FetchError>);

    #[async_trait]
    impl PageSource for FixedPage {
        async fn fetch(&self, _url: &str, _t: Duration) -> Result<Vec<RawTable>, FetchError> {
            self.0.clone()
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RateStore for BrokenStore {
        async fn replace(&self, _v: &str, _c: Category, _r: &[RateRecord]) -> Result<(), StoreError> {
            Err(StoreError::connection("database is locked"))
        }

        async fn list(&self, _v: &str) -> Result<Vec<RateRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn ms_gold_page() -> Vec<RawTable> {
        vec![
            RawTable::from_rows(vec![
                vec!["DETAILS", "WE BUY", "WE SELL"],
                vec!["Gold MYR/g", "401.20", "420.50"],
            ]),
            RawTable::from_rows(vec![vec!["DETAILS", "WE BUY"], vec!["916 Gold", "365.40"]]),
        ]
    }

    #[tokio::test]
    async fn fetch_timeout_fails_without_touching_store() {
        let store = InMemoryRateStore::new();
        let source = FixedPage(Err(FetchError::timeout("page not ready after 15s")));
        let outcome =
            Pipeline::run_for_vendor(&vendors::ms_gold(), &source, &store, RunOptions::default()).await;
        assert!(!outcome.success);
        assert!(outcome.reason.unwrap().contains("timeout"));
        assert_eq!(store.replace_calls().len(), 0);
    }

    #[tokio::test]
    async fn replaces_each_category_that_produced_records() {
        let store = InMemoryRateStore::new();
        let source = FixedPage(Ok(ms_gold_page()));
        let outcome =
            Pipeline::run_for_vendor(&vendors::ms_gold(), &source, &store, RunOptions::default()).await;
        assert_eq!(outcome, ExtractionOutcome::succeeded(2));

        let calls = store.replace_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, Category::OurRates);
        assert_eq!(calls[1].1, Category::CustomerSell);
        assert_eq!(calls[1].2[0].detail_name, "916 MYR / Gram");
    }

    #[tokio::test]
    async fn missing_category_is_cleared_from_the_snapshot() {
        let store = InMemoryRateStore::new();
        let profile = vendors::ms_gold();
        let full = FixedPage(Ok(ms_gold_page()));
        Pipeline::run_for_vendor(&profile, &full, &store, RunOptions::default()).await;

        let partial = FixedPage(Ok(vec![ms_gold_page().remove(0)]));
        let outcome = Pipeline::run_for_vendor(&profile, &partial, &store, RunOptions::default()).await;
        assert_eq!(outcome, ExtractionOutcome::succeeded(1));

        let stored = store.list("ms_gold").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].category, Category::OurRates);
        assert_eq!(stored[0].detail_name, "999.9 Gold MYR / Gram");

        let calls = store.replace_calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].1, Category::CustomerSell);
        assert!(calls[3].2.is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let source = FixedPage(Ok(ms_gold_page()));
        let outcome =
            Pipeline::run_for_vendor(&vendors::ms_gold(), &source, &BrokenStore, RunOptions::default())
                .await;
        assert!(!outcome.success);
        assert_eq!(outcome.record_count, 2);
        assert!(outcome.reason.unwrap().contains("database is locked"));
    }

    #[test]
    fn page_without_rate_tables_yields_empty_batch() {
        let tables = vec![RawTable::from_rows(vec![vec!["Opening hours", "9am"]])];
        let batch = Pipeline::extract_batch(&vendors::ms_gold(), &tables);
        assert!(batch.is_empty());
        assert_eq!(batch.vendor_id(), "ms_gold");
    }
}
