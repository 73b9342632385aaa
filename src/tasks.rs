use crate::app::ports::{PageSource, RateStore};
use crate::config::VendorProfile;
use crate::pipeline::{Pipeline, RunOptions};
use crate::types::ExtractionOutcome;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// Tracks which vendors have a run in flight.
///
/// Replacing a vendor's rows is not safe alongside another read/write of the
/// same rows, so at most one run per vendor may hold a permit. Different
/// vendors never contend.
#[derive(Clone, Default)]
pub struct VendorRunGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one vendor's run; released on drop.
pub struct RunPermit {
    vendor_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.vendor_id);
        }
    }
}

impl VendorRunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when a run for this vendor is already in flight.
    pub fn try_acquire(&self, vendor_id: &str) -> Option<RunPermit> {
        let mut set = self.in_flight.lock().ok()?;
        if !set.insert(vendor_id.to_string()) {
            return None;
        }
        Some(RunPermit {
            vendor_id: vendor_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_running(&self, vendor_id: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(vendor_id))
            .unwrap_or(false)
    }
}

/// One guarded pipeline run, tagged with a fresh run id.
pub async fn run_vendor(
    guard: &VendorRunGuard,
    profile: &VendorProfile,
    source: &dyn PageSource,
    store: &dyn RateStore,
    options: RunOptions,
) -> ExtractionOutcome {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("vendor_run", vendor = %profile.vendor_id, %run_id);

    async move {
        let Some(_permit) = guard.try_acquire(&profile.vendor_id) else {
            warn!("A run for {} is already in progress; skipping", profile.vendor_id);
            return ExtractionOutcome::failed(0, "run already in progress");
        };

        let outcome = Pipeline::run_for_vendor(profile, source, store, options).await;
        if outcome.success {
            info!(
                "Successfully extracted and saved {} records from {}",
                outcome.record_count, profile.display_name
            );
        } else {
            error!(
                "Failed to extract data from {}: {}",
                profile.display_name,
                outcome.reason.as_deref().unwrap_or("unknown")
            );
        }
        outcome
    }
    .instrument(span)
    .await
}

/// Runs every vendor once per `interval`, vendors concurrently with each
/// other. A vendor whose previous run is still going is skipped for that tick.
/// Runs until the task is cancelled.
pub async fn run_schedule(
    profiles: Vec<VendorProfile>,
    source: Arc<dyn PageSource>,
    store: Arc<dyn RateStore>,
    options: RunOptions,
    interval: Duration,
) {
    let guard = VendorRunGuard::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        info!("Scheduled tick: {} vendors", profiles.len());
        for profile in &profiles {
            if guard.is_running(&profile.vendor_id) {
                warn!("{} still running from a previous tick; skipping", profile.vendor_id);
                continue;
            }
            let guard = guard.clone();
            let profile = profile.clone();
            let source = Arc::clone(&source);
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                run_vendor(&guard, &profile, source.as_ref(), store.as_ref(), options).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::storage::InMemoryRateStore;
    use crate::types::RawTable;
    use crate::vendors;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    #[test]
    fn one_permit_per_vendor() {
        let guard = VendorRunGuard::new();
        let first = guard.try_acquire("ms_gold").unwrap();
        assert!(guard.try_acquire("ms_gold").is_none());
        assert!(guard.try_acquire("ttt_bullion").is_some());
        drop(first);
        assert!(guard.try_acquire("ms_gold").is_some());
    }

    /// Blocks in fetch until released, so a run can be held in flight.
    struct GatedPage {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PageSource for GatedPage {
        async fn fetch(&self, _url: &str, _t: Duration) -> Result<Vec<RawTable>, FetchError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![RawTable::from_rows(vec![
                vec!["Detail", "Buy", "Sell"],
                vec!["Gold 1g", "250.10", "255.00"],
            ])])
        }
    }

    #[tokio::test]
    async fn overlapping_run_for_same_vendor_is_refused() {
        let guard = VendorRunGuard::new();
        let source = Arc::new(GatedPage { entered: Notify::new(), release: Notify::new() });
        let store = Arc::new(InMemoryRateStore::new());
        let profile = vendors::ttt_bullion();

        let first = {
            let (guard, source, store, profile) =
                (guard.clone(), Arc::clone(&source), Arc::clone(&store), profile.clone());
            tokio::spawn(async move {
                run_vendor(&guard, &profile, source.as_ref(), store.as_ref(), RunOptions::default()).await
            })
        };
        source.entered.notified().await;

        let second =
            run_vendor(&guard, &profile, source.as_ref(), store.as_ref(), RunOptions::default()).await;
        assert!(!second.success);
        assert_eq!(second.reason.as_deref(), Some("run already in progress"));

        source.release.notify_one();
        let first = first.await.unwrap();
        assert!(first.success);
        assert_eq!(store.replace_calls().len(), 1);
        assert!(!guard.is_running("ttt_bullion"));
    }
}
