use super::cancel::CancellationFlag;
use super::progress::{ProgressEvent, ProgressObserver, ProgressThrottle, DEFAULT_PROGRESS_INTERVAL};
use super::report::{HarvestError, RunReport, Termination};
use crate::config::HarvestConfig;
use crate::fetcher::HolderSource;
use crate::holders::{non_contract_holders, HolderRecord};
use crate::store::{HolderStore, StoreError};
use std::path::Path;
use std::time::{Duration, Instant};

const SUMMARY_TOP_HOLDERS: usize = 10;

#[derive(Debug, Default)]
struct Tally {
    pages: u64,
    total_fetched: u64,
    total_saved: u64,
}

/// Sequential fetch → filter → persist loop over one token's holder listing
///
/// Owns the store for the whole run and closes it before [`Harvester::run`]
/// returns, whatever the outcome.
pub struct Harvester<S, O> {
    source: S,
    store: HolderStore,
    observer: O,
    cancel: CancellationFlag,
    request_delay: Duration,
    progress_interval: Duration,
}

impl<S: HolderSource, O: ProgressObserver> Harvester<S, O> {
    pub fn new(
        config: &HarvestConfig,
        source: S,
        store: HolderStore,
        observer: O,
        cancel: CancellationFlag,
    ) -> Self {
        Self {
            source,
            store,
            observer,
            cancel,
            request_delay: config.request_delay,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Override the minimum spacing between progress events
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn store(&self) -> &HolderStore {
        &self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until the listing is exhausted, a fetch fails, or the flag is raised
    ///
    /// Statistics are gathered from whatever was committed, then the store is closed.
    pub async fn run(&mut self) -> RunReport {
        let started = Instant::now();
        let mut tally = Tally::default();

        let termination = match self.harvest(&mut tally, started).await {
            Ok(termination) => termination,
            Err(e) => {
                log::error!("❌ Harvest failed: {:?}", e);
                Termination::Failed(e)
            }
        };

        let stats = match self.store.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                log::warn!("⚠️  Could not read final statistics: {}", e);
                None
            }
        };
        let top_holders = self.store.top_holders(SUMMARY_TOP_HOLDERS).unwrap_or_else(|e| {
            log::warn!("⚠️  Could not read top holders: {}", e);
            Vec::new()
        });
        let db_path = self.store.path().map(Path::to_path_buf);

        if let Err(e) = self.store.close() {
            log::error!("❌ Failed to close store: {}", e);
        }

        let report = RunReport {
            termination,
            pages: tally.pages,
            total_fetched: tally.total_fetched,
            total_saved: tally.total_saved,
            stats,
            top_holders,
            elapsed: started.elapsed(),
            db_path,
        };

        log::info!(
            "Harvest finished: {} after {} pages ({} fetched, {} saved)",
            report.termination.label(),
            report.pages,
            report.total_fetched,
            report.total_saved
        );

        if let Err(e) = self.observer.on_finish(&report) {
            log::error!("❌ Failed to write summary: {}", e);
        }

        report
    }

    async fn harvest(&mut self, tally: &mut Tally, started: Instant) -> Result<Termination, HarvestError> {
        let mut cursor: Option<String> = None;
        let mut throttle = ProgressThrottle::new(self.progress_interval);

        loop {
            // Fetching
            let outcome = self.source.fetch_page(cursor.as_deref()).await;

            // A page that lands after cancellation is dropped unsaved
            if self.cancel.is_cancelled() {
                log::warn!("⚠️  Cancelled after {} pages, in-flight page discarded", tally.pages);
                return Ok(Termination::Interrupted);
            }

            let page = match outcome {
                Ok(page) => page,
                Err(e) => {
                    log::error!("❌ Stopping: {}", e);
                    return Ok(Termination::Aborted(e));
                }
            };

            if page.result.is_empty() {
                log::info!("✅ No more holders returned");
                return Ok(Termination::Done);
            }

            tally.pages += 1;
            let fetched = page.result.len();
            tally.total_fetched += fetched as u64;

            if tally.pages == 1 {
                if let Some(total_supply) = page.total_supply.as_deref() {
                    self.observer.on_total_supply(total_supply)?;
                }
            }

            let next_cursor = page.next_cursor().map(str::to_string);

            // Filtering
            let holders = non_contract_holders(page.result);

            // Persisting
            let saved = self.persist(&holders)?;
            tally.total_saved += saved as u64;

            log::debug!(
                "Page {}: fetched={} kept={} saved={}",
                tally.pages,
                fetched,
                holders.len(),
                saved
            );

            if throttle.should_emit(tally.pages, Instant::now()) {
                self.observer.on_page(&ProgressEvent {
                    page: tally.pages,
                    fetched,
                    saved,
                    total_fetched: tally.total_fetched,
                    total_saved: tally.total_saved,
                    elapsed: started.elapsed(),
                })?;
            }

            match next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    log::info!("✅ Reached the last page");
                    return Ok(Termination::Done);
                }
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }
    }

    /// A failed batch counts as zero saved; only a closed store stops the run
    fn persist(&mut self, holders: &[HolderRecord]) -> Result<usize, HarvestError> {
        match self.store.upsert(holders) {
            Ok(saved) => Ok(saved),
            Err(StoreError::Closed) => Err(HarvestError::Store(StoreError::Closed)),
            Err(e) => {
                log::warn!("⚠️  Batch of {} holders not saved: {}", holders.len(), e);
                Ok(0)
            }
        }
    }
}
