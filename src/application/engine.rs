//! Generic bounded-concurrency harvest engine.
//!
//! One engine drives both passes: it dispatches every work item through a
//! counting semaphore, drains task results in completion order, feeds
//! successes to the batch persister, and resubmits the failed set exactly
//! once. A unit failure never aborts the pass; a snapshot write failure
//! always does.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::persister::{BatchPersister, MergePolicy};

/// Completions between progress lines in the drain loop.
const PROGRESS_INTERVAL: usize = 50;

// A pass over the full keyword set runs for a while; surface how far along
// it is every interval and once more when the last item lands.
fn progress_due(completed: usize, total: usize) -> bool {
    completed == total || completed % PROGRESS_INTERVAL == 0
}

/// One unit of work: a logical query with enough context to retry and to
/// attribute failures in the log.
pub trait WorkItem: Clone + Send + Sync + 'static {
    fn describe(&self) -> String;
}

/// Fetch-and-extract logic for one kind of work item.
#[async_trait]
pub trait WorkProcessor: Send + Sync + 'static {
    type Item: WorkItem;
    type Record: Send + 'static;

    /// Process one item, returning every record it produced. Any error is
    /// the unit's failure; partial output is never returned.
    async fn process(&self, item: &Self::Item, retry_attempt: u32) -> Result<Vec<Self::Record>>;
}

/// Outcome of a full engine run (initial pass plus retry pass).
#[derive(Debug, Default)]
pub struct HarvestSummary {
    pub total_items: usize,
    pub succeeded: usize,
    pub records: usize,
    /// Items resubmitted in the retry pass.
    pub retried: usize,
    /// Descriptions of items that failed both passes.
    pub permanent_failures: Vec<String>,
}

pub struct HarvestEngine<P: WorkProcessor> {
    processor: Arc<P>,
    max_concurrent: usize,
}

impl<P: WorkProcessor> HarvestEngine<P> {
    pub fn new(processor: Arc<P>, max_concurrent: usize) -> Self {
        Self {
            processor,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run every item under the concurrency gate, retry the failed set
    /// once, and leave the persister fully flushed.
    pub async fn run<M>(
        &self,
        items: Vec<P::Item>,
        persister: &mut BatchPersister<M>,
    ) -> Result<HarvestSummary>
    where
        M: MergePolicy<Record = P::Record>,
    {
        let mut summary = HarvestSummary {
            total_items: items.len(),
            ..HarvestSummary::default()
        };

        let failed = self.run_pass(items, 0, persister, &mut summary).await?;

        // Everything the initial pass produced is durable before the retry
        // pass starts.
        persister.flush_pending()?;

        if !failed.is_empty() {
            info!("Retrying {} failed item(s)...", failed.len());
            summary.retried = failed.len();

            let terminal = self.run_pass(failed, 1, persister, &mut summary).await?;
            for item in &terminal {
                error!("Retry also failed for {}", item.describe());
                summary.permanent_failures.push(item.describe());
            }
        }

        persister.flush_final()?;
        Ok(summary)
    }

    /// One dispatch-and-drain pass. Returns the items that failed.
    async fn run_pass<M>(
        &self,
        items: Vec<P::Item>,
        retry_attempt: u32,
        persister: &mut BatchPersister<M>,
        summary: &mut HarvestSummary,
    ) -> Result<Vec<P::Item>>
    where
        M: MergePolicy<Record = P::Record>,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let total = items.len();

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let processor = Arc::clone(&self.processor);
            tasks.spawn(async move {
                // Hold one slot for the whole fetch+extract unit; released
                // on drop whatever the outcome.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(closed) => return (item, Err(closed.into())),
                };
                let result = processor.process(&item, retry_attempt).await;
                (item, result)
            });
        }

        // Results arrive in completion order, not submission order; only
        // this loop touches the persister.
        let mut failed = Vec::new();
        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            if progress_due(completed, total) {
                info!("Processed {}/{} item(s)", completed, total);
            }
            match joined {
                Ok((_, Ok(records))) => {
                    summary.succeeded += 1;
                    summary.records += records.len();
                    for record in records {
                        persister.accumulate(record);
                    }
                    persister.flush_if_due()?;
                }
                Ok((item, Err(error))) => {
                    warn!("Error harvesting {}: {error:#}", item.describe());
                    failed.push(item);
                }
                Err(join_error) => {
                    // Panicked task; its item is gone and cannot be retried.
                    error!("Harvest task aborted: {join_error}");
                    summary
                        .permanent_failures
                        .push(format!("aborted task: {join_error}"));
                }
            }
        }

        Ok(failed)
    }
}

impl HarvestSummary {
    pub fn log(&self, pass: &str) {
        info!(
            "{pass} pass complete: {}/{} item(s) succeeded, {} record(s), {} retried, {} permanent failure(s)",
            self.succeeded,
            self.total_items,
            self.records,
            self.retried,
            self.permanent_failures.len()
        );
        for failure in &self.permanent_failures {
            warn!("Permanent failure: {failure}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::persister::{load_snapshot, ListingMerge};
    use crate::domain::CourseListing;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone)]
    struct KeywordItem(String);

    impl WorkItem for KeywordItem {
        fn describe(&self) -> String {
            format!("keyword '{}'", self.0)
        }
    }

    fn listing(keyword: &str, retry_attempt: u32) -> CourseListing {
        CourseListing {
            class_number: format!("cn-{keyword}"),
            term_code: "0975".to_string(),
            keyword: keyword.to_string(),
            scraped_at: "2026-01-15T09:30:00".to_string(),
            retry_attempt,
        }
    }

    /// Fails configured keywords a fixed number of times, then succeeds.
    struct FlakyProcessor {
        failures_by_keyword: Mutex<std::collections::HashMap<String, u32>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl FlakyProcessor {
        fn new(failures: &[(&str, u32)]) -> Self {
            Self {
                failures_by_keyword: Mutex::new(
                    failures
                        .iter()
                        .map(|(k, n)| (k.to_string(), *n))
                        .collect(),
                ),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay: Duration::from_millis(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl WorkProcessor for FlakyProcessor {
        type Item = KeywordItem;
        type Record = CourseListing;

        async fn process(&self, item: &KeywordItem, retry_attempt: u32) -> Result<Vec<CourseListing>> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let should_fail = {
                let mut failures = self.failures_by_keyword.lock().unwrap();
                match failures.get_mut(&item.0) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        true
                    }
                    _ => false,
                }
            };

            if should_fail {
                anyhow::bail!("injected failure for '{}'", item.0);
            }
            Ok(vec![listing(&item.0, retry_attempt)])
        }
    }

    fn items(keywords: &[&str]) -> Vec<KeywordItem> {
        keywords.iter().map(|k| KeywordItem(k.to_string())).collect()
    }

    #[tokio::test]
    async fn all_successes_reach_the_snapshot_for_any_batch_size() {
        for batch_size in [1, 3, 100] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("listings.json");
            let mut persister = BatchPersister::<ListingMerge>::load(&path, batch_size).unwrap();

            let engine = HarvestEngine::new(Arc::new(FlakyProcessor::new(&[])), 4);
            let summary = engine
                .run(items(&["001", "002", "003", "004", "005"]), &mut persister)
                .await
                .unwrap();

            assert_eq!(summary.succeeded, 5);
            assert!(summary.permanent_failures.is_empty());

            let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
            let keywords: HashSet<String> =
                stored.iter().map(|l| l.keyword.clone()).collect();
            assert_eq!(stored.len(), 5, "batch_size={batch_size}");
            assert_eq!(keywords.len(), 5);
        }
    }

    #[tokio::test]
    async fn single_failure_is_retried_once_and_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 100).unwrap();

        let engine = HarvestEngine::new(Arc::new(FlakyProcessor::new(&[("002", 1)])), 4);
        let summary = engine
            .run(items(&["001", "002", "003"]), &mut persister)
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.retried, 1);
        assert!(summary.permanent_failures.is_empty());

        let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
        assert_eq!(stored.len(), 3);
        let retried: Vec<&CourseListing> =
            stored.iter().filter(|l| l.keyword == "002").collect();
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].retry_attempt, 1);
    }

    #[tokio::test]
    async fn double_failure_is_terminal_and_absent_from_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 100).unwrap();

        let engine = HarvestEngine::new(Arc::new(FlakyProcessor::new(&[("002", 2)])), 4);
        let summary = engine
            .run(items(&["001", "002", "003"]), &mut persister)
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.retried, 1);
        assert_eq!(summary.permanent_failures, vec!["keyword '002'".to_string()]);

        let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|l| l.keyword != "002"));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_the_gate_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 100).unwrap();

        let processor =
            Arc::new(FlakyProcessor::new(&[]).with_delay(Duration::from_millis(20)));
        let keywords: Vec<String> = (0..24).map(|i| format!("{i:03}")).collect();
        let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();

        let engine = HarvestEngine::new(Arc::clone(&processor), 3);
        engine.run(items(&keyword_refs), &mut persister).await.unwrap();

        assert!(processor.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn progress_lines_fire_at_the_interval_and_at_completion() {
        assert!(progress_due(50, 1053));
        assert!(progress_due(100, 1053));
        assert!(!progress_due(51, 1053));
        assert!(!progress_due(1052, 1053));
        assert!(progress_due(1053, 1053));

        // short work sets report once, when the last item lands
        assert!(!progress_due(2, 3));
        assert!(progress_due(3, 3));
    }

    #[tokio::test]
    async fn empty_work_set_still_writes_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 100).unwrap();

        let engine = HarvestEngine::new(Arc::new(FlakyProcessor::new(&[])), 4);
        let summary = engine.run(Vec::new(), &mut persister).await.unwrap();

        assert_eq!(summary.total_items, 0);
        assert!(path.exists());
    }
}
