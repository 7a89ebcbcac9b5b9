//! Bounded-concurrency batch execution.
//!
//! [`parallel_map`] runs one async operation per item on a task group
//! whose concurrency is capped by a semaphore. Outcomes are collected in
//! completion order.

use rpctl_retries::{RpctlError, RpctlResult};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, warn};

/// Hard ceiling on concurrent operations, whatever the caller asks for.
pub const MAX_WORKERS_CAP: usize = 20;

/// Worker count used when the caller does not pick one.
pub const DEFAULT_WORKERS: usize = 5;

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchResult<T, R> {
    /// Successful results, in completion order.
    pub succeeded: Vec<R>,
    /// Failed items with their errors, in completion order.
    pub failed: Vec<(T, RpctlError)>,
}

impl<T, R> Default for BatchResult<T, R> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T, R> BatchResult<T, R> {
    /// Number of items processed.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether no item failed.
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// Exit code of the first failure, if any.
    pub fn first_exit_code(&self) -> Option<i32> {
        self.failed.first().map(|(_, error)| error.exit_code())
    }

    /// Turn failures into a [`RpctlError::PartialFailure`].
    pub fn check(&self) -> RpctlResult<()> {
        match self.first_exit_code() {
            None => Ok(()),
            Some(exit_code) => Err(RpctlError::PartialFailure {
                failed: self.failed.len(),
                total: self.total(),
                exit_code,
            }),
        }
    }
}

/// Options for [`parallel_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Requested concurrency, clamped to `1..=min(MAX_WORKERS_CAP, items)`.
    pub max_workers: usize,
    /// Abort the batch on the first failure.
    pub stop_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_WORKERS,
            stop_on_error: false,
        }
    }
}

impl BatchOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set requested concurrency.
    #[must_use]
    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    /// Abort on the first failure.
    #[must_use]
    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}

/// Concurrency actually used for `items` items.
pub fn effective_workers(requested: usize, items: usize) -> usize {
    if items == 0 {
        return 0;
    }
    requested.clamp(1, MAX_WORKERS_CAP.min(items))
}

/// Run `operation` on every item with bounded concurrency.
///
/// Without `stop_on_error` every item runs to completion and the result
/// holds all outcomes. With it, the first failure aborts every pending and
/// in-flight operation, waits for them to wind down and returns
/// [`RpctlError::BatchStopped`] naming the item; results gathered so far
/// are discarded.
///
/// No task outlives the call.
pub async fn parallel_map<T, R, F, Fut>(
    items: Vec<T>,
    options: BatchOptions,
    operation: F,
) -> RpctlResult<BatchResult<T, R>>
where
    T: fmt::Display + Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpctlResult<R>> + Send + 'static,
{
    let mut result = BatchResult::default();
    if items.is_empty() {
        return Ok(result);
    }

    let workers = effective_workers(options.max_workers, items.len());
    debug!(items = items.len(), workers, "Starting batch");

    let semaphore = Arc::new(Semaphore::new(workers));
    let operation = Arc::new(operation);
    let mut tasks = JoinSet::new();
    let mut pending: HashMap<Id, T> = HashMap::with_capacity(items.len());

    for item in items {
        let sem = semaphore.clone();
        let op = operation.clone();
        let key = item.clone();
        let handle = tasks.spawn(async move {
            let outcome = match sem.acquire_owned().await {
                Ok(_permit) => op(item.clone()).await,
                Err(_) => Err(RpctlError::api("Batch executor shut down")),
            };
            (item, outcome)
        });
        pending.insert(handle.id(), key);
    }

    while let Some(joined) = tasks.join_next().await {
        let (item, outcome) = match joined {
            Ok(pair) => pair,
            Err(err) if err.is_panic() => {
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                std::panic::resume_unwind(err.into_panic());
            }
            Err(err) => match pending.remove(&err.id()) {
                Some(item) => {
                    debug!(item = %item, "Batch task cancelled");
                    result.failed.push((item, RpctlError::api("Batch task cancelled")));
                    continue;
                }
                None => continue,
            },
        };

        match outcome {
            Ok(value) => result.succeeded.push(value),
            Err(error) if options.stop_on_error => {
                warn!(item = %item, error = %error, "Stopping batch on first failure");
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(RpctlError::BatchStopped {
                    item: item.to_string(),
                    source: Box::new(error),
                });
            }
            Err(error) => {
                debug!(item = %item, error = %error, "Batch item failed");
                result.failed.push((item, error));
            }
        }
    }

    Ok(result)
}

/// Run `operation` on every item, one after another, in input order.
///
/// Same result and stop-on-error contract as [`parallel_map`].
pub async fn sequential_map<T, R, F, Fut>(
    items: Vec<T>,
    stop_on_error: bool,
    mut operation: F,
) -> RpctlResult<BatchResult<T, R>>
where
    T: fmt::Display + Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = RpctlResult<R>>,
{
    let mut result = BatchResult::default();

    for item in items {
        match operation(item.clone()).await {
            Ok(value) => result.succeeded.push(value),
            Err(error) if stop_on_error => {
                return Err(RpctlError::BatchStopped {
                    item: item.to_string(),
                    source: Box::new(error),
                });
            }
            Err(error) => {
                debug!(item = %item, error = %error, "Batch item failed");
                result.failed.push((item, error));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_effective_workers() {
        assert_eq!(effective_workers(5, 0), 0);
        assert_eq!(effective_workers(0, 5), 1);
        assert_eq!(effective_workers(3, 50), 3);
        assert_eq!(effective_workers(10, 2), 2);
        assert_eq!(effective_workers(100, 50), MAX_WORKERS_CAP);
    }

    #[tokio::test]
    async fn test_empty_input_schedules_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = parallel_map(Vec::<u32>::new(), BatchOptions::new(), move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, RpctlError>(n) }
        })
        .await
        .unwrap();

        assert_eq!(result.total(), 0);
        assert!(result.all_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_item_accounted_for() {
        let items: Vec<u32> = (0..10).collect();

        let result = parallel_map(items, BatchOptions::new().max_workers(3), |n| async move {
            if n % 3 == 0 {
                Err(RpctlError::api_status(format!("item {n} failed"), 400))
            } else {
                Ok(n * 10)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.total(), 10);
        assert!(!result.all_ok());

        let mut failed: Vec<u32> = result.failed.iter().map(|(n, _)| *n).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![0, 3, 6, 9]);

        let mut succeeded = result.succeeded.clone();
        succeeded.sort_unstable();
        assert_eq!(succeeded, vec![10, 20, 40, 50, 70, 80]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_never_exceeds_cap() {
        let gauge = Arc::new(Gauge::default());
        let tracker = gauge.clone();
        let items: Vec<u32> = (0..50).collect();

        let result = parallel_map(items, BatchOptions::new().max_workers(100), move |n| {
            let gauge = tracker.clone();
            async move {
                gauge.enter();
                sleep(Duration::from_millis(10)).await;
                gauge.leave();
                Ok::<_, RpctlError>(n)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.succeeded.len(), 50);
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= MAX_WORKERS_CAP, "peak concurrency was {peak}");
        assert!(peak > 1);
        assert_eq!(gauge.current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_runs_one_at_a_time() {
        let gauge = Arc::new(Gauge::default());
        let tracker = gauge.clone();

        let result = parallel_map(vec![1, 2, 3, 4], BatchOptions::new().max_workers(1), move |n| {
            let gauge = tracker.clone();
            async move {
                gauge.enter();
                sleep(Duration::from_millis(5)).await;
                gauge.leave();
                Ok::<_, RpctlError>(n)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.total(), 4);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_is_reraised_after_siblings_are_dropped() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let batch = tokio::spawn(parallel_map(
            vec![1u32, 2, 3],
            BatchOptions::new().max_workers(3),
            move |n| {
                let counter = counter.clone();
                async move {
                    if n == 1 {
                        panic!("operation blew up");
                    }
                    sleep(Duration::from_secs(1)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, RpctlError>(n)
                }
            },
        ));

        let joined = batch.await;
        assert!(joined.unwrap_err().is_panic());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_error_aborts_remaining_work() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let start = Instant::now();

        let outcome = parallel_map(
            vec![1u32, 2, 3, 4, 5],
            BatchOptions::new().max_workers(5).stop_on_error(true),
            move |n| {
                let counter = counter.clone();
                async move {
                    if n == 2 {
                        return Err(RpctlError::api_status("bad request", 400));
                    }
                    sleep(Duration::from_secs(60)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(n)
                }
            },
        )
        .await;

        match outcome {
            Err(RpctlError::BatchStopped { item, source }) => {
                assert_eq!(item, "2");
                assert_eq!(source.status_code(), Some(400));
            }
            other => panic!("expected BatchStopped, got {other:?}"),
        }
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_sequential_keeps_input_order() {
        let result = sequential_map(vec![3u32, 1, 2], false, |n| async move {
            if n == 1 {
                Err(RpctlError::api("nope"))
            } else {
                Ok(n)
            }
        })
        .await
        .unwrap();

        assert_eq!(result.succeeded, vec![3, 2]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, 1);
    }

    #[tokio::test]
    async fn test_sequential_stop_on_error_skips_the_rest() {
        let calls = AtomicUsize::new(0);

        let outcome = sequential_map(vec!["a", "b", "c"], true, |item| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if item == "b" {
                    Err(RpctlError::not_found("gone"))
                } else {
                    Ok(item)
                }
            }
        })
        .await;

        assert!(matches!(outcome, Err(RpctlError::BatchStopped { ref item, .. }) if item == "b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_check_reports_first_failure_code() {
        let mut result: BatchResult<&str, ()> = BatchResult::default();
        assert!(result.check().is_ok());

        result.succeeded.push(());
        result.failed.push(("pod-1", RpctlError::not_found("Pod 'pod-1' not found.")));
        result.failed.push(("pod-2", RpctlError::api("boom")));

        match result.check() {
            Err(RpctlError::PartialFailure { failed, total, exit_code }) => {
                assert_eq!((failed, total, exit_code), (2, 3, 5));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }
}
