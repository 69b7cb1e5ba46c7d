//! Generic bounded-concurrency batch execution
//!
//! Used by the reconciliation engine for fingerprinting (and optionally
//! copying). Items are submitted in fixed-size chunks to bound the peak
//! in-flight task count; within a chunk completion order is whatever
//! finishes first. Workers are pure functions of their item and never
//! touch shared mutable state, which is what lets the engine aggregate
//! results without any locking.

use fontsync_types::{Error, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Default number of items submitted per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Worker count derived from the machine: half the cores, clamped to [2, 8]
pub fn default_worker_count() -> usize {
    (num_cpus::get() / 2).clamp(2, 8)
}

/// Configuration for the parallel executor
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Maximum concurrently running workers
    pub max_workers: usize,
    /// Items submitted per chunk
    pub chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: default_worker_count(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Bounded-concurrency batch runner
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    config: ParallelConfig,
}

impl ParallelExecutor {
    /// Executor with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with an explicit configuration
    pub fn with_config(config: ParallelConfig) -> Self {
        Self { config }
    }

    /// Current configuration
    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Run `worker` over every item with bounded concurrency
    ///
    /// Returns one `(success, value)` tuple per item, in completion order.
    /// A failing (or panicking) worker is converted into a failure tuple
    /// through `on_error` rather than aborting the batch; one item's
    /// failure never cancels its siblings. `on_progress` fires once per
    /// completed item with a monotonically increasing count and the fixed
    /// total. There is no cancellation: once submitted, every item runs to
    /// completion or individual failure.
    pub async fn process_batch<I, T, W, Fut, E>(
        &self,
        items: Vec<I>,
        worker: W,
        on_progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
        on_error: E,
    ) -> Vec<(bool, T)>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        W: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        E: Fn(&I, Error) -> T,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut completed = 0usize;
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));

        debug!(
            "processing {} items ({} workers, chunks of {})",
            total, self.config.max_workers, self.config.chunk_size
        );

        for chunk in items.chunks(self.config.chunk_size) {
            let mut tasks: JoinSet<(I, Result<T>)> = JoinSet::new();

            for item in chunk {
                let future = worker(item.clone());
                let item = item.clone();
                let semaphore = Arc::clone(&semaphore);

                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                        Ok(result) => result,
                        Err(_) => Err(Error::io("worker panicked")),
                    };
                    (item, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let Ok((item, outcome)) = joined else {
                    // Only reachable through task cancellation
                    warn!("parallel worker task vanished");
                    continue;
                };

                let entry = match outcome {
                    Ok(value) => (true, value),
                    Err(error) => (false, on_error(&item, error)),
                };
                results.push(entry);

                completed += 1;
                if let Some(progress) = on_progress {
                    progress(completed, total);
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn executor(max_workers: usize, chunk_size: usize) -> ParallelExecutor {
        ParallelExecutor::with_config(ParallelConfig {
            max_workers,
            chunk_size,
        })
    }

    #[test]
    fn test_default_worker_count_clamped() {
        let workers = default_worker_count();
        assert!(workers >= 2 && workers <= 8);
    }

    #[tokio::test]
    async fn test_all_items_processed() {
        let items: Vec<u64> = (0..120).collect();
        let results = executor(4, 50)
            .process_batch(
                items,
                |n| async move { Ok(n * 2) },
                None,
                |_, _| u64::MAX,
            )
            .await;

        assert_eq!(results.len(), 120);
        assert!(results.iter().all(|(ok, _)| *ok));

        let mut values: Vec<u64> = results.into_iter().map(|(_, v)| v).collect();
        values.sort_unstable();
        assert_eq!(values, (0..120).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failures_become_tuples_and_spare_siblings() {
        let items: Vec<u64> = (0..10).collect();
        let results = executor(2, 50)
            .process_batch(
                items,
                |n| async move {
                    if n % 3 == 0 {
                        Err(Error::io(format!("item {n} failed")))
                    } else {
                        Ok(n)
                    }
                },
                None,
                |item, _| item + 1000,
            )
            .await;

        let failures: Vec<u64> = results
            .iter()
            .filter(|(ok, _)| !ok)
            .map(|(_, v)| *v)
            .collect();
        let successes = results.iter().filter(|(ok, _)| *ok).count();

        assert_eq!(failures.len(), 4); // 0, 3, 6, 9
        assert!(failures.iter().all(|v| *v >= 1000));
        assert_eq!(successes, 6);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_with_fixed_total() {
        let items: Vec<u64> = (0..25).collect();
        let seen: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());

        executor(4, 10)
            .process_batch(
                items,
                |n| async move { Ok(n) },
                Some(&|completed, total| {
                    seen.lock().unwrap().push((completed, total));
                }),
                |_, _| 0,
            )
            .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 25);
        assert!(seen.iter().all(|(_, total)| *total == 25));
        assert!(seen.windows(2).all(|w| w[1].0 == w[0].0 + 1));
        assert_eq!(seen.last(), Some(&(25, 25)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrency_stays_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u64> = (0..40).collect();
        let (in_flight_w, peak_w) = (Arc::clone(&in_flight), Arc::clone(&peak));

        executor(3, 50)
            .process_batch(
                items,
                move |_| {
                    let in_flight = Arc::clone(&in_flight_w);
                    let peak = Arc::clone(&peak_w);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                None,
                |_, _| (),
            )
            .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_a_failure_tuple() {
        let items = vec![1u64, 2, 3];
        let results = executor(2, 50)
            .process_batch(
                items,
                |n| async move {
                    assert!(n != 2, "boom");
                    Ok(n)
                },
                None,
                |item, _| *item,
            )
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|(ok, _)| !ok).count(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results = executor(2, 50)
            .process_batch(
                Vec::<u64>::new(),
                |n| async move { Ok(n) },
                None,
                |_, _| 0,
            )
            .await;
        assert!(results.is_empty());
    }
}
