//! Bounded worker pool over domain partitions
//!
//! A stage hands the pool a list of `(domain, input)` items and a pure
//! per-domain task. Items are split into partitions, each partition runs on
//! a blocking task once it holds a semaphore permit, and every domain is
//! analysed under `catch_unwind` so one bad domain cannot take down its
//! partition. Partials are merged in partition order.

use crate::AuditError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Partitions handed out per worker
const PARTITIONS_PER_WORKER: usize = 4;

/// A partial result that can absorb another one
pub trait Partial: Default + Send + 'static {
    fn merge(&mut self, other: Self);
}

impl<T: Send + 'static> Partial for Vec<T> {
    fn merge(&mut self, other: Self) {
        self.extend(other);
    }
}

/// Merged output of one stage
#[derive(Debug)]
pub struct StageOutcome<P> {
    pub partial: P,
    pub processed: usize,
    pub failed: usize,
}

impl<P: Partial> StageOutcome<P> {
    fn empty() -> Self {
        Self {
            partial: P::default(),
            processed: 0,
            failed: 0,
        }
    }

    fn absorb(&mut self, other: StageOutcome<P>) {
        self.partial.merge(other.partial);
        self.processed += other.processed;
        self.failed += other.failed;
    }
}

/// Runs per-domain tasks on at most `workers` blocking threads
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    /// Creates a pool; a worker count of zero is treated as one
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Splits `len` items into partition sizes
    fn partition_size(&self, len: usize) -> usize {
        let partitions = self.workers * PARTITIONS_PER_WORKER;
        len.div_ceil(partitions).max(1)
    }

    /// Runs `task` over every item and merges the partials
    ///
    /// # Arguments
    ///
    /// * `stage` - Stage name used in log lines
    /// * `items` - `(domain, input)` pairs
    /// * `task` - Pure per-domain analysis
    ///
    /// # Returns
    ///
    /// * `Ok(StageOutcome)` - Merged partial plus processed/failed counts
    /// * `Err(AuditError::Worker)` - A partition task could not be joined
    pub async fn run<T, P, F>(
        &self,
        stage: &'static str,
        items: Vec<(String, T)>,
        task: F,
    ) -> Result<StageOutcome<P>, AuditError>
    where
        T: Send + 'static,
        P: Partial,
        F: Fn(&str, &T) -> Result<P, AuditError> + Send + Sync + 'static,
    {
        if items.is_empty() {
            tracing::info!("Stage {}: no domains selected", stage);
            return Ok(StageOutcome::empty());
        }

        let total = items.len();
        let size = self.partition_size(total);
        let task = Arc::new(task);
        let mut set = JoinSet::new();

        let mut items = items.into_iter();
        let mut index = 0usize;
        loop {
            let partition: Vec<(String, T)> = items.by_ref().take(size).collect();
            if partition.is_empty() {
                break;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AuditError::Worker(format!("semaphore closed: {}", e)))?;
            let task = Arc::clone(&task);
            let partition_index = index;

            set.spawn_blocking(move || {
                let _permit = permit;
                (partition_index, run_partition(stage, partition, task.as_ref()))
            });
            index += 1;
        }

        let mut finished: Vec<(usize, StageOutcome<P>)> = Vec::with_capacity(index);
        while let Some(joined) = set.join_next().await {
            let (partition_index, outcome) = joined
                .map_err(|e| AuditError::Worker(format!("{} partition failed: {}", stage, e)))?;
            finished.push((partition_index, outcome));
        }
        finished.sort_by_key(|(i, _)| *i);

        let mut merged = StageOutcome::empty();
        for (_, outcome) in finished {
            merged.absorb(outcome);
        }

        tracing::info!(
            "Stage {}: {} domains processed, {} failed",
            stage,
            merged.processed,
            merged.failed
        );
        Ok(merged)
    }
}

fn run_partition<T, P, F>(stage: &str, partition: Vec<(String, T)>, task: &F) -> StageOutcome<P>
where
    P: Partial,
    F: Fn(&str, &T) -> Result<P, AuditError>,
{
    let mut outcome: StageOutcome<P> = StageOutcome::empty();

    for (domain, input) in partition {
        match catch_unwind(AssertUnwindSafe(|| task(&domain, &input))) {
            Ok(Ok(partial)) => {
                tracing::debug!("{}: {} analysed", stage, domain);
                outcome.partial.merge(partial);
                outcome.processed += 1;
            }
            Ok(Err(e)) => {
                tracing::warn!("{}: skipping {}: {}", stage, domain, e);
                outcome.failed += 1;
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!("{}: {} panicked: {}", stage, domain, message);
                outcome.failed += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<(String, usize)> {
        (0..n).map(|i| (format!("d{:03}.com", i), i)).collect()
    }

    #[tokio::test]
    async fn test_all_items_processed() {
        let pool = WorkerPool::new(3);
        let outcome = pool
            .run("test", items(50), |_, n| Ok(vec![*n]))
            .await
            .unwrap();

        assert_eq!(outcome.processed, 50);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.partial, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_errors_are_isolated() {
        let pool = WorkerPool::new(2);
        let outcome = pool
            .run("test", items(10), |domain, n| {
                if n % 3 == 0 {
                    Err(AuditError::Domain {
                        domain: domain.to_string(),
                        message: "boom".to_string(),
                    })
                } else {
                    Ok(vec![*n])
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.failed, 4);
        assert_eq!(outcome.processed, 6);
        assert_eq!(outcome.partial, vec![1, 2, 4, 5, 7, 8]);
    }

    #[tokio::test]
    async fn test_panics_are_isolated() {
        let pool = WorkerPool::new(1);
        let outcome = pool
            .run("test", items(5), |_, n| {
                if *n == 2 {
                    panic!("bad domain");
                }
                Ok(vec![*n])
            })
            .await
            .unwrap();

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.partial, vec![0, 1, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = WorkerPool::new(4);
        let outcome: StageOutcome<Vec<usize>> =
            pool.run("test", items(0), |_, n| Ok(vec![*n])).await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert!(outcome.partial.is_empty());
    }

    #[test]
    fn test_partition_size() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.partition_size(1), 1);
        assert_eq!(pool.partition_size(8), 1);
        assert_eq!(pool.partition_size(17), 3);
        assert_eq!(WorkerPool::new(0).workers(), 1);
    }
}
