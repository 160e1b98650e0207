//! Batch fan-out operations.
//!
//! Fan-out/fan-in over a bounded number of concurrent executions. Partial
//! failure never aborts a batch: every item is attempted and every error is
//! collected for the caller to inspect.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Outcome summary of a batch run.
#[derive(Debug)]
pub struct BatchOutcome<E> {
    /// Number of items processed successfully.
    pub success_count: usize,
    /// Number of items that failed.
    pub failure_count: usize,
    /// Every error encountered, in no particular order.
    pub errors: Vec<E>,
}

/// Concurrent batch processor with a fixed fan-out width.
#[derive(Debug, Clone, Copy)]
pub struct BatchProcessor {
    worker_count: usize,
}

impl BatchProcessor {
    /// Creates a processor running at most `worker_count` items at once.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    /// Applies `process` to every item, collecting the errors.
    ///
    /// Every item is attempted regardless of sibling failures. An empty
    /// return value means the whole batch succeeded.
    pub async fn process_all<T, F, Fut, E>(&self, items: Vec<T>, process: F) -> Vec<E>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        stream::iter(items)
            .map(process)
            .buffer_unordered(self.worker_count)
            .filter_map(|outcome| async move { outcome.err() })
            .collect()
            .await
    }

    /// Applies `process` to every item, tallying successes and failures.
    pub async fn process_with_result<T, F, Fut, E>(
        &self,
        items: Vec<T>,
        process: F,
    ) -> BatchOutcome<E>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let total = items.len();
        let errors = self.process_all(items, process).await;
        BatchOutcome {
            success_count: total - errors.len(),
            failure_count: errors.len(),
            errors,
        }
    }

    /// Applies `map` to every item concurrently, preserving input order.
    ///
    /// Execution order across workers is unspecified; results are
    /// reassembled by their original index, not by completion order.
    pub async fn parallel_map<T, R, F, Fut>(&self, items: Vec<T>, map: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut indexed: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let mapped = map(item);
                async move { (index, mapped.await) }
            })
            .buffer_unordered(self.worker_count)
            .collect()
            .await;

        indexed.sort_unstable_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}

/// Splits `items` into chunks of at most `chunk_size` elements.
///
/// The final chunk holds the remainder. Useful for callers that batch
/// writes toward collaborators with request-size limits.
#[must_use]
pub fn chunk<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(chunk_size.max(1))
        .map(<[T]>::to_vec)
        .collect()
}
