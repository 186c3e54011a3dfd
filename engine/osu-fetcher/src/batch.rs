//! Fixed-window batching
//!
//! Work items are split into consecutive batches. Everything inside a batch
//! runs concurrently and is joined before the next batch starts; a fixed
//! pause separates batches. There is no adaptive backoff.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Batch size and pause for one instantiation of the batching loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub delay: Duration,
}

impl BatchPlan {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self { batch_size: batch_size.max(1), delay }
    }

    /// Number of batches `items` will be split into
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size)
    }
}

/// What a batching run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub items: usize,
    pub batches: usize,
    pub pauses: usize,
}

/// Run `f` over consecutive batches of `items`, pausing between batches
///
/// `f` receives the zero-based batch number and the batch slice. Outputs
/// are concatenated in batch order.
pub async fn run_batches<'a, T, R, F, Fut>(
    label: &str,
    items: &'a [T],
    plan: BatchPlan,
    mut f: F,
) -> (Vec<R>, BatchReport)
where
    F: FnMut(usize, &'a [T]) -> Fut,
    Fut: Future<Output = Vec<R>>,
{
    let total = plan.batch_count(items.len());
    let mut report = BatchReport { items: items.len(), ..Default::default() };
    let mut results = Vec::with_capacity(items.len());

    for (index, batch) in items.chunks(plan.batch_size).enumerate() {
        if index > 0 {
            sleep(plan.delay).await;
            report.pauses += 1;
        }

        info!("{}: batch {}/{} ({} items)", label, index + 1, total, batch.len());
        results.extend(f(index, batch).await);
        report.batches += 1;
    }

    (results, report)
}

/// Run `f` for every item of a batch at once and wait for all of them
///
/// Output order matches input order.
pub async fn fan_out<'a, T, R, F, Fut>(batch: &'a [T], f: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    join_all(batch.iter().map(f)).await
}
