//! Drives a stage over all work items: chunked, sequential, never aborting.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::pipeline::backoff::RetryPolicy;
use crate::pipeline::planner::BatchPlan;
use crate::pipeline::{retry, StageError, StageItem};

/// One pass (parse or score) applied to every item in a batch.
///
/// `process` handles exactly one item and is free to fail; the runner owns
/// retry, pacing, and aggregation.
#[async_trait]
pub trait Stage: Send + Sync {
    type Item: StageItem + Sync;
    type Output: Send;

    fn name(&self) -> &'static str;

    async fn process(&self, item: &Self::Item) -> Result<Self::Output, StageError>;
}

/// Outcome for a single work item: exactly one per submitted item.
#[derive(Debug)]
pub struct StageOutcome<T> {
    pub filename: String,
    pub result: Result<T, String>,
}

/// Ordered per-item outcomes of one stage run.
///
/// Outcomes appear in input order, so `successful() + failed()` always
/// equals the number of submitted items.
#[derive(Debug)]
pub struct StageReport<T> {
    pub outcomes: Vec<StageOutcome<T>>,
}

impl<T> StageReport<T> {
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (o.filename.as_str(), v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| {
            o.result
                .as_ref()
                .err()
                .map(|reason| (o.filename.as_str(), reason.as_str()))
        })
    }

    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }

    /// Every single item failed. An empty run is not a total failure.
    pub fn is_total_failure(&self) -> bool {
        !self.outcomes.is_empty() && self.successful() == 0
    }
}

/// Runs `stage` over `items` in input order, chunked per `plan`.
///
/// Each item is wrapped in the retrying invoker; an exhausted-retry failure
/// is recorded (reason prefixed with the originating filename) and the run
/// continues. Pacing: `inter_item_delay` between consecutive items of a
/// chunk, `inter_chunk_delay` between chunks.
pub async fn run_stage<S: Stage>(
    stage: &S,
    items: &[S::Item],
    plan: &BatchPlan,
    policy: &RetryPolicy,
) -> StageReport<S::Output> {
    let total = items.len();
    let total_chunks = plan.chunk_count(total);
    let mut outcomes = Vec::with_capacity(total);
    let mut processed = 0usize;

    for (chunk_index, chunk) in items.chunks(plan.chunk_size.max(1)).enumerate() {
        info!(
            "{}: processing chunk {}/{} ({} items)",
            stage.name(),
            chunk_index + 1,
            total_chunks,
            chunk.len()
        );

        for (pos, item) in chunk.iter().enumerate() {
            processed += 1;
            debug!(
                "{}: item {}/{}: {}",
                stage.name(),
                processed,
                total,
                item.filename()
            );

            match retry::invoke(policy, || stage.process(item)).await {
                Ok(value) => {
                    info!("{}: {} succeeded", stage.name(), item.filename());
                    outcomes.push(StageOutcome {
                        filename: item.filename().to_string(),
                        result: Ok(value),
                    });
                }
                Err(err) => {
                    warn!("{}: {} failed: {err}", stage.name(), item.filename());
                    outcomes.push(StageOutcome {
                        filename: item.filename().to_string(),
                        result: Err(format!("{}: {err}", item.filename())),
                    });
                }
            }

            if pos + 1 < chunk.len() {
                tokio::time::sleep(plan.inter_item_delay).await;
            }
        }

        if chunk_index + 1 < total_chunks {
            debug!(
                "{}: chunk {}/{} complete, waiting {}ms",
                stage.name(),
                chunk_index + 1,
                total_chunks,
                plan.inter_chunk_delay.as_millis()
            );
            tokio::time::sleep(plan.inter_chunk_delay).await;
        }
    }

    StageReport { outcomes }
}
