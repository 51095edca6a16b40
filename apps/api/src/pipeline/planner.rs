//! Chunking and pacing policy for a batch, derived from the item count.

use std::time::Duration;

/// How a batch of N items is split and paced.
///
/// Larger batches get smaller chunks and longer pauses — the point is to
/// stay under the scoring provider's request-rate ceiling, not throughput.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
    pub inter_item_delay: Duration,
}

impl BatchPlan {
    /// Tiered heuristic over the total item count.
    pub fn for_total(total: usize) -> Self {
        let chunk_size = if total > 50 {
            8
        } else if total > 20 {
            10
        } else {
            15
        };
        let inter_chunk_delay = if total > 20 {
            Duration::from_millis(5000)
        } else {
            Duration::from_millis(3000)
        };
        Self {
            chunk_size,
            inter_chunk_delay,
            inter_item_delay: Duration::from_millis(1000),
        }
    }

    /// Number of chunks a batch of `total` items splits into.
    pub fn chunk_count(&self, total: usize) -> usize {
        total.div_ceil(self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_tiers() {
        assert_eq!(BatchPlan::for_total(1).chunk_size, 15);
        assert_eq!(BatchPlan::for_total(20).chunk_size, 15);
        assert_eq!(BatchPlan::for_total(21).chunk_size, 10);
        assert_eq!(BatchPlan::for_total(50).chunk_size, 10);
        assert_eq!(BatchPlan::for_total(51).chunk_size, 8);
        assert_eq!(BatchPlan::for_total(200).chunk_size, 8);
    }

    #[test]
    fn test_inter_chunk_delay_tiers() {
        assert_eq!(
            BatchPlan::for_total(20).inter_chunk_delay,
            Duration::from_millis(3000)
        );
        assert_eq!(
            BatchPlan::for_total(21).inter_chunk_delay,
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn test_inter_item_delay_is_constant() {
        assert_eq!(
            BatchPlan::for_total(5).inter_item_delay,
            Duration::from_millis(1000)
        );
        assert_eq!(
            BatchPlan::for_total(100).inter_item_delay,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_chunk_count_rounds_up() {
        let plan = BatchPlan::for_total(25); // chunk_size 10
        assert_eq!(plan.chunk_count(25), 3);
        let plan = BatchPlan::for_total(30); // chunk_size 10
        assert_eq!(plan.chunk_count(30), 3);
        let plan = BatchPlan::for_total(8); // chunk_size 15
        assert_eq!(plan.chunk_count(8), 1);
    }
}
