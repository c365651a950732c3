//! Per-step performance metrics for the partition manager.
//!
//! [`StepMetrics`] captures timing for each phase of a single step so
//! callers can see where time goes as the partition grid changes.

/// Timing and exchange counters collected during a single step.
///
/// All durations are in microseconds. The manager populates these after
/// every successful [`step()`](crate::PartitionManager::step); aborted
/// steps leave the previous metrics in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Phase 1: snapshotting sites into scratch buffers.
    pub prepare_us: u64,
    /// Phase 2a: local kernel plus sending boundary packets.
    pub update_us: u64,
    /// Phase 2b: receiving and applying neighbour packets.
    pub exchange_us: u64,
    /// Phase 3: swapping scratch buffers in.
    pub commit_us: u64,
    /// Temperature pass after commit.
    pub temperature_us: u64,
    /// Boundary packets sent (and received) this step.
    pub packets_exchanged: usize,
    /// Number of regions stepped.
    pub regions: usize,
    /// Number of cells stepped.
    pub cells: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.prepare_us, 0);
        assert_eq!(m.update_us, 0);
        assert_eq!(m.exchange_us, 0);
        assert_eq!(m.commit_us, 0);
        assert_eq!(m.temperature_us, 0);
        assert_eq!(m.packets_exchanged, 0);
        assert_eq!(m.regions, 0);
        assert_eq!(m.cells, 0);
    }
}
