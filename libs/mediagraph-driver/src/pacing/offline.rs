//! Offline pacing: fixed virtual-time slices, as fast as the host can go.
//!
//! Used for non-realtime rendering (export-to-file and the like) where the
//! output cadence is dictated by the data, not the wall clock.

use std::sync::Arc;

use crate::config::DriverConfig;
use crate::driver::{IterationTimeline, SharedDriverState, ThreadedDriver};
use crate::engine::GraphEngine;
use crate::pacing::PacingStrategy;
use crate::time::GraphTime;

/// Advances virtual time by a fixed slice per iteration, with no suspension
/// between iterations.
pub struct OfflinePacing {
    slice: GraphTime,
}

impl OfflinePacing {
    pub fn new(slice_ms: u32) -> Self {
        Self {
            slice: GraphTime::from_millis(slice_ms as i64),
        }
    }

    pub fn slice(&self) -> GraphTime {
        self.slice
    }
}

impl PacingStrategy for OfflinePacing {
    const PACED: bool = false;

    fn get_interval_for_iteration(
        &mut self,
        timeline: &mut IterationTimeline,
        shared: &SharedDriverState,
    ) -> (GraphTime, GraphTime) {
        let naive_to = timeline.iteration_end().saturating_add(self.slice);
        tracing::trace!(
            "updating offline current time to {} (state computed to {})",
            naive_to,
            timeline.state_computed_time()
        );
        timeline.advance_to(naive_to, shared)
    }

    fn wait_for_next_iteration(&mut self, _shared: &SharedDriverState, _engine: &dyn GraphEngine) {
        // No pacing offline: proceed straight to the next iteration.
    }
}

/// Unpaced driver that fast-forwards the graph in fixed slices.
pub type OfflineClockDriver = ThreadedDriver<OfflinePacing>;

impl OfflineClockDriver {
    pub fn new(engine: Arc<dyn GraphEngine>, slice_ms: u32) -> Self {
        Self::with_config(engine, DriverConfig::default(), slice_ms)
    }

    pub fn with_config(engine: Arc<dyn GraphEngine>, config: DriverConfig, slice_ms: u32) -> Self {
        ThreadedDriver::with_strategy(engine, config, OfflinePacing::new(slice_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_slices() {
        let shared = SharedDriverState::new();
        let mut timeline = IterationTimeline::new();
        // Horizon far enough out that no clamp interferes.
        timeline.set_state_computed_time(GraphTime::from_seconds(60.0));

        let slice_ms = 10;
        let mut pacing = OfflinePacing::new(slice_ms);
        let iterations = 100;
        for _ in 0..iterations {
            pacing.get_interval_for_iteration(&mut timeline, &shared);
        }
        assert_eq!(
            timeline.iteration_end(),
            GraphTime::from_millis(slice_ms as i64 * iterations)
        );
        assert!(!shared.underrun_detected());
    }

    #[test]
    fn test_slice_clamped_by_precomputed_horizon() {
        let shared = SharedDriverState::new();
        let mut timeline = IterationTimeline::new();
        timeline.set_state_computed_time(GraphTime::from_millis(15));

        let mut pacing = OfflinePacing::new(10);
        let (_, to) = pacing.get_interval_for_iteration(&mut timeline, &shared);
        assert_eq!(to, GraphTime::from_millis(10));
        let (from, to) = pacing.get_interval_for_iteration(&mut timeline, &shared);
        assert_eq!(from, GraphTime::from_millis(10));
        assert_eq!(to, GraphTime::from_millis(15));
        assert!(shared.underrun_detected());
    }
}
