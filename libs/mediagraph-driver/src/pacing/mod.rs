//! Pacing strategies: how fast virtual time advances relative to real time.
//!
//! A strategy provides the interval computation and the between-iteration
//! suspension; [`ThreadedDriver`](crate::driver::ThreadedDriver) dispatches
//! to it from the worker loop. Two strategies exist: wall-clock paced
//! ([`SystemClockPacing`]) and unpaced fast-forward ([`OfflinePacing`]).

mod offline;
mod system_clock;

pub use offline::{OfflineClockDriver, OfflinePacing};
pub use system_clock::{SystemClockDriver, SystemClockPacing};

use crate::driver::{IterationTimeline, SharedDriverState};
use crate::engine::GraphEngine;
use crate::time::GraphTime;

/// Strategy hooks the threaded loop dispatches to.
///
/// Implementations run on the driver's worker thread; the only shared state
/// they may touch lives in [`SharedDriverState`].
pub trait PacingStrategy: Send + 'static {
    /// Whether this strategy paces iterations against real time. Unpaced
    /// strategies never suspend, so waking them is a logic error.
    const PACED: bool;

    /// Compute the next `[from, to)` virtual-time window, going through
    /// [`IterationTimeline::advance_to`] so the underrun clamp and the
    /// non-negative-advance check apply uniformly.
    fn get_interval_for_iteration(
        &mut self,
        timeline: &mut IterationTimeline,
        shared: &SharedDriverState,
    ) -> (GraphTime, GraphTime);

    /// Suspend between iterations according to the strategy's pacing.
    fn wait_for_next_iteration(&mut self, shared: &SharedDriverState, engine: &dyn GraphEngine);
}
