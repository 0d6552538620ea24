//! Callback contract between a driver and the graph engine it paces.

use crate::time::GraphTime;

/// Services a driver requires from the surrounding graph engine.
///
/// A driver decides *when* and *for how long* (in virtual time) each
/// iteration of graph processing happens; the engine decides *what* that
/// processing is. Every method here is called from the driver's worker
/// thread.
///
/// The pause/resume notifications are delivered while the driver's monitor
/// is held, so implementations must not call back into the driver from
/// them. [`process_iteration`](GraphEngine::process_iteration) is called
/// without the monitor held and may use the driver handle freely (for
/// example to arm another iteration).
pub trait GraphEngine: Send + Sync {
    /// Process one iteration of the graph over the `[from, to)` virtual-time
    /// window, precomputing state up to `next_state_time`.
    ///
    /// `state_time` is the horizon the engine had already precomputed before
    /// this call. Returns whether more work remains; the driver's loop exits
    /// once this returns `false`. Must be total: the driver never retries a
    /// failed iteration, so any internal error has to be absorbed here.
    fn process_iteration(
        &self,
        from: GraphTime,
        to: GraphTime,
        state_time: GraphTime,
        next_state_time: GraphTime,
    ) -> bool;

    /// Round a proposed lookahead horizon up to the next schedulable
    /// boundary (typically an audio block edge).
    ///
    /// Must return a value `>= time`.
    fn quantize_to_next_boundary(&self, time: GraphTime) -> GraphTime;

    /// The driver is about to block indefinitely: no further iteration has
    /// been requested, so playback is effectively paused.
    fn on_paused(&self) {}

    /// The driver woke from a wait and is running again.
    fn on_resumed(&self) {}

    /// One-time handoff performed right after the worker thread starts,
    /// before the first iteration. Lets the engine move anything it queued
    /// before the thread existed onto the worker.
    fn swap_queued_work(&self) {}
}
