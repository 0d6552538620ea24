//! Wait/wake state machine shared between a driver's worker and the rest of
//! the world.
//!
//! The monitor guards exactly two pieces of state: the current [`WaitState`]
//! and the "need another iteration" flag. Everything else a driver owns is
//! touched only by its worker thread, so nothing else needs locking.

use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

/// Where a driver's worker currently is in its pacing cycle.
///
/// Exactly one state holds at any instant for a given driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitState {
    /// Executing an iteration (or between a wake and the next wait).
    Running,
    /// Blocked with a timeout, paced toward the next iteration.
    WaitingForNextIteration,
    /// Blocked with no timeout; no further iteration has been requested.
    WaitingIndefinitely,
    /// Signaled; the worker has not yet resumed.
    WakingUp,
}

impl Default for WaitState {
    fn default() -> Self {
        WaitState::Running
    }
}

#[derive(Debug)]
pub struct MonitorState {
    pub(crate) wait_state: WaitState,
    pub(crate) need_another_iteration: bool,
}

/// Mutex + condition variable pair pacing one driver's worker.
pub struct DriverMonitor {
    state: Mutex<MonitorState>,
    cond: Condvar,
}

impl DriverMonitor {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState {
                wait_state: WaitState::Running,
                need_another_iteration: false,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn wait_state(&self) -> WaitState {
        self.state.lock().wait_state
    }

    pub fn needs_another_iteration(&self) -> bool {
        self.state.lock().need_another_iteration
    }

    /// Request one more iteration. Interrupts an indefinite wait; a timed
    /// wait already has a due date and is left alone.
    pub fn ensure_next_iteration(&self) {
        let mut state = self.state.lock();
        state.need_another_iteration = true;
        if state.wait_state == WaitState::WaitingIndefinitely {
            state.wait_state = WaitState::WakingUp;
            self.cond.notify_all();
        }
    }

    /// Interrupt any pending wait early, from any thread.
    pub fn wake_up(&self) {
        let mut state = self.state.lock();
        state.wait_state = WaitState::WakingUp;
        self.cond.notify_all();
    }

    pub fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock()
    }

    /// Block until signaled.
    pub fn wait(&self, guard: &mut MutexGuard<'_, MonitorState>) {
        self.cond.wait(guard);
    }

    /// Block until signaled or `timeout` elapses. Returns whether the wait
    /// timed out.
    pub fn wait_for(&self, guard: &mut MutexGuard<'_, MonitorState>, timeout: Duration) -> bool {
        self.cond.wait_for(guard, timeout).timed_out()
    }
}
