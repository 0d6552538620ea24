//! Driver contract and the threaded iteration loop.
//!
//! A driver owns the graph's position in virtual time and repeatedly hands
//! the engine one `[from, to)` window to process. [`ThreadedDriver`] runs
//! that loop on a dedicated worker thread and is generic over the
//! [`PacingStrategy`](crate::pacing::PacingStrategy) that decides how fast
//! virtual time advances and whether to sleep between iterations.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::config::DriverConfig;
use crate::engine::GraphEngine;
use crate::error::{DriverError, Result};
use crate::monitor::DriverMonitor;
use crate::pacing::PacingStrategy;
use crate::time::{GraphTime, INITIAL_CURRENT_TIME};

/// A unit of work to run on the driver's worker, strictly between
/// iterations.
pub type DriverTask = Box<dyn FnOnce() + Send + 'static>;

/// The active pacing strategy for a graph, as seen by its owner.
///
/// `start` and `stop` must only be called from the engine's control thread;
/// `dispatch`, `get_current_time`, `ensure_next_iteration` and `wake_up` may
/// be called from any thread.
pub trait Driver: Send {
    /// Begin the iteration loop. Not idempotent: a second call is rejected.
    fn start(&mut self) -> Result<()>;

    /// Shut the loop down and join the worker. When this returns, no
    /// iteration callback into the engine can occur anymore.
    fn stop(&mut self);

    /// Enqueue work to run on the worker between iterations.
    fn dispatch(&self, task: DriverTask);

    /// This driver's notion of "now" in virtual time: the end of the last
    /// interval it computed, not the wall clock.
    fn get_current_time(&self) -> GraphTime;

    /// Tell the driver one more iteration is needed, waking an indefinite
    /// wait if one is pending.
    fn ensure_next_iteration(&self);

    /// Interrupt a pending wait early. Must never be called on an unpaced
    /// (offline) driver, which has no wait to interrupt.
    fn wake_up(&self);
}

/// State a driver shares between its worker thread and everyone else.
///
/// Everything here is either behind the monitor or atomic; all remaining
/// driver state is owned by the worker alone.
pub struct SharedDriverState {
    monitor: DriverMonitor,
    current_time_ns: AtomicI64,
    underrun: AtomicBool,
    worker_exited: AtomicBool,
}

impl SharedDriverState {
    pub(crate) fn new() -> Self {
        Self {
            monitor: DriverMonitor::new(),
            current_time_ns: AtomicI64::new(INITIAL_CURRENT_TIME.as_nanos()),
            underrun: AtomicBool::new(false),
            worker_exited: AtomicBool::new(false),
        }
    }

    pub fn monitor(&self) -> &DriverMonitor {
        &self.monitor
    }

    pub fn current_time(&self) -> GraphTime {
        GraphTime::from_nanos(self.current_time_ns.load(Ordering::Acquire))
    }

    /// Whether this driver has ever had to clamp an interval because the
    /// engine's precomputed state did not reach far enough.
    pub fn underrun_detected(&self) -> bool {
        self.underrun.load(Ordering::Relaxed)
    }

    pub fn worker_exited(&self) -> bool {
        self.worker_exited.load(Ordering::Acquire)
    }

    fn store_current_time(&self, time: GraphTime) {
        self.current_time_ns.store(time.as_nanos(), Ordering::Release);
    }

    fn flag_underrun(&self) {
        self.underrun.store(true, Ordering::Relaxed);
    }
}

/// The bounds of the interval last computed, plus the horizon the engine has
/// precomputed. Owned by the worker thread.
///
/// Invariant at the end of every completed interval computation:
/// `iteration_start <= iteration_end <= state_computed_time`. An underrun
/// clamps `iteration_end` down to `state_computed_time` to restore it.
pub struct IterationTimeline {
    iteration_start: GraphTime,
    iteration_end: GraphTime,
    state_computed_time: GraphTime,
}

impl IterationTimeline {
    pub(crate) fn new() -> Self {
        Self {
            iteration_start: INITIAL_CURRENT_TIME,
            iteration_end: INITIAL_CURRENT_TIME,
            state_computed_time: INITIAL_CURRENT_TIME,
        }
    }

    pub fn iteration_start(&self) -> GraphTime {
        self.iteration_start
    }

    pub fn iteration_end(&self) -> GraphTime {
        self.iteration_end
    }

    pub fn state_computed_time(&self) -> GraphTime {
        self.state_computed_time
    }

    pub(crate) fn set_state_computed_time(&mut self, time: GraphTime) {
        self.state_computed_time = time;
    }

    /// Advance the timeline to `naive_to`, applying the underrun clamp and
    /// the non-negative-advance check shared by every pacing strategy.
    ///
    /// Returns the `[from, to)` window for this iteration.
    pub(crate) fn advance_to(
        &mut self,
        naive_to: GraphTime,
        shared: &SharedDriverState,
    ) -> (GraphTime, GraphTime) {
        let from = self.iteration_end;
        self.iteration_start = from;

        let mut to = naive_to;
        if self.state_computed_time < to {
            tracing::warn!(
                "media graph global underrun detected (proposed {}, state computed to {})",
                to,
                self.state_computed_time
            );
            shared.flag_underrun();
            to = self.state_computed_time;
        }

        if from >= to {
            debug_assert!(from == to, "time can't go backwards");
            // Low clock resolution can legitimately produce a zero-length
            // tick.
            tracing::trace!("time did not advance");
        }

        self.iteration_end = to;
        shared.store_current_time(to);
        (from, to)
    }
}

/// Runs a pacing strategy's iteration loop on one dedicated worker thread.
///
/// Use the [`SystemClockDriver`](crate::pacing::SystemClockDriver) and
/// [`OfflineClockDriver`](crate::pacing::OfflineClockDriver) aliases to
/// construct one.
pub struct ThreadedDriver<S: PacingStrategy> {
    engine: Arc<dyn GraphEngine>,
    config: DriverConfig,
    shared: Arc<SharedDriverState>,
    strategy: Option<S>,
    worker: Option<JoinHandle<()>>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
    task_tx: Sender<DriverTask>,
    task_rx: Receiver<DriverTask>,
}

impl<S: PacingStrategy> ThreadedDriver<S> {
    pub(crate) fn with_strategy(
        engine: Arc<dyn GraphEngine>,
        config: DriverConfig,
        strategy: S,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (task_tx, task_rx) = crossbeam_channel::unbounded();
        Self {
            engine,
            config,
            shared: Arc::new(SharedDriverState::new()),
            strategy: Some(strategy),
            worker: None,
            shutdown_tx,
            shutdown_rx,
            task_tx,
            task_rx,
        }
    }

    pub fn shared(&self) -> &Arc<SharedDriverState> {
        &self.shared
    }

    pub fn wait_state(&self) -> crate::monitor::WaitState {
        self.shared.monitor().wait_state()
    }

    pub fn underrun_detected(&self) -> bool {
        self.shared.underrun_detected()
    }

    pub fn is_running(&self) -> bool {
        // The worker can also exit on its own when the engine reports no
        // more work, before stop() ever takes the handle.
        self.worker.is_some() && !self.shared.worker_exited()
    }
}

impl<S: PacingStrategy> Driver for ThreadedDriver<S> {
    fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(DriverError::AlreadyStarted);
        }
        let strategy = self.strategy.take().ok_or(DriverError::AlreadyStarted)?;

        let engine = Arc::clone(&self.engine);
        let shared = Arc::clone(&self.shared);
        let shutdown_rx = self.shutdown_rx.clone();
        let task_rx = self.task_rx.clone();
        let lookahead = self.config.lookahead();

        let handle = thread::Builder::new()
            .name("media-graph".to_string())
            .spawn(move || {
                run_worker(strategy, engine, shared, shutdown_rx, task_rx, lookahead)
            })?;
        self.worker = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        debug_assert!(
            thread::current().id() != handle.thread().id(),
            "stop() must not be called from the driver's own worker"
        );
        tracing::debug!("stopping media graph driver");
        let _ = self.shutdown_tx.send(());
        self.shared.monitor().wake_up();
        if handle.join().is_err() {
            tracing::error!("media graph worker panicked");
        }
        // Tasks dispatched after the worker's own final drain would
        // otherwise vanish; run them here, on the stopping thread, the way
        // a thread shutdown flushes its remaining events.
        for task in self.task_rx.try_iter() {
            task();
        }
    }

    fn dispatch(&self, task: DriverTask) {
        let _ = self.task_tx.send(task);
        // Break a pending wait so the task runs before the next due tick.
        if S::PACED {
            self.shared.monitor().wake_up();
        }
    }

    fn get_current_time(&self) -> GraphTime {
        self.shared.current_time()
    }

    fn ensure_next_iteration(&self) {
        self.shared.monitor().ensure_next_iteration();
    }

    fn wake_up(&self) {
        debug_assert!(S::PACED, "an offline graph should not have to wake up");
        self.shared.monitor().wake_up();
    }
}

impl<S: PacingStrategy> Drop for ThreadedDriver<S> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            tracing::warn!("driver dropped while running; stopping worker");
            self.stop();
        }
    }
}

fn run_worker<S: PacingStrategy>(
    mut strategy: S,
    engine: Arc<dyn GraphEngine>,
    shared: Arc<SharedDriverState>,
    shutdown_rx: Receiver<()>,
    task_rx: Receiver<DriverTask>,
    lookahead: GraphTime,
) {
    // Handoff barrier: anything the engine queued before this thread existed
    // must be picked up before the first iteration.
    {
        let _state = shared.monitor().lock();
        engine.swap_queued_work();
    }
    tracing::debug!("media graph worker started");

    let mut timeline = IterationTimeline::new();
    let mut still_processing = true;
    while still_processing {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }
        for task in task_rx.try_iter() {
            task();
        }

        let (from, to) = strategy.get_interval_for_iteration(&mut timeline, &shared);

        let next_state_time =
            engine.quantize_to_next_boundary(to.saturating_add(lookahead));
        debug_assert!(
            next_state_time >= to,
            "quantized horizon fell behind the iteration end"
        );

        still_processing = engine.process_iteration(
            from,
            to,
            timeline.state_computed_time(),
            next_state_time,
        );
        timeline.set_state_computed_time(next_state_time);

        if still_processing && shutdown_rx.is_empty() {
            strategy.wait_for_next_iteration(&shared, engine.as_ref());
        }
    }

    // Flush work dispatched during or after the final iteration while still
    // on the driver's own execution context.
    for task in task_rx.try_iter() {
        task();
    }

    tracing::debug!("media graph worker exiting");
    shared.worker_exited.store(true, Ordering::Release);
}
