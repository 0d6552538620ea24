//! Wall-clock pacing: virtual time advances in lockstep with real time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{DriverConfig, MAX_WAIT_TIMEOUT_MS};
use crate::driver::{IterationTimeline, SharedDriverState, ThreadedDriver};
use crate::engine::GraphEngine;
use crate::monitor::WaitState;
use crate::pacing::PacingStrategy;
use crate::time::GraphTime;

/// Advances virtual time by however much real time elapsed since the last
/// sample, aiming for one iteration per target period. Never claims to have
/// processed past the engine's precomputed horizon: a stall shows up as an
/// underrun clamp, not as fabricated progress.
pub struct SystemClockPacing {
    config: DriverConfig,
    /// When this driver came to life; only used to log real elapsed time.
    initial_timestamp: Instant,
    /// Wall-clock instant of the last interval sample.
    last_timestamp: Instant,
}

impl SystemClockPacing {
    pub fn new(config: DriverConfig) -> Self {
        let now = Instant::now();
        Self {
            config,
            initial_timestamp: now,
            last_timestamp: now,
        }
    }
}

/// Timeout for the timed wait: the remainder of the target period, clamped
/// so it can neither go negative nor exceed the one-minute liveness ceiling.
fn clamped_wait_timeout_ms(target_period_ms: u32, since_last_sample: Duration) -> u64 {
    let since_ms = since_last_sample.as_millis().min(i64::MAX as u128) as i64;
    (target_period_ms as i64 - since_ms).clamp(0, MAX_WAIT_TIMEOUT_MS as i64) as u64
}

impl PacingStrategy for SystemClockPacing {
    const PACED: bool = true;

    fn get_interval_for_iteration(
        &mut self,
        timeline: &mut IterationTimeline,
        shared: &SharedDriverState,
    ) -> (GraphTime, GraphTime) {
        let now = Instant::now();
        let elapsed = GraphTime::from_seconds((now - self.last_timestamp).as_secs_f64());
        self.last_timestamp = now;

        let naive_to = timeline.iteration_end().saturating_add(elapsed);
        tracing::trace!(
            "updating current time to {} (real {:.6}s, state computed to {})",
            naive_to,
            (now - self.initial_timestamp).as_secs_f64(),
            timeline.state_computed_time()
        );
        timeline.advance_to(naive_to, shared)
    }

    fn wait_for_next_iteration(&mut self, shared: &SharedDriverState, engine: &dyn GraphEngine) {
        let monitor = shared.monitor();
        let mut state = monitor.lock();
        let now = Instant::now();

        // A wake-up that landed while we were still processing must not be
        // lost: it is recorded as WakingUp under this same lock.
        if state.wait_state != WaitState::WakingUp {
            let timeout = if state.need_another_iteration {
                let timeout_ms = clamped_wait_timeout_ms(
                    self.config.target_period_ms,
                    now - self.last_timestamp,
                );
                tracing::trace!(
                    "waiting for next iteration; at {:.6}s, timeout {}ms",
                    (now - self.initial_timestamp).as_secs_f64(),
                    timeout_ms
                );
                state.wait_state = WaitState::WaitingForNextIteration;
                Some(Duration::from_millis(timeout_ms))
            } else {
                state.wait_state = WaitState::WaitingIndefinitely;
                engine.on_paused();
                None
            };

            match timeout {
                // Already past due; skip straight to the next iteration.
                Some(t) if t.is_zero() => {}
                Some(t) => {
                    monitor.wait_for(&mut state, t);
                }
                None => {
                    monitor.wait(&mut state);
                }
            }
        }

        engine.on_resumed();
        state.wait_state = WaitState::Running;
        state.need_another_iteration = false;
    }
}

/// Wall-clock paced driver: one iteration roughly every target period, in
/// lockstep with real elapsed time.
pub type SystemClockDriver = ThreadedDriver<SystemClockPacing>;

impl SystemClockDriver {
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self::with_config(engine, DriverConfig::default())
    }

    pub fn with_config(engine: Arc<dyn GraphEngine>, config: DriverConfig) -> Self {
        let strategy = SystemClockPacing::new(config.clone());
        ThreadedDriver::with_strategy(engine, config, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_within_period() {
        // 3ms into a 10ms period leaves 7ms of wait.
        assert_eq!(clamped_wait_timeout_ms(10, Duration::from_millis(3)), 7);
    }

    #[test]
    fn test_timeout_clamps_to_zero_when_overdue() {
        // A multi-hour stall since the last sample means the next iteration
        // is long overdue: no wait at all.
        assert_eq!(
            clamped_wait_timeout_ms(10, Duration::from_secs(3 * 60 * 60)),
            0
        );
    }

    #[test]
    fn test_timeout_clamps_to_ceiling() {
        // A pathological target period still wakes up within a minute.
        assert_eq!(
            clamped_wait_timeout_ms(u32::MAX, Duration::from_millis(1)),
            MAX_WAIT_TIMEOUT_MS as u64
        );
    }

    #[test]
    fn test_timeout_bounds_hold_for_arbitrary_inputs() {
        for period in [0u32, 1, 10, 1_000, 100_000, u32::MAX] {
            for since in [
                Duration::ZERO,
                Duration::from_millis(1),
                Duration::from_secs(1),
                Duration::from_secs(48 * 60 * 60),
            ] {
                let timeout = clamped_wait_timeout_ms(period, since);
                assert!(timeout <= MAX_WAIT_TIMEOUT_MS as u64);
            }
        }
    }

    #[test]
    fn test_interval_tracks_real_elapsed_time() {
        let shared = SharedDriverState::new();
        let mut timeline = IterationTimeline::new();
        timeline.set_state_computed_time(GraphTime::from_seconds(3600.0));

        let mut pacing = SystemClockPacing::new(DriverConfig::default());
        let (from0, to0) = pacing.get_interval_for_iteration(&mut timeline, &shared);
        assert_eq!(from0, GraphTime::ZERO);

        std::thread::sleep(Duration::from_millis(5));
        let before = Instant::now();
        let (from1, to1) = pacing.get_interval_for_iteration(&mut timeline, &shared);
        assert_eq!(from1, to0);
        let advanced = to1 - from1;
        assert!(advanced >= GraphTime::from_millis(4));
        // Bounded above by total wall time since the first sample.
        let ceiling = GraphTime::from_seconds((before - pacing.initial_timestamp).as_secs_f64())
            .saturating_add(GraphTime::from_millis(50));
        assert!(advanced <= ceiling);
    }
}
