//! Holds the active driver and keeps the reported timeline continuous
//! across driver switches.

use crate::driver::Driver;
use crate::time::GraphTime;

/// Wraps exactly one active [`Driver`] plus the virtual-time offset
/// accumulated by every driver retired before it.
///
/// Consumers of "current graph time" go through the holder, so the engine
/// can move between, say, an offline render driver and a realtime driver
/// without anyone observing a discontinuity.
///
/// The offset accumulator starts at [`GraphTime::ZERO`]; each driver's own
/// timeline starts at [`crate::time::INITIAL_CURRENT_TIME`].
pub struct DriverHolder {
    driver: Option<Box<dyn Driver>>,
    last_switch_offset: GraphTime,
}

impl DriverHolder {
    pub fn new() -> Self {
        Self {
            driver: None,
            last_switch_offset: GraphTime::ZERO,
        }
    }

    /// Install `next` as the active driver.
    ///
    /// The outgoing driver's last-known time is folded into the accumulated
    /// offset exactly once, at this moment, so the holder's reported time
    /// stays monotonic across any sequence of switches. The outgoing driver
    /// must already be stopped (or be stopped by the caller); the holder
    /// does not stop it.
    pub fn switch_to(&mut self, next: Box<dyn Driver>) {
        if let Some(active) = &self.driver {
            self.last_switch_offset = self
                .last_switch_offset
                .saturating_add(active.get_current_time());
        }
        self.driver = Some(next);
    }

    /// Current graph time: the accumulated switch offset plus the active
    /// driver's own time.
    ///
    /// # Panics
    ///
    /// Panics if no driver is installed; asking for the time without a
    /// clock is a programmer error in the owning engine.
    pub fn get_current_time(&self) -> GraphTime {
        let active = self
            .driver
            .as_ref()
            .expect("can't get current time without a clock");
        self.last_switch_offset.saturating_add(active.get_current_time())
    }

    pub fn driver(&self) -> Option<&(dyn Driver + 'static)> {
        self.driver.as_deref()
    }

    pub fn driver_mut(&mut self) -> Option<&mut (dyn Driver + 'static)> {
        self.driver.as_deref_mut()
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }
}

impl Default for DriverHolder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverTask;
    use crate::error::Result;

    /// Driver stub with a fixed notion of time.
    struct FixedTimeDriver(GraphTime);

    impl Driver for FixedTimeDriver {
        fn start(&mut self) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn dispatch(&self, _task: DriverTask) {}
        fn get_current_time(&self) -> GraphTime {
            self.0
        }
        fn ensure_next_iteration(&self) {}
        fn wake_up(&self) {}
    }

    #[test]
    fn test_driver_accessors_reach_active_driver() {
        let mut holder = DriverHolder::new();
        assert!(!holder.has_driver());
        assert!(holder.driver_mut().is_none());

        holder.switch_to(Box::new(FixedTimeDriver(GraphTime::from_millis(9))));
        let active = holder.driver_mut().expect("driver installed");
        active.start().unwrap();
        assert_eq!(
            holder.driver().unwrap().get_current_time(),
            GraphTime::from_millis(9)
        );
    }

    #[test]
    fn test_time_without_offset() {
        let mut holder = DriverHolder::new();
        holder.switch_to(Box::new(FixedTimeDriver(GraphTime::from_millis(100))));
        assert_eq!(holder.get_current_time(), GraphTime::from_millis(100));
    }

    #[test]
    fn test_switch_accumulates_offsets() {
        let mut holder = DriverHolder::new();
        holder.switch_to(Box::new(FixedTimeDriver(GraphTime::from_millis(100))));
        holder.switch_to(Box::new(FixedTimeDriver(GraphTime::from_millis(40))));
        assert_eq!(holder.get_current_time(), GraphTime::from_millis(140));

        // A third switch keeps every prior driver's contribution.
        holder.switch_to(Box::new(FixedTimeDriver(GraphTime::from_millis(2))));
        assert_eq!(holder.get_current_time(), GraphTime::from_millis(142));
    }

    #[test]
    fn test_time_is_monotonic_across_switches() {
        let mut holder = DriverHolder::new();
        let mut last = GraphTime::ZERO;
        for reached in [25i64, 0, 10, 3] {
            holder.switch_to(Box::new(FixedTimeDriver(GraphTime::ZERO)));
            assert!(holder.get_current_time() >= last);
            // Pretend the freshly installed driver ran up to `reached`.
            holder.driver = Some(Box::new(FixedTimeDriver(GraphTime::from_millis(reached))));
            last = holder.get_current_time();
        }
    }

    #[test]
    #[should_panic(expected = "without a clock")]
    fn test_time_without_driver_panics() {
        DriverHolder::new().get_current_time();
    }
}
