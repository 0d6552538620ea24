//! Iteration clock drivers for a real-time media processing graph.
//!
//! A driver decides, repeatedly, how much virtual time has just elapsed and
//! how far ahead graph state must be precomputed, then hands the engine one
//! `[from, to)` window to process. Two pacing strategies are provided:
//!
//! - [`SystemClockDriver`] advances virtual time in lockstep with the wall
//!   clock, sleeping between iterations and clamping to the engine's
//!   precomputed horizon when it falls behind (underrun);
//! - [`OfflineClockDriver`] advances virtual time in fixed slices as fast as
//!   the host can execute, for non-realtime rendering.
//!
//! [`DriverHolder`] owns the active driver and accumulates a time offset on
//! every switch, so moving between drivers mid-stream never produces a
//! discontinuity in the reported timeline.
//!
//! The graph engine itself is opaque to this crate: drivers call into it
//! through the [`GraphEngine`] trait and otherwise only decide *when* and
//! *for how long* (in virtual time) each iteration occurs.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod holder;
pub mod monitor;
pub mod pacing;
pub mod time;

pub use config::{DriverConfig, MAX_WAIT_TIMEOUT_MS};
pub use driver::{Driver, DriverTask, IterationTimeline, SharedDriverState, ThreadedDriver};
pub use engine::GraphEngine;
pub use error::{DriverError, Result};
pub use holder::DriverHolder;
pub use monitor::{DriverMonitor, WaitState};
pub use pacing::{
    OfflineClockDriver, OfflinePacing, PacingStrategy, SystemClockDriver, SystemClockPacing,
};
pub use time::{GraphTime, INITIAL_CURRENT_TIME};
