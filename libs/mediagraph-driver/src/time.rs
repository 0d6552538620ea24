//! Virtual media time
//!
//! `GraphTime` is the graph's internal timeline position, independent of the
//! wall clock. It is measured in nanoseconds and only ever moves forward:
//! every pacing computation in this crate goes through saturating arithmetic
//! so a bad input can stall the clock but never wrap it.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Virtual time at which every driver's own timeline begins.
///
/// The switch-offset accumulator in [`crate::DriverHolder`] starts at
/// [`GraphTime::ZERO`] independently of this constant; the two together keep
/// the reported timeline continuous across driver switches.
pub const INITIAL_CURRENT_TIME: GraphTime = GraphTime::ZERO;

/// A position on the graph's virtual media timeline, in nanoseconds.
///
/// Not a wall-clock timestamp. Under a paced driver the two advance in
/// lockstep; under an offline driver `GraphTime` races ahead of real time,
/// and during an underrun it falls behind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GraphTime(i64);

impl GraphTime {
    pub const ZERO: GraphTime = GraphTime(0);

    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        GraphTime(nanos)
    }

    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        GraphTime(millis * 1_000_000)
    }

    #[inline]
    pub const fn to_millis(self) -> i64 {
        self.0 / 1_000_000
    }

    #[inline]
    pub fn from_seconds(seconds: f64) -> Self {
        GraphTime((seconds * 1_000_000_000.0) as i64)
    }

    #[inline]
    pub fn to_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    #[inline]
    pub fn saturating_add(self, rhs: GraphTime) -> Self {
        GraphTime(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: GraphTime) -> Self {
        GraphTime(self.0.saturating_sub(rhs.0))
    }
}

impl Add for GraphTime {
    type Output = GraphTime;

    fn add(self, rhs: GraphTime) -> GraphTime {
        self.saturating_add(rhs)
    }
}

impl Sub for GraphTime {
    type Output = GraphTime;

    fn sub(self, rhs: GraphTime) -> GraphTime {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for GraphTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.to_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(GraphTime::from_millis(10).as_nanos(), 10_000_000);
        assert_eq!(GraphTime::from_millis(10).to_millis(), 10);
        assert_eq!(GraphTime::from_seconds(1.5).as_nanos(), 1_500_000_000);
        assert!((GraphTime::from_nanos(250_000_000).to_seconds() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_ordering() {
        assert!(GraphTime::from_millis(5) < GraphTime::from_millis(6));
        assert_eq!(GraphTime::ZERO, GraphTime::default());
        assert_eq!(INITIAL_CURRENT_TIME, GraphTime::ZERO);
    }

    #[test]
    fn test_saturating_arithmetic() {
        let max = GraphTime::from_nanos(i64::MAX);
        assert_eq!(max.saturating_add(GraphTime::from_millis(1)), max);
        assert_eq!(
            GraphTime::from_millis(3) - GraphTime::from_millis(1),
            GraphTime::from_millis(2)
        );
    }

    #[test]
    fn test_serde_transparent() {
        let t = GraphTime::from_millis(42);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "42000000");
        let back: GraphTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
