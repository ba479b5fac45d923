//! Virtual time for driving the session without a real clock.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

/// Instant on a simulated clock, measured from the start of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Start of the simulated run.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Instant `elapsed` after the start.
    pub const fn from_start(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Time since the start.
    pub const fn elapsed(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_saturates() {
        let early = SimInstant::ZERO;
        let late = early + Duration::from_secs(5);

        assert_eq!(late - early, Duration::from_secs(5));
        assert_eq!(early - late, Duration::ZERO);
    }
}
