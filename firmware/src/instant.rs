//! Embassy monotonic time adapted to the core deadline tracker.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::ops::Add;

use embassy_time::{Duration, Instant};

/// Converts a `core` duration to Embassy ticks, saturating on overflow.
pub fn core_duration_to_embassy(duration: core::time::Duration) -> Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(micros)
}

/// Instant type handed to `controller-core`, which only knows `core::time`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(target_os = "none")]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub const fn into_embassy(self) -> Instant {
        self.0
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(value: Instant) -> Self {
        Self(value)
    }
}

impl Add<core::time::Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: core::time::Duration) -> Self::Output {
        Self(
            self.0
                .checked_add(core_duration_to_embassy(rhs))
                .unwrap_or(Instant::MAX),
        )
    }
}
