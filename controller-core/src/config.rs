//! Timing configuration shared by firmware and host targets.

use core::time::Duration;

use crate::supervisor::TaskKind;

/// Nominal refresh period for diagnostic readouts.
pub const DEFAULT_DISPLAY_INTERVAL: Duration = Duration::from_millis(1_000);

/// Time the factory reset operation keeps the controller busy.
pub const DEFAULT_FACTORY_RESET_LATENCY: Duration = Duration::from_millis(3_000);

/// Time the version readout keeps the controller busy.
pub const DEFAULT_VERSION_READOUT_LATENCY: Duration = Duration::from_millis(3_000);

/// Tunables applied by the mode controller and its drivers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    display_interval: Duration,
    factory_reset_latency: Duration,
    version_readout_latency: Duration,
}

impl ControllerConfig {
    /// Creates a configuration with explicit timings.
    #[must_use]
    pub const fn new(
        display_interval: Duration,
        factory_reset_latency: Duration,
        version_readout_latency: Duration,
    ) -> Self {
        Self {
            display_interval,
            factory_reset_latency,
            version_readout_latency,
        }
    }

    /// Returns a copy with a different diagnostic refresh period.
    ///
    /// A zero interval is bumped to one millisecond so periodic displays
    /// always make forward progress.
    #[must_use]
    pub const fn with_display_interval(mut self, interval: Duration) -> Self {
        self.display_interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };
        self
    }

    #[must_use]
    pub const fn display_interval(&self) -> Duration {
        self.display_interval
    }

    /// Latency of the long-running operation behind `kind`.
    #[must_use]
    pub const fn task_latency(&self, kind: TaskKind) -> Duration {
        match kind {
            TaskKind::FactoryReset => self.factory_reset_latency,
            TaskKind::VersionReadout => self.version_readout_latency,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_DISPLAY_INTERVAL,
            DEFAULT_FACTORY_RESET_LATENCY,
            DEFAULT_VERSION_READOUT_LATENCY,
        )
    }
}
