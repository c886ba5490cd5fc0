//! Timer-bound diagnostic display.
//!
//! Diagnostic states arm a periodic readout on entry and disarm it on exit.
//! The subsystem owns at most one [`ArmedDisplay`]; every handle carries the
//! epoch of the state entry that armed it, so a tick delivered after the
//! owning state was exited no longer matches and is dropped here instead of
//! reaching the output.

use core::fmt;
use core::time::Duration;

use crate::states::Epoch;

/// Readouts that own a periodic display line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DiagnosticKind {
    Battery,
    Temperature,
    Beacon,
    Sos,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Battery => "battery",
            DiagnosticKind::Temperature => "temperature",
            DiagnosticKind::Beacon => "beacon",
            DiagnosticKind::Sos => "sos",
        }
    }

    /// Text rendered on every tick.
    #[must_use]
    pub const fn line(self) -> &'static str {
        match self {
            DiagnosticKind::Battery => "Displaying: Battery Level",
            DiagnosticKind::Temperature => "Displaying: Temperature",
            DiagnosticKind::Beacon => "Displaying: Beacon Mode",
            DiagnosticKind::Sos => "Displaying: SOS Mode",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one arming of the periodic display.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimerHandle {
    epoch: Epoch,
    kind: DiagnosticKind,
}

impl TimerHandle {
    #[must_use]
    pub const fn new(epoch: Epoch, kind: DiagnosticKind) -> Self {
        Self { epoch, kind }
    }

    #[must_use]
    pub const fn epoch(self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub const fn kind(self) -> DiagnosticKind {
        self.kind
    }
}

/// Live periodic display and its nominal refresh period.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArmedDisplay {
    pub handle: TimerHandle,
    pub interval: Duration,
}

/// Owner of the single periodic display timer.
#[derive(Clone, Debug, Default)]
pub struct DisplaySubsystem {
    armed: Option<ArmedDisplay>,
    arm_count: u32,
    disarm_count: u32,
}

impl DisplaySubsystem {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            armed: None,
            arm_count: 0,
            disarm_count: 0,
        }
    }

    /// Arms the periodic display for `kind`.
    ///
    /// Any display that is still armed is disarmed first so that only one
    /// timer is ever live.
    pub fn arm(&mut self, kind: DiagnosticKind, interval: Duration, epoch: Epoch) -> TimerHandle {
        self.disarm_active();

        let handle = TimerHandle::new(epoch, kind);
        self.armed = Some(ArmedDisplay { handle, interval });
        self.arm_count = self.arm_count.wrapping_add(1);
        handle
    }

    /// Disarms `handle` if it is the live display. Stale or repeated handles
    /// are ignored and return `false`.
    pub fn disarm(&mut self, handle: TimerHandle) -> bool {
        match self.armed {
            Some(armed) if armed.handle == handle => {
                self.armed = None;
                self.disarm_count = self.disarm_count.wrapping_add(1);
                true
            }
            _ => false,
        }
    }

    /// Disarms whatever display is live, returning its handle.
    pub fn disarm_active(&mut self) -> Option<TimerHandle> {
        let handle = self.armed?.handle;
        self.disarm(handle);
        Some(handle)
    }

    /// Resolves a tick back to its readout when `handle` is still live.
    #[must_use]
    pub fn tick(&self, handle: TimerHandle) -> Option<DiagnosticKind> {
        match self.armed {
            Some(armed) if armed.handle == handle => Some(handle.kind),
            _ => None,
        }
    }

    #[must_use]
    pub const fn armed(&self) -> Option<ArmedDisplay> {
        self.armed
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Number of successful arm calls since construction.
    #[must_use]
    pub const fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Number of disarm calls that released a live display.
    #[must_use]
    pub const fn disarm_count(&self) -> u32 {
        self.disarm_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1_000);

    #[test]
    fn disarm_is_idempotent() {
        let mut display = DisplaySubsystem::new();
        let handle = display.arm(DiagnosticKind::Battery, INTERVAL, 1);

        assert!(display.disarm(handle));
        assert!(!display.disarm(handle));
        assert!(!display.is_armed());
        assert_eq!(display.arm_count(), 1);
        assert_eq!(display.disarm_count(), 1);
    }

    #[test]
    fn disarming_a_never_armed_handle_is_a_noop() {
        let mut display = DisplaySubsystem::new();
        assert!(!display.disarm(TimerHandle::new(9, DiagnosticKind::Sos)));
        assert_eq!(display.disarm_active(), None);
        assert_eq!(display.disarm_count(), 0);
    }

    #[test]
    fn rearming_releases_the_previous_timer() {
        let mut display = DisplaySubsystem::new();
        let first = display.arm(DiagnosticKind::Battery, INTERVAL, 1);
        let second = display.arm(DiagnosticKind::Temperature, INTERVAL, 2);

        assert_eq!(display.arm_count(), 2);
        assert_eq!(display.disarm_count(), 1);
        assert_eq!(display.tick(first), None);
        assert_eq!(display.tick(second), Some(DiagnosticKind::Temperature));
    }

    #[test]
    fn same_kind_from_a_new_entry_is_a_different_handle() {
        let mut display = DisplaySubsystem::new();
        let stale = display.arm(DiagnosticKind::Beacon, INTERVAL, 4);
        display.disarm(stale);
        let live = display.arm(DiagnosticKind::Beacon, INTERVAL, 5);

        assert_ne!(stale, live);
        assert_eq!(display.tick(stale), None);
        assert!(!display.disarm(stale));
        assert_eq!(display.tick(live), Some(DiagnosticKind::Beacon));
    }
}
