//! Engine event log shared by firmware and host targets.
//!
//! Every observable step of the mode controller is recorded into a bounded
//! ring so the console can replay recent history without allocation. Event
//! kinds encode to compact numeric codes for transport over diagnostics
//! channels; payloads carry the extra detail the console renders.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::display::DiagnosticKind;
use crate::states::{Epoch, ModeState};
use crate::supervisor::TaskKind;
use crate::table::Trigger;

/// Sequential identifier assigned to each recorded event.
pub type EventId = u32;

/// Discriminated engine events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    /// A transition completed and the named state is now current.
    Transition(ModeState),
    /// No row matched while in the named state.
    GestureIgnored(ModeState),
    DisplayArmed(DiagnosticKind),
    DisplayDisarmed(DiagnosticKind),
    /// A tick arrived for a display that is no longer live.
    StaleTickDropped(DiagnosticKind),
    TaskLaunched(TaskKind),
    TaskCompleted(TaskKind),
    /// A completion arrived for a ticket that is no longer outstanding.
    StaleCompletionDropped(TaskKind),
    /// Raw code this build does not know. Only produced by
    /// [`TelemetryEventKind::from_raw`]; the engine never records it.
    Unknown(u16),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::Transition(state) => write!(f, "enter {state}"),
            TelemetryEventKind::GestureIgnored(state) => write!(f, "ignored in {state}"),
            TelemetryEventKind::DisplayArmed(kind) => write!(f, "display-armed {kind}"),
            TelemetryEventKind::DisplayDisarmed(kind) => write!(f, "display-disarmed {kind}"),
            TelemetryEventKind::StaleTickDropped(kind) => write!(f, "stale-tick {kind}"),
            TelemetryEventKind::TaskLaunched(kind) => write!(f, "task-launched {kind}"),
            TelemetryEventKind::TaskCompleted(kind) => write!(f, "task-completed {kind}"),
            TelemetryEventKind::StaleCompletionDropped(kind) => {
                write!(f, "stale-completion {kind}")
            }
            TelemetryEventKind::Unknown(code) => write!(f, "unknown(0x{code:04x})"),
        }
    }
}

impl TelemetryEventKind {
    const TRANSITION_BASE: u16 = 0x0000;
    const IGNORED_BASE: u16 = 0x0010;
    const DISPLAY_ARMED_BASE: u16 = 0x0020;
    const DISPLAY_DISARMED_BASE: u16 = 0x0024;
    const STALE_TICK_BASE: u16 = 0x0028;
    const TASK_LAUNCHED_BASE: u16 = 0x0030;
    const TASK_COMPLETED_BASE: u16 = 0x0032;
    const STALE_COMPLETION_BASE: u16 = 0x0034;
    const RESERVED_END: u16 = 0x0036;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            TelemetryEventKind::Transition(state) => Self::TRANSITION_BASE + state_index(state),
            TelemetryEventKind::GestureIgnored(state) => Self::IGNORED_BASE + state_index(state),
            TelemetryEventKind::DisplayArmed(kind) => {
                Self::DISPLAY_ARMED_BASE + diagnostic_index(kind)
            }
            TelemetryEventKind::DisplayDisarmed(kind) => {
                Self::DISPLAY_DISARMED_BASE + diagnostic_index(kind)
            }
            TelemetryEventKind::StaleTickDropped(kind) => {
                Self::STALE_TICK_BASE + diagnostic_index(kind)
            }
            TelemetryEventKind::TaskLaunched(kind) => Self::TASK_LAUNCHED_BASE + task_index(kind),
            TelemetryEventKind::TaskCompleted(kind) => {
                Self::TASK_COMPLETED_BASE + task_index(kind)
            }
            TelemetryEventKind::StaleCompletionDropped(kind) => {
                Self::STALE_COMPLETION_BASE + task_index(kind)
            }
            TelemetryEventKind::Unknown(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`TelemetryEventKind::Unknown`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        let decoded = match code {
            value if value < Self::IGNORED_BASE => {
                state_from_index(value - Self::TRANSITION_BASE).map(TelemetryEventKind::Transition)
            }
            value if value < Self::DISPLAY_ARMED_BASE => {
                state_from_index(value - Self::IGNORED_BASE)
                    .map(TelemetryEventKind::GestureIgnored)
            }
            value if value < Self::DISPLAY_DISARMED_BASE => {
                diagnostic_from_index(value - Self::DISPLAY_ARMED_BASE)
                    .map(TelemetryEventKind::DisplayArmed)
            }
            value if value < Self::STALE_TICK_BASE => {
                diagnostic_from_index(value - Self::DISPLAY_DISARMED_BASE)
                    .map(TelemetryEventKind::DisplayDisarmed)
            }
            value if value < Self::TASK_LAUNCHED_BASE => {
                diagnostic_from_index(value - Self::STALE_TICK_BASE)
                    .map(TelemetryEventKind::StaleTickDropped)
            }
            value if value < Self::TASK_COMPLETED_BASE => {
                task_from_index(value - Self::TASK_LAUNCHED_BASE)
                    .map(TelemetryEventKind::TaskLaunched)
            }
            value if value < Self::STALE_COMPLETION_BASE => {
                task_from_index(value - Self::TASK_COMPLETED_BASE)
                    .map(TelemetryEventKind::TaskCompleted)
            }
            value if value < Self::RESERVED_END => {
                task_from_index(value - Self::STALE_COMPLETION_BASE)
                    .map(TelemetryEventKind::StaleCompletionDropped)
            }
            _ => None,
        };
        decoded.unwrap_or(TelemetryEventKind::Unknown(code))
    }
}

/// Extra detail recorded alongside an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    None,
    /// State left and the trigger that caused a transition.
    Transition { from: ModeState, trigger: Trigger },
    /// Trigger that found no admissible row.
    Ignored(Trigger),
    /// Epoch stamped on the timer handle or task ticket involved.
    Handle(Epoch),
}

impl fmt::Display for TelemetryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryPayload::None => Ok(()),
            TelemetryPayload::Transition { from, trigger } => {
                write!(f, "from={from} trigger={trigger}")
            }
            TelemetryPayload::Ignored(trigger) => write!(f, "trigger={trigger}"),
            TelemetryPayload::Handle(epoch) => write!(f, "epoch={epoch}"),
        }
    }
}

/// Total number of events retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Event stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {}", self.id, self.event)?;
        if self.details != TelemetryPayload::None {
            write!(f, " {}", self.details)?;
        }
        Ok(())
    }
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord, CAPACITY>;

/// Records engine events into a fixed-size ring buffer.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: TelemetryRing<CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    /// Creates a new recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded events in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent event, if available.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total number of events ever recorded, including evicted ones.
    pub fn total_recorded(&self) -> EventId {
        self.next_event_id
    }

    /// Records an event with the supplied payload.
    pub fn record(&mut self, event: TelemetryEventKind, details: TelemetryPayload) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord { id, event, details });

        id
    }

    pub fn record_transition(&mut self, from: ModeState, to: ModeState, trigger: Trigger) -> EventId {
        self.record(
            TelemetryEventKind::Transition(to),
            TelemetryPayload::Transition { from, trigger },
        )
    }

    pub fn record_ignored(&mut self, state: ModeState, trigger: Trigger) -> EventId {
        self.record(
            TelemetryEventKind::GestureIgnored(state),
            TelemetryPayload::Ignored(trigger),
        )
    }

    pub fn record_handle(&mut self, event: TelemetryEventKind, epoch: Epoch) -> EventId {
        self.record(event, TelemetryPayload::Handle(epoch))
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

// STATE_COUNT is 16, well inside u16.
#[allow(clippy::cast_possible_truncation)]
const fn state_index(state: ModeState) -> u16 {
    state.as_index() as u16
}

fn state_from_index(index: u16) -> Option<ModeState> {
    ModeState::from_index(usize::from(index))
}

const fn diagnostic_index(kind: DiagnosticKind) -> u16 {
    match kind {
        DiagnosticKind::Battery => 0,
        DiagnosticKind::Temperature => 1,
        DiagnosticKind::Beacon => 2,
        DiagnosticKind::Sos => 3,
    }
}

fn diagnostic_from_index(index: u16) -> Option<DiagnosticKind> {
    match index {
        0 => Some(DiagnosticKind::Battery),
        1 => Some(DiagnosticKind::Temperature),
        2 => Some(DiagnosticKind::Beacon),
        3 => Some(DiagnosticKind::Sos),
        _ => None,
    }
}

const fn task_index(kind: TaskKind) -> u16 {
    match kind {
        TaskKind::FactoryReset => 0,
        TaskKind::VersionReadout => 1,
    }
}

fn task_from_index(index: u16) -> Option<TaskKind> {
    match index {
        0 => Some(TaskKind::FactoryReset),
        1 => Some(TaskKind::VersionReadout),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Gesture;
    use crate::strobe::StrobePattern;

    #[test]
    fn raw_codes_decode_to_the_same_event() {
        let fixtures = [
            (TelemetryEventKind::Transition(ModeState::Off), 0x0000),
            (
                TelemetryEventKind::Transition(ModeState::Strobe(StrobePattern::LightningStorm)),
                0x000F,
            ),
            (TelemetryEventKind::GestureIgnored(ModeState::Lockout), 0x0013),
            (TelemetryEventKind::DisplayDisarmed(DiagnosticKind::Sos), 0x0027),
            (
                TelemetryEventKind::StaleCompletionDropped(TaskKind::VersionReadout),
                0x0035,
            ),
        ];

        for (event, code) in fixtures {
            assert_eq!(event.to_raw(), code);
            assert_eq!(TelemetryEventKind::from_raw(code), event);
        }
    }

    #[test]
    fn unknown_codes_decode_as_unknown() {
        assert_eq!(
            TelemetryEventKind::from_raw(0x002C),
            TelemetryEventKind::Unknown(0x002C)
        );
        assert_eq!(
            TelemetryEventKind::from_raw(0xBEEF),
            TelemetryEventKind::Unknown(0xBEEF)
        );
        assert_eq!(TelemetryEventKind::Unknown(0xBEEF).to_raw(), 0xBEEF);
    }

    #[test]
    fn ring_keeps_the_newest_records() {
        let mut recorder: TelemetryRecorder<4> = TelemetryRecorder::new();
        for _ in 0..6 {
            recorder.record_ignored(ModeState::On, Trigger::Gesture(Gesture::click(9)));
        }

        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.total_recorded(), 6);
        let ids: heapless::Vec<EventId, 4> =
            recorder.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[2, 3, 4, 5]);
        assert_eq!(recorder.latest().map(|record| record.id), Some(5));
    }
}
