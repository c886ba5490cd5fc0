//! Logging hooks for the firmware target.
//!
//! The controller keeps its own event ring in `controller-core`. This module
//! mirrors newly recorded events to defmt (or stdout on the host) and owns
//! the other log lines the firmware emits, so call sites never repeat the
//! `cfg` split.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use controller_core::controller::DispatchOutcome;
use controller_core::gesture::Gesture;
use controller_core::supervisor::TaskKind;
use controller_core::telemetry::{EventId, TelemetryRecord, TelemetryRecorder};

/// Mirrors controller events that have not been logged yet.
#[derive(Clone, Debug, Default)]
pub struct TelemetryForwarder {
    seen: EventId,
}

impl TelemetryForwarder {
    pub const fn new() -> Self {
        Self { seen: 0 }
    }

    /// Logs every record added since the previous call and returns how many
    /// were emitted. Records evicted from the ring before they were seen are
    /// skipped.
    pub fn forward<const CAPACITY: usize>(&mut self, recorder: &TelemetryRecorder<CAPACITY>) -> usize {
        let total = recorder.total_recorded();
        let pending = usize::try_from(total.wrapping_sub(self.seen))
            .unwrap_or(usize::MAX)
            .min(recorder.len());
        self.seen = total;

        let skip = recorder.len() - pending;
        for record in recorder.oldest_first().skip(skip) {
            log_record(record);
        }
        pending
    }
}

#[cfg(target_os = "none")]
fn log_record(record: &TelemetryRecord) {
    defmt::info!("telemetry:{}", defmt::Display2Format(record));
}

#[cfg(not(target_os = "none"))]
fn log_record(record: &TelemetryRecord) {
    println!("telemetry:{record}");
}

#[cfg(target_os = "none")]
pub fn log_gesture(gesture: Gesture, outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Ignored => {
            defmt::debug!("button: {} ignored", defmt::Display2Format(&gesture));
        }
        DispatchOutcome::Transitioned { from, to } => defmt::info!(
            "button: {} {} -> {}",
            defmt::Display2Format(&gesture),
            from.label(),
            to.label()
        ),
    }
}

#[cfg(not(target_os = "none"))]
pub fn log_gesture(gesture: Gesture, outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Ignored => println!("button: {gesture} ignored"),
        DispatchOutcome::Transitioned { from, to } => {
            println!("button: {gesture} {} -> {}", from.label(), to.label());
        }
    }
}

#[cfg(target_os = "none")]
pub fn log_diagnostic_line(line: &str) {
    defmt::info!("display: {}", line);
}

#[cfg(not(target_os = "none"))]
pub fn log_diagnostic_line(line: &str) {
    println!("display: {line}");
}

#[cfg(target_os = "none")]
pub fn log_task_started(kind: TaskKind) {
    defmt::info!("maintenance: {} started", kind.label());
}

#[cfg(not(target_os = "none"))]
pub fn log_task_started(kind: TaskKind) {
    println!("maintenance: {kind} started");
}

#[cfg(target_os = "none")]
pub fn log_task_finished(kind: TaskKind, dropped_gestures: usize) {
    defmt::info!(
        "maintenance: {} finished, {=usize} gestures dropped",
        kind.label(),
        dropped_gestures
    );
}

#[cfg(not(target_os = "none"))]
pub fn log_task_finished(kind: TaskKind, dropped_gestures: usize) {
    println!("maintenance: {kind} finished, {dropped_gestures} gestures dropped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::states::ModeState;
    use controller_core::telemetry::{TelemetryEventKind, TelemetryPayload};

    fn enter(recorder: &mut TelemetryRecorder<8>, state: ModeState) {
        recorder.record(TelemetryEventKind::Transition(state), TelemetryPayload::None);
    }

    #[test]
    fn forwards_only_new_records() {
        let mut recorder: TelemetryRecorder<8> = TelemetryRecorder::new();
        let mut forwarder = TelemetryForwarder::new();

        enter(&mut recorder, ModeState::On);
        enter(&mut recorder, ModeState::Off);
        assert_eq!(forwarder.forward(&recorder), 2);
        assert_eq!(forwarder.forward(&recorder), 0);

        enter(&mut recorder, ModeState::Lockout);
        assert_eq!(forwarder.forward(&recorder), 1);
    }

    #[test]
    fn evicted_records_are_skipped() {
        let mut recorder: TelemetryRecorder<4> = TelemetryRecorder::new();
        let mut forwarder = TelemetryForwarder::new();

        for _ in 0..10 {
            recorder.record(
                TelemetryEventKind::GestureIgnored(ModeState::Off),
                TelemetryPayload::None,
            );
        }
        assert_eq!(forwarder.forward(&recorder), 4);
    }
}
