//! Shared text rendering for the console.
//!
//! [`StatusFormatter`] keeps the `status`, `history` and `help` output
//! identical across front-ends. Everything writes into any
//! [`core::fmt::Write`], so firmware can render into a bounded buffer.

use core::fmt;
use core::time::Duration;

use crate::controller::ControllerSnapshot;
use crate::telemetry::TelemetryRecorder;

use super::catalog::{self, CommandSpec};

/// Helper that renders a [`ControllerSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a ControllerSnapshot,
}

impl<'a> StatusFormatter<'a> {
    /// Creates a new formatter for the provided snapshot.
    #[must_use]
    pub const fn new(snapshot: &'a ControllerSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes the mode line (e.g. `mode state=on brightness=50% ui=simple strobe=candle`).
    ///
    /// # Errors
    ///
    /// Propagates failures from `writer`.
    pub fn write_mode_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let context = self.snapshot.context;
        write!(
            writer,
            "mode state={} brightness={} ui={} strobe={} epoch={}",
            self.snapshot.state,
            context.brightness,
            context.ui.label(),
            context.last_strobe,
            self.snapshot.epoch
        )
    }

    /// Writes the display line (e.g. `display battery every=1.0s epoch=4` or `display idle`).
    ///
    /// # Errors
    ///
    /// Propagates failures from `writer`.
    pub fn write_display_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        match self.snapshot.display {
            Some(armed) => {
                write!(writer, "display {} every=", armed.handle.kind())?;
                write_duration(writer, armed.interval)?;
                write!(writer, " epoch={}", armed.handle.epoch())
            }
            None => writer.write_str("display idle"),
        }
    }

    /// Writes the task line (e.g. `task factory-reset epoch=7` or `task idle`).
    ///
    /// # Errors
    ///
    /// Propagates failures from `writer`.
    pub fn write_task_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        match self.snapshot.task {
            Some(ticket) => write!(writer, "task {} epoch={}", ticket.kind(), ticket.epoch()),
            None => writer.write_str("task idle"),
        }
    }
}

/// Writes up to `limit` of the newest events, oldest first, one per line.
///
/// # Errors
///
/// Propagates failures from `writer`.
pub fn write_history<W: fmt::Write, const CAPACITY: usize>(
    writer: &mut W,
    telemetry: &TelemetryRecorder<CAPACITY>,
    limit: Option<usize>,
) -> fmt::Result {
    let skip = limit.map_or(0, |limit| telemetry.len().saturating_sub(limit));
    for record in telemetry.oldest_first().skip(skip) {
        writeln!(writer, "{record}")?;
    }
    Ok(())
}

/// Writes the command list, or the usage of a single command.
///
/// # Errors
///
/// Propagates failures from `writer`.
pub fn write_help<W: fmt::Write>(writer: &mut W, topic: Option<&CommandSpec>) -> fmt::Result {
    match topic {
        Some(spec) => writeln!(writer, "{:<16} {}", spec.usage, spec.summary),
        None => {
            writeln!(writer, "{:<16} deliver a gesture (e.g. 1C, 3H, 10C)", "<n>C | <n>H")?;
            for spec in catalog::commands() {
                writeln!(writer, "{:<16} {}", spec.usage, spec.summary)?;
            }
            Ok(())
        }
    }
}

fn write_duration<W: fmt::Write>(writer: &mut W, value: Duration) -> fmt::Result {
    if value >= Duration::from_secs(1) {
        let millis = value.as_millis();
        let seconds = millis / 1_000;
        let tenths = (millis % 1_000) / 100;
        write!(writer, "{seconds}.{tenths}s")
    } else {
        write!(writer, "{}ms", value.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::display::{ArmedDisplay, DiagnosticKind, TimerHandle};
    use crate::states::ModeState;
    use crate::supervisor::{TaskKind, TaskTicket};
    use heapless::String;

    fn snapshot() -> ControllerSnapshot {
        ControllerSnapshot {
            state: ModeState::BatteryCheck,
            context: Context::new(),
            epoch: 4,
            display: Some(ArmedDisplay {
                handle: TimerHandle::new(4, DiagnosticKind::Battery),
                interval: Duration::from_millis(1_000),
            }),
            task: None,
        }
    }

    #[test]
    fn renders_mode_line() {
        let snapshot = snapshot();
        let mut line: String<96> = String::new();
        StatusFormatter::new(&snapshot)
            .write_mode_line(&mut line)
            .unwrap();
        assert_eq!(
            line.as_str(),
            "mode state=battery-check brightness=50% ui=simple strobe=candle epoch=4"
        );
    }

    #[test]
    fn renders_resource_lines() {
        let mut snapshot = snapshot();
        let mut line: String<64> = String::new();
        StatusFormatter::new(&snapshot)
            .write_display_line(&mut line)
            .unwrap();
        assert_eq!(line.as_str(), "display battery every=1.0s epoch=4");

        snapshot.display = None;
        snapshot.task = Some(TaskTicket::new(7, TaskKind::FactoryReset));
        line.clear();
        let formatter = StatusFormatter::new(&snapshot);
        formatter.write_display_line(&mut line).unwrap();
        line.push(' ').unwrap();
        formatter.write_task_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "display idle task factory-reset epoch=7");
    }

    #[test]
    fn help_for_one_command_prints_its_usage() {
        let mut text: String<128> = String::new();
        write_help(&mut text, catalog::find("wait")).unwrap();
        assert!(text.starts_with("wait <duration>"));
    }
}
