use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::ops::Add;
use std::path::{Path, PathBuf};
use std::time::Duration;

use controller_core::context::Brightness;
use controller_core::controller::{DispatchOutcome, LightOutput, LightPower, ModeController};
use controller_core::repl::commands::{CommandError, CommandExecutor, CommandOutcome};
use controller_core::repl::status::{StatusFormatter, write_help, write_history};
use controller_core::timing::TaskTiming;

const TRANSCRIPT_DIR: &str = "transcripts";

/// Virtual clock reading, measured from session start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct VirtualInstant(Duration);

impl VirtualInstant {
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for VirtualInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Interactive,
    PowerOn,
    Ramp,
    SimpleUi,
    StrobeResume,
    FactoryReset,
    Diagnostics,
}

impl TranscriptProfile {
    pub const SCENARIOS: [TranscriptProfile; 6] = [
        TranscriptProfile::PowerOn,
        TranscriptProfile::Ramp,
        TranscriptProfile::SimpleUi,
        TranscriptProfile::StrobeResume,
        TranscriptProfile::FactoryReset,
        TranscriptProfile::Diagnostics,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "interactive",
            TranscriptProfile::PowerOn => "power-on",
            TranscriptProfile::Ramp => "ramp",
            TranscriptProfile::SimpleUi => "simple-ui",
            TranscriptProfile::StrobeResume => "strobe-resume",
            TranscriptProfile::FactoryReset => "factory-reset",
            TranscriptProfile::Diagnostics => "diagnostics",
        }
    }

    pub fn log_path(self) -> PathBuf {
        Path::new(TRANSCRIPT_DIR).join(format!("{}.log", self.tag()))
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "Flashlight emulator interactive transcript",
            TranscriptProfile::PowerOn => "Flashlight emulator transcript: single click from off",
            TranscriptProfile::Ramp => "Flashlight emulator transcript: brightness ramp",
            TranscriptProfile::SimpleUi => {
                "Flashlight emulator transcript: advanced gesture in simple UI"
            }
            TranscriptProfile::StrobeResume => {
                "Flashlight emulator transcript: strobe resumes last pattern"
            }
            TranscriptProfile::FactoryReset => "Flashlight emulator transcript: factory reset",
            TranscriptProfile::Diagnostics => "Flashlight emulator transcript: diagnostic readouts",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        [Self::Interactive]
            .into_iter()
            .chain(Self::SCENARIOS)
            .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }
}

/// Light output that narrates every request as a console line.
#[derive(Default)]
pub struct ConsoleLight {
    pending: Vec<String>,
}

impl ConsoleLight {
    fn drain(&mut self) -> impl Iterator<Item = String> + '_ {
        self.pending.drain(..)
    }
}

impl LightOutput for ConsoleLight {
    fn render_brightness(&mut self, level: Brightness) {
        self.pending.push(format!("light level={level}"));
    }

    fn set_light_power(&mut self, power: LightPower) {
        let label = match power {
            LightPower::On => "light on",
            LightPower::Off => "light off",
        };
        self.pending.push(label.to_string());
    }

    fn render_diagnostic_line(&mut self, line: &str) {
        self.pending.push(format!("display: {line}"));
    }
}

pub struct Session {
    executor: CommandExecutor<ConsoleLight, VirtualInstant>,
    transcript: TranscriptLogger,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::new(profile)?;
        let controller = ModeController::new(ConsoleLight::default());
        let executor =
            CommandExecutor::new(controller, TaskTiming::Simulated, VirtualInstant::default());

        let mut session = Self {
            executor,
            transcript,
        };
        // Entering `off` at power-up already talked to the light.
        session.take_light_lines();
        Ok(session)
    }

    /// Virtual time elapsed since the session started.
    pub fn elapsed(&self) -> Duration {
        self.executor.now().since_start()
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.transcript
            .append_line(self.elapsed(), TranscriptRole::Host, trimmed)?;

        let mut lines = match self.executor.execute(trimmed) {
            Ok(outcome) => self.describe(outcome),
            Err(CommandError::Parse(err)) => vec![format!("ERR syntax {err}")],
            Err(err) => vec![format!("ERR {err}")],
        };
        lines.extend(self.take_light_lines());

        for line in &lines {
            self.transcript
                .append_line(self.elapsed(), TranscriptRole::Emulator, line)?;
        }
        Ok(lines)
    }

    fn take_light_lines(&mut self) -> Vec<String> {
        self.executor
            .controller_mut()
            .output_mut()
            .drain()
            .map(|line| format!("  {line}"))
            .collect()
    }

    fn describe(&self, outcome: CommandOutcome<VirtualInstant>) -> Vec<String> {
        match outcome {
            CommandOutcome::Gesture { gesture, outcome } => match outcome {
                DispatchOutcome::Transitioned { from, to } => {
                    vec![format!("OK {gesture} {from} -> {to}")]
                }
                DispatchOutcome::Ignored => {
                    let state = self.executor.controller().state();
                    vec![format!("IGNORED {gesture} in {state}")]
                }
            },
            CommandOutcome::Waited { until, summary } => vec![format!(
                "OK wait now=+{}ms ticks={} completions={}",
                until.since_start().as_millis(),
                summary.ticks,
                summary.completions
            )],
            CommandOutcome::Status(snapshot) => {
                let formatter = StatusFormatter::new(&snapshot);
                let mut buffer = String::new();
                let rendered = formatter
                    .write_mode_line(&mut buffer)
                    .and_then(|()| buffer.write_char('\n'))
                    .and_then(|()| formatter.write_display_line(&mut buffer))
                    .and_then(|()| buffer.write_char('\n'))
                    .and_then(|()| formatter.write_task_line(&mut buffer));
                render_lines(rendered, &buffer)
            }
            CommandOutcome::History { limit } => {
                let mut buffer = String::new();
                let rendered =
                    write_history(&mut buffer, self.executor.controller().telemetry(), limit);
                let lines = render_lines(rendered, &buffer);
                if lines.is_empty() {
                    vec!["history empty".to_string()]
                } else {
                    lines
                }
            }
            CommandOutcome::Help { topic } => {
                let mut buffer = String::new();
                let rendered = write_help(&mut buffer, topic);
                render_lines(rendered, &buffer)
            }
        }
    }
}

fn render_lines(rendered: std::fmt::Result, buffer: &str) -> Vec<String> {
    match rendered {
        Ok(()) => buffer.lines().map(str::to_string).collect(),
        Err(_) => vec!["ERR render failed".to_string()],
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let path = profile.log_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are virtual milliseconds since power-up"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
