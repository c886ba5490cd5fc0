//! High-level console command dispatcher.
//!
//! [`CommandExecutor`] glues parsed console lines to a [`ModeController`] and
//! a [`DeadlineTracker`] running on a caller-supplied virtual clock. It stays
//! `no_std` friendly so the emulator and host tests share the same
//! implementation.

use core::fmt;
use core::ops::Add;
use core::time::Duration;

use crate::controller::{ControllerSnapshot, DispatchOutcome, LightOutput, ModeController};
use crate::gesture::Gesture;
use crate::supervisor::TaskTicket;
use crate::timing::{DeadlineTracker, PollSummary, TaskTiming};

use super::catalog::{self, CommandSpec};
use super::grammar::{self, Command};

/// Command execution successes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome<Instant> {
    /// A gesture was delivered.
    Gesture {
        gesture: Gesture,
        outcome: DispatchOutcome,
    },
    /// The clock advanced to `until`.
    Waited {
        until: Instant,
        summary: PollSummary,
    },
    Status(ControllerSnapshot),
    /// Caller should render the newest `limit` events (all when `None`).
    History { limit: Option<usize> },
    /// Caller should render help for `topic` (the command list when `None`).
    Help { topic: Option<&'static CommandSpec> },
}

/// Errors surfaced while executing a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandError<'a> {
    Parse(grammar::ParseError<'a>),
    UnknownTopic(&'a str),
    Unsupported(&'static str),
}

impl<'a> From<grammar::ParseError<'a>> for CommandError<'a> {
    fn from(error: grammar::ParseError<'a>) -> Self {
        Self::Parse(error)
    }
}

impl fmt::Display for CommandError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(error) => error.fmt(f),
            CommandError::UnknownTopic(topic) => write!(f, "no help for `{topic}`"),
            CommandError::Unsupported(reason) => f.write_str(reason),
        }
    }
}

/// Dispatches console commands into the controller.
pub struct CommandExecutor<O, Instant>
where
    O: LightOutput,
    Instant: Copy + Ord + Add<Duration, Output = Instant>,
{
    controller: ModeController<O>,
    tracker: DeadlineTracker<Instant>,
    now: Instant,
}

impl<O, Instant> CommandExecutor<O, Instant>
where
    O: LightOutput,
    Instant: Copy + Ord + Add<Duration, Output = Instant>,
{
    /// Creates a new executor around `controller` with its clock at `start`.
    pub fn new(controller: ModeController<O>, task_timing: TaskTiming, start: Instant) -> Self {
        let mut tracker = DeadlineTracker::new(task_timing);
        tracker.sync(&controller, start);
        Self {
            controller,
            tracker,
            now: start,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn controller(&self) -> &ModeController<O> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ModeController<O> {
        &mut self.controller
    }

    pub fn tracker(&self) -> &DeadlineTracker<Instant> {
        &self.tracker
    }

    /// Consumes the executor and yields the inner controller.
    pub fn into_inner(self) -> ModeController<O> {
        self.controller
    }

    /// Parses and executes a console line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the line does not parse, names an
    /// unknown help topic, or carries an argument the executor rejects.
    pub fn execute<'a>(&mut self, line: &'a str) -> Result<CommandOutcome<Instant>, CommandError<'a>> {
        let command = grammar::parse(line)?;
        self.dispatch(command)
    }

    /// Delivers one gesture at the current time.
    pub fn gesture(&mut self, gesture: Gesture) -> DispatchOutcome {
        let outcome = self.controller.dispatch(gesture);
        self.tracker.sync(&self.controller, self.now);
        outcome
    }

    /// Advances the clock by `by`, delivering every signal that falls due.
    pub fn advance(&mut self, by: Duration) -> PollSummary {
        self.now = self.now + by;
        self.tracker.poll(&mut self.controller, self.now)
    }

    /// Delivers a completion produced outside the tracker.
    pub fn complete_task(&mut self, ticket: TaskTicket) -> DispatchOutcome {
        let outcome = self.controller.complete_task(ticket);
        self.tracker.sync(&self.controller, self.now);
        outcome
    }

    fn dispatch<'a>(
        &mut self,
        command: Command<'a>,
    ) -> Result<CommandOutcome<Instant>, CommandError<'a>> {
        match command {
            Command::Gesture(gesture) => Ok(CommandOutcome::Gesture {
                gesture,
                outcome: self.gesture(gesture),
            }),
            Command::Wait(duration) => {
                if duration.is_zero() {
                    return Err(CommandError::Unsupported("wait duration must be non-zero"));
                }
                let summary = self.advance(duration);
                Ok(CommandOutcome::Waited {
                    until: self.now,
                    summary,
                })
            }
            Command::Status => Ok(CommandOutcome::Status(self.controller.snapshot())),
            Command::History(limit) => Ok(CommandOutcome::History {
                limit: limit.map(usize::from),
            }),
            Command::Help(help) => match help.topic {
                None => Ok(CommandOutcome::Help { topic: None }),
                Some(topic) => catalog::find(topic)
                    .map(|spec| CommandOutcome::Help { topic: Some(spec) })
                    .ok_or(CommandError::UnknownTopic(topic)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::NoopLightOutput;
    use crate::states::ModeState;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct MockInstant(u64);

    impl Add<Duration> for MockInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self::Output {
            Self(self.0 + u64::try_from(rhs.as_millis()).unwrap())
        }
    }

    fn executor() -> CommandExecutor<NoopLightOutput, MockInstant> {
        CommandExecutor::new(
            ModeController::new(NoopLightOutput),
            TaskTiming::Simulated,
            MockInstant(0),
        )
    }

    #[test]
    fn gesture_line_dispatches() {
        let mut executor = executor();

        let outcome = executor.execute("1C").expect("dispatch should succeed");
        assert_eq!(
            outcome,
            CommandOutcome::Gesture {
                gesture: Gesture::click(1),
                outcome: DispatchOutcome::Transitioned {
                    from: ModeState::Off,
                    to: ModeState::On,
                },
            }
        );
    }

    #[test]
    fn ignored_gesture_is_not_an_error() {
        let mut executor = executor();
        let outcome = executor.execute("9H").expect("ignored gestures still succeed");
        assert!(matches!(
            outcome,
            CommandOutcome::Gesture {
                outcome: DispatchOutcome::Ignored,
                ..
            }
        ));
    }

    #[test]
    fn wait_advances_the_clock_and_completes_tasks() {
        let mut executor = executor();
        executor.execute("15C").unwrap();

        let outcome = executor.execute("wait 3s").unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Waited {
                until: MockInstant(3_000),
                summary: PollSummary {
                    ticks: 0,
                    completions: 1,
                },
            }
        );
        assert_eq!(executor.controller().state(), ModeState::Off);
    }

    #[test]
    fn zero_wait_is_rejected() {
        let mut executor = executor();
        assert_eq!(
            executor.execute("wait 0ms"),
            Err(CommandError::Unsupported("wait duration must be non-zero"))
        );
    }

    #[test]
    fn help_resolves_topics() {
        let mut executor = executor();
        assert_eq!(
            executor.execute("help status"),
            Ok(CommandOutcome::Help {
                topic: catalog::find("status"),
            })
        );
        assert_eq!(
            executor.execute("help reboot"),
            Err(CommandError::UnknownTopic("reboot"))
        );
    }

    #[test]
    fn parse_error_is_returned() {
        let mut executor = executor();
        assert!(matches!(
            executor.execute("dance"),
            Err(CommandError::Parse(_))
        ));
    }
}
