//! Mode controller engine.
//!
//! [`ModeController`] owns the context, the current state and both resource
//! subsystems. Every trigger goes through the same sequence: look up the
//! admissible row, run the exit actions of the current state, run the row's
//! actions, make the target current, run its entry actions, then settle any
//! eventless rows the new state offers. All of it happens under `&mut self`,
//! so no other trigger can observe a half-applied transition.

use crate::config::ControllerConfig;
use crate::context::{Brightness, Context};
use crate::display::{ArmedDisplay, DisplaySubsystem, TimerHandle};
use crate::gesture::Gesture;
use crate::states::{Epoch, ModeState};
use crate::supervisor::{TaskSupervisor, TaskTicket};
use crate::table::{self, Action, TransitionSpec, Trigger};
use crate::telemetry::{TelemetryEventKind, TelemetryRecorder};

/// Upper bound on chained eventless transitions after one trigger.
pub const MAX_EVENTLESS_STEPS: usize = 4;

/// Power state requested from the light driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LightPower {
    On,
    Off,
}

/// Output capability driven by the controller. Calls are fire and forget.
pub trait LightOutput {
    fn render_brightness(&mut self, level: Brightness);

    fn set_light_power(&mut self, power: LightPower);

    /// Renders one line of a periodic diagnostic readout.
    fn render_diagnostic_line(&mut self, line: &str);
}

impl<T: LightOutput + ?Sized> LightOutput for &mut T {
    fn render_brightness(&mut self, level: Brightness) {
        (**self).render_brightness(level);
    }

    fn set_light_power(&mut self, power: LightPower) {
        (**self).set_light_power(power);
    }

    fn render_diagnostic_line(&mut self, line: &str) {
        (**self).render_diagnostic_line(line);
    }
}

/// Output that discards every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLightOutput;

impl LightOutput for NoopLightOutput {
    fn render_brightness(&mut self, _level: Brightness) {}

    fn set_light_power(&mut self, _power: LightPower) {}

    fn render_diagnostic_line(&mut self, _line: &str) {}
}

/// Result of delivering one trigger.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// No admissible row; nothing changed.
    Ignored,
    /// A transition ran. `to` is the state current after eventless settling.
    Transitioned { from: ModeState, to: ModeState },
}

impl DispatchOutcome {
    #[must_use]
    pub const fn is_ignored(self) -> bool {
        matches!(self, DispatchOutcome::Ignored)
    }
}

/// Point-in-time view of the controller used by consoles and logs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerSnapshot {
    pub state: ModeState,
    pub context: Context,
    pub epoch: Epoch,
    pub display: Option<ArmedDisplay>,
    pub task: Option<TaskTicket>,
}

/// Single-button mode controller.
pub struct ModeController<O: LightOutput> {
    config: ControllerConfig,
    context: Context,
    state: ModeState,
    epoch: Epoch,
    display: DisplaySubsystem,
    tasks: TaskSupervisor,
    output: O,
    telemetry: TelemetryRecorder,
}

impl<O: LightOutput> ModeController<O> {
    /// Creates a controller in [`ModeState::Off`] with default timings.
    pub fn new(output: O) -> Self {
        Self::with_config(output, ControllerConfig::default())
    }

    /// Creates a controller in [`ModeState::Off`] and runs its entry actions.
    pub fn with_config(output: O, config: ControllerConfig) -> Self {
        let mut controller = Self {
            config,
            context: Context::new(),
            state: ModeState::Off,
            epoch: 0,
            display: DisplaySubsystem::new(),
            tasks: TaskSupervisor::new(),
            output,
            telemetry: TelemetryRecorder::new(),
        };
        controller.enter(ModeState::Off);
        controller
    }

    /// Delivers one user gesture.
    pub fn dispatch(&mut self, gesture: Gesture) -> DispatchOutcome {
        self.fire(Trigger::Gesture(gesture))
    }

    /// Delivers the completion of a launched operation.
    ///
    /// Completions for tickets that are no longer outstanding are dropped
    /// without touching state or context.
    pub fn complete_task(&mut self, ticket: TaskTicket) -> DispatchOutcome {
        match self.tasks.resolve(ticket) {
            Some(kind) => {
                self.telemetry
                    .record_handle(TelemetryEventKind::TaskCompleted(kind), ticket.epoch());
                self.fire(Trigger::TaskDone)
            }
            None => {
                self.telemetry.record_handle(
                    TelemetryEventKind::StaleCompletionDropped(ticket.kind()),
                    ticket.epoch(),
                );
                DispatchOutcome::Ignored
            }
        }
    }

    /// Delivers one periodic display tick. Returns `true` when a line was
    /// rendered and `false` when the handle was stale.
    pub fn display_tick(&mut self, handle: TimerHandle) -> bool {
        if let Some(kind) = self.display.tick(handle) {
            self.output.render_diagnostic_line(kind.line());
            true
        } else {
            self.telemetry
                .record_handle(TelemetryEventKind::StaleTickDropped(handle.kind()), handle.epoch());
            false
        }
    }

    #[must_use]
    pub fn state(&self) -> ModeState {
        self.state
    }

    #[must_use]
    pub fn context(&self) -> Context {
        self.context
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Generation of the current state entry.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub fn armed_display(&self) -> Option<ArmedDisplay> {
        self.display.armed()
    }

    #[must_use]
    pub fn outstanding_task(&self) -> Option<TaskTicket> {
        self.tasks.outstanding()
    }

    #[must_use]
    pub fn display(&self) -> &DisplaySubsystem {
        &self.display
    }

    #[must_use]
    pub fn tasks(&self) -> &TaskSupervisor {
        &self.tasks
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            context: self.context,
            epoch: self.epoch,
            display: self.display.armed(),
            task: self.tasks.outstanding(),
        }
    }

    fn fire(&mut self, trigger: Trigger) -> DispatchOutcome {
        let from = self.state;
        let Some(spec) = table::lookup(from, trigger, self.context) else {
            self.telemetry.record_ignored(from, trigger);
            return DispatchOutcome::Ignored;
        };

        self.take(spec, trigger);
        self.settle();

        DispatchOutcome::Transitioned {
            from,
            to: self.state,
        }
    }

    fn take(&mut self, spec: &'static TransitionSpec, trigger: Trigger) {
        let from = self.state;
        self.run(from.exit_actions());
        self.run(spec.actions);
        self.state = spec.target;
        self.telemetry.record_transition(from, spec.target, trigger);
        self.enter(spec.target);
    }

    fn enter(&mut self, state: ModeState) {
        self.epoch = self.epoch.wrapping_add(1);
        self.run(state.entry_actions());
    }

    fn settle(&mut self) {
        for _ in 0..MAX_EVENTLESS_STEPS {
            match table::lookup(self.state, Trigger::Always, self.context) {
                Some(spec) => self.take(spec, Trigger::Always),
                None => return,
            }
        }
    }

    fn run(&mut self, actions: &[Action]) {
        for action in actions {
            self.apply(*action);
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::TurnLightOn => {
                self.output.set_light_power(LightPower::On);
                self.output.render_brightness(self.context.brightness);
            }
            Action::TurnLightOff => self.output.set_light_power(LightPower::Off),
            Action::IncreaseBrightness => self.context.increase_brightness(),
            Action::DecreaseBrightness => self.context.decrease_brightness(),
            Action::SetBrightness(level) => self.context.set_brightness(level),
            Action::SetUi(ui) => self.context.set_ui(ui),
            Action::RecordStrobe(pattern) => self.context.record_strobe(pattern),
            Action::RestoreDefaults => self.context.restore_defaults(),
            Action::ArmDisplay(kind) => {
                if let Some(previous) = self.display.disarm_active() {
                    self.telemetry.record_handle(
                        TelemetryEventKind::DisplayDisarmed(previous.kind()),
                        previous.epoch(),
                    );
                }
                let handle = self
                    .display
                    .arm(kind, self.config.display_interval(), self.epoch);
                self.telemetry
                    .record_handle(TelemetryEventKind::DisplayArmed(kind), handle.epoch());
            }
            Action::DisarmDisplay => {
                if let Some(handle) = self.display.disarm_active() {
                    self.telemetry.record_handle(
                        TelemetryEventKind::DisplayDisarmed(handle.kind()),
                        handle.epoch(),
                    );
                }
            }
            Action::LaunchTask(kind) => {
                let ticket = self.tasks.launch(kind, self.epoch);
                self.telemetry
                    .record_handle(TelemetryEventKind::TaskLaunched(kind), ticket.epoch());
            }
            Action::ReleaseTask => {
                self.tasks.release();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strobe::StrobePattern;

    #[test]
    fn starts_off_with_defaults() {
        let controller = ModeController::new(NoopLightOutput);
        assert_eq!(controller.state(), ModeState::Off);
        assert_eq!(controller.context(), Context::default());
        assert_eq!(controller.epoch(), 1);
        assert!(controller.armed_display().is_none());
        assert!(controller.outstanding_task().is_none());
    }

    #[test]
    fn unmatched_gesture_bumps_nothing() {
        let mut controller = ModeController::new(NoopLightOutput);
        let before = controller.snapshot();

        assert!(controller.dispatch(Gesture::hold(7)).is_ignored());
        assert_eq!(controller.snapshot(), before);
    }

    #[test]
    fn self_transition_reenters_the_state() {
        let mut controller = ModeController::new(NoopLightOutput);
        controller.dispatch(Gesture::click(1));
        let epoch = controller.epoch();

        let outcome = controller.dispatch(Gesture::hold(1));
        assert_eq!(
            outcome,
            DispatchOutcome::Transitioned {
                from: ModeState::On,
                to: ModeState::On,
            }
        );
        assert_eq!(controller.epoch(), epoch + 1);
    }

    #[test]
    fn strobe_entry_settles_into_a_pattern() {
        let mut controller = ModeController::new(NoopLightOutput);
        controller.dispatch(Gesture::hold(10));

        let outcome = controller.dispatch(Gesture::hold(3));
        assert_eq!(
            outcome,
            DispatchOutcome::Transitioned {
                from: ModeState::Off,
                to: ModeState::Strobe(StrobePattern::Candle),
            }
        );
    }
}
