//! Controller task plumbing.
//!
//! The button task pushes decoded gestures into [`GestureQueue`]. The
//! controller task owns the [`ModeController`] and waits on whichever comes
//! first: the next gesture or the tracker's next display deadline. While a
//! maintenance operation runs, gestures pile up in the queue; they are
//! delivered (and refused by the invoke state) before the completion, so
//! every gesture is still consumed exactly once.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use controller_core::controller::{DispatchOutcome, LightOutput, ModeController};
use controller_core::gesture::Gesture;
use controller_core::supervisor::{Completion, MaintenanceOps, perform};
use controller_core::timing::{DeadlineTracker, PollSummary, TaskTiming};
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::instant::FirmwareInstant;
use crate::telemetry::{TelemetryForwarder, log_gesture, log_task_finished, log_task_started};

/// Depth of the queue between the button task and the controller task.
pub const GESTURE_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type GestureMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type GestureMutex = NoopRawMutex;

pub type GestureQueue = Channel<GestureMutex, Gesture, GESTURE_QUEUE_DEPTH>;
pub type GestureSender<'a> = Sender<'a, GestureMutex, Gesture, GESTURE_QUEUE_DEPTH>;
pub type GestureReceiver<'a> = Receiver<'a, GestureMutex, Gesture, GESTURE_QUEUE_DEPTH>;

/// Owns the controller and everything that feeds it signals.
pub struct ControllerRunner<O: LightOutput, M> {
    controller: ModeController<O>,
    tracker: DeadlineTracker<FirmwareInstant>,
    ops: M,
    forwarder: TelemetryForwarder,
}

impl<O: LightOutput, M: MaintenanceOps> ControllerRunner<O, M> {
    pub fn new(controller: ModeController<O>, ops: M, now: FirmwareInstant) -> Self {
        let mut runner = Self {
            controller,
            tracker: DeadlineTracker::new(TaskTiming::External),
            ops,
            forwarder: TelemetryForwarder::new(),
        };
        runner.settle(now);
        runner
    }

    pub fn controller(&self) -> &ModeController<O> {
        &self.controller
    }

    pub fn ops(&self) -> &M {
        &self.ops
    }

    /// Earliest display deadline, if a diagnostic readout is armed.
    pub fn next_deadline(&self) -> Option<FirmwareInstant> {
        self.tracker.next_deadline()
    }

    pub fn handle_gesture(&mut self, gesture: Gesture, now: FirmwareInstant) -> DispatchOutcome {
        let outcome = self.controller.dispatch(gesture);
        log_gesture(gesture, outcome);
        self.settle(now);
        outcome
    }

    pub fn handle_deadline(&mut self, now: FirmwareInstant) -> PollSummary {
        let summary = self.tracker.poll(&mut self.controller, now);
        self.forwarder.forward(self.controller.telemetry());
        summary
    }

    /// Runs the outstanding maintenance operation, if any.
    pub async fn run_task(&mut self) -> Option<Completion> {
        let ticket = self.controller.outstanding_task()?;
        log_task_started(ticket.kind());
        Some(perform(&mut self.ops, ticket).await)
    }

    /// Delivers gestures that queued up during an operation, then its
    /// completion. Returns the completion's dispatch outcome.
    pub fn complete(
        &mut self,
        completion: Completion,
        queued: impl IntoIterator<Item = Gesture>,
        now: FirmwareInstant,
    ) -> DispatchOutcome {
        let dropped = queued
            .into_iter()
            .filter(|gesture| self.handle_gesture(*gesture, now).is_ignored())
            .count();

        let outcome = self.controller.complete_task(completion.ticket);
        log_task_finished(completion.ticket.kind(), dropped);
        self.settle(now);
        outcome
    }

    /// Serves gestures, display deadlines and maintenance operations forever.
    #[cfg(target_os = "none")]
    pub async fn run(mut self, gestures: GestureReceiver<'_>) -> ! {
        use embassy_futures::select::{Either, select};
        use embassy_time::Timer;

        loop {
            if let Some(completion) = self.run_task().await {
                let queued = core::iter::from_fn(|| gestures.try_receive().ok());
                self.complete(completion, queued, FirmwareInstant::now());
                continue;
            }

            let event = match self.next_deadline() {
                Some(deadline) => {
                    select(gestures.receive(), Timer::at(deadline.into_embassy())).await
                }
                None => Either::First(gestures.receive().await),
            };

            let now = FirmwareInstant::now();
            match event {
                Either::First(gesture) => {
                    self.handle_gesture(gesture, now);
                }
                Either::Second(()) => {
                    self.handle_deadline(now);
                }
            }
        }
    }

    fn settle(&mut self, now: FirmwareInstant) {
        self.tracker.sync(&self.controller, now);
        self.forwarder.forward(self.controller.telemetry());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::controller::NoopLightOutput;
    use controller_core::states::ModeState;
    use embassy_time::Instant;

    #[derive(Default)]
    struct CountingOps {
        resets: u32,
        readouts: u32,
    }

    impl MaintenanceOps for CountingOps {
        async fn factory_reset(&mut self) {
            self.resets += 1;
        }

        async fn version_readout(&mut self) {
            self.readouts += 1;
        }
    }

    fn at(millis: u64) -> FirmwareInstant {
        FirmwareInstant::from(Instant::from_millis(millis))
    }

    fn runner() -> ControllerRunner<NoopLightOutput, CountingOps> {
        ControllerRunner::new(
            ModeController::new(NoopLightOutput),
            CountingOps::default(),
            at(0),
        )
    }

    #[test]
    fn armed_display_becomes_the_next_deadline() {
        let mut runner = runner();
        runner.handle_gesture(Gesture::hold(10), at(0));
        assert_eq!(runner.next_deadline(), None);

        runner.handle_gesture(Gesture::click(3), at(100));
        assert_eq!(runner.next_deadline(), Some(at(1_100)));

        let summary = runner.handle_deadline(at(1_100));
        assert_eq!(summary.ticks, 1);
        assert_eq!(runner.next_deadline(), Some(at(2_100)));

        runner.handle_gesture(Gesture::click(1), at(1_500));
        assert_eq!(runner.next_deadline(), None);
    }

    #[test]
    fn gestures_queued_during_a_reset_are_dropped() {
        let mut runner = runner();
        runner.handle_gesture(Gesture::hold(13), at(0));
        assert_eq!(runner.controller().state(), ModeState::FactoryReset);

        let completion = embassy_futures::block_on(runner.run_task()).expect("reset outstanding");
        let outcome = runner.complete(
            completion,
            [Gesture::click(1), Gesture::hold(1)],
            at(3_000),
        );

        assert_eq!(
            outcome,
            DispatchOutcome::Transitioned {
                from: ModeState::FactoryReset,
                to: ModeState::Off,
            }
        );
        assert_eq!(runner.ops().resets, 1);
        assert!(runner.controller().outstanding_task().is_none());
    }

    #[test]
    fn idle_runner_has_no_task_to_run() {
        let mut runner = runner();
        assert!(embassy_futures::block_on(runner.run_task()).is_none());
    }
}
