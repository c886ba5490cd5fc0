//! Deadline bookkeeping for periodic display ticks and simulated task latency.
//!
//! The controller itself has no clock. [`DeadlineTracker`] watches the live
//! display handle and outstanding task ticket, turns them into deadlines on
//! whatever instant type the caller uses, and delivers the due signals back
//! through [`ModeController::display_tick`] and
//! [`ModeController::complete_task`]. Hosts with a virtual clock call
//! [`DeadlineTracker::poll`] after advancing time; firmware sleeps until
//! [`DeadlineTracker::next_deadline`].

use core::ops::Add;
use core::time::Duration;

use crate::controller::{LightOutput, ModeController};
use crate::display::TimerHandle;
use crate::supervisor::TaskTicket;

/// Upper bound on signals delivered by a single [`DeadlineTracker::poll`].
/// Display ticks still owed past this bound are skipped, not replayed.
pub const MAX_SIGNALS_PER_POLL: usize = 1_024;

/// Who resolves launched tasks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskTiming {
    /// The tracker completes tasks after their configured latency.
    Simulated,
    /// Completions are delivered by the caller, typically from a future.
    External,
}

/// Signals delivered by one poll.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PollSummary {
    /// Ticks that rendered a line.
    pub ticks: u32,
    /// Task completions delivered.
    pub completions: u32,
}

impl PollSummary {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.ticks == 0 && self.completions == 0
    }
}

#[derive(Copy, Clone, Debug)]
struct Scheduled<K, TInstant> {
    key: K,
    due: TInstant,
}

/// Sans-IO deadline tracker, generic over the caller's instant type.
#[derive(Clone, Debug)]
pub struct DeadlineTracker<TInstant>
where
    TInstant: Copy + Ord + Add<Duration, Output = TInstant>,
{
    task_timing: TaskTiming,
    display: Option<Scheduled<TimerHandle, TInstant>>,
    interval: Duration,
    task: Option<Scheduled<TaskTicket, TInstant>>,
}

enum Due {
    Tick(TimerHandle),
    Completion(TaskTicket),
}

impl<TInstant> DeadlineTracker<TInstant>
where
    TInstant: Copy + Ord + Add<Duration, Output = TInstant>,
{
    #[must_use]
    pub const fn new(task_timing: TaskTiming) -> Self {
        Self {
            task_timing,
            display: None,
            interval: Duration::ZERO,
            task: None,
        }
    }

    #[must_use]
    pub const fn task_timing(&self) -> TaskTiming {
        self.task_timing
    }

    /// Aligns the tracked deadlines with the controller's live resources.
    ///
    /// A newly armed display first ticks one interval after `now`; a newly
    /// launched task (simulated timing only) completes after its latency.
    pub fn sync<O: LightOutput>(&mut self, controller: &ModeController<O>, now: TInstant) {
        self.display = match (controller.armed_display(), self.display) {
            (Some(armed), Some(scheduled)) if scheduled.key == armed.handle => Some(scheduled),
            (Some(armed), _) => {
                self.interval = armed.interval;
                Some(Scheduled {
                    key: armed.handle,
                    due: now + armed.interval,
                })
            }
            (None, _) => None,
        };

        self.task = match (self.task_timing, controller.outstanding_task(), self.task) {
            (TaskTiming::External, _, _) | (_, None, _) => None,
            (TaskTiming::Simulated, Some(ticket), Some(scheduled)) if scheduled.key == ticket => {
                Some(scheduled)
            }
            (TaskTiming::Simulated, Some(ticket), _) => Some(Scheduled {
                key: ticket,
                due: now + controller.config().task_latency(ticket.kind()),
            }),
        };
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<TInstant> {
        let display = self.display.map(|scheduled| scheduled.due);
        let task = self.task.map(|scheduled| scheduled.due);
        match (display, task) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Handle of the display the tracker is ticking, if any.
    #[must_use]
    pub fn tracked_display(&self) -> Option<TimerHandle> {
        self.display.map(|scheduled| scheduled.key)
    }

    /// Delivers every signal due at or before `now`, in deadline order.
    ///
    /// Each delivered signal may change the controller's resources, so the
    /// tracker re-syncs at the signal's own deadline before looking for the
    /// next one. If the poll hits [`MAX_SIGNALS_PER_POLL`], the display
    /// resumes at its first interval boundary after `now`.
    pub fn poll<O: LightOutput>(
        &mut self,
        controller: &mut ModeController<O>,
        now: TInstant,
    ) -> PollSummary {
        self.sync(controller, now);

        let mut summary = PollSummary::default();
        for _ in 0..MAX_SIGNALS_PER_POLL {
            let Some((due, signal)) = self.take_due(now) else {
                break;
            };
            match signal {
                Due::Tick(handle) => {
                    if controller.display_tick(handle) {
                        summary.ticks += 1;
                    }
                }
                Due::Completion(ticket) => {
                    controller.complete_task(ticket);
                    summary.completions += 1;
                }
            }
            self.sync(controller, due);
        }
        self.skip_missed_ticks(now);
        summary
    }

    /// Moves an overdue display deadline to the first `due + k * interval`
    /// later than `now`.
    fn skip_missed_ticks(&mut self, now: TInstant) {
        let Some(scheduled) = self.display.as_mut() else {
            return;
        };
        if self.interval.is_zero() {
            return;
        }

        // Gallop in doubling strides so a long gap costs O(log^2) additions.
        while scheduled.due <= now {
            let mut stride = self.interval;
            loop {
                match stride.checked_mul(2) {
                    Some(doubled) if scheduled.due + doubled <= now => stride = doubled,
                    _ => break,
                }
            }
            let next = scheduled.due + stride;
            if next <= scheduled.due {
                // Saturated instant type.
                break;
            }
            scheduled.due = next;
        }
    }

    fn take_due(&mut self, now: TInstant) -> Option<(TInstant, Due)> {
        let display_due = self.display.filter(|scheduled| scheduled.due <= now);
        let task_due = self.task.filter(|scheduled| scheduled.due <= now);

        match (display_due, task_due) {
            (Some(tick), Some(task)) if task.due < tick.due => {
                self.task = None;
                Some((task.due, Due::Completion(task.key)))
            }
            (Some(tick), _) => {
                self.display = Some(Scheduled {
                    key: tick.key,
                    due: tick.due + self.interval,
                });
                Some((tick.due, Due::Tick(tick.key)))
            }
            (None, Some(task)) => {
                self.task = None;
                Some((task.due, Due::Completion(task.key)))
            }
            (None, None) => None,
        }
    }
}
