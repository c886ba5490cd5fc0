//! Supervisor for long-running maintenance operations.
//!
//! Invoke states launch exactly one operation on entry. The supervisor hands
//! out a [`TaskTicket`] stamped with the entry epoch and resolves it at most
//! once; a completion that arrives for a ticket that is no longer outstanding
//! is reported as stale and has no effect.

use core::fmt;

use crate::states::Epoch;

/// Long-running operations the controller can launch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TaskKind {
    FactoryReset,
    VersionReadout,
}

impl TaskKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TaskKind::FactoryReset => "factory-reset",
            TaskKind::VersionReadout => "version-readout",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one launched operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskTicket {
    epoch: Epoch,
    kind: TaskKind,
}

impl TaskTicket {
    #[must_use]
    pub const fn new(epoch: Epoch, kind: TaskKind) -> Self {
        Self { epoch, kind }
    }

    #[must_use]
    pub const fn epoch(self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub const fn kind(self) -> TaskKind {
        self.kind
    }
}

/// Signal produced when a launched operation resolves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Completion {
    pub ticket: TaskTicket,
}

/// Platform hooks for the long-latency operations.
///
/// Implementations only need to resolve eventually; the controller keeps
/// every gesture out while the operation is in flight.
#[allow(async_fn_in_trait)]
pub trait MaintenanceOps {
    /// Restores the device to factory settings.
    async fn factory_reset(&mut self);

    /// Presents the firmware version to the user.
    async fn version_readout(&mut self);
}

/// Runs the operation behind `ticket` and yields its completion signal.
pub async fn perform<M>(ops: &mut M, ticket: TaskTicket) -> Completion
where
    M: MaintenanceOps + ?Sized,
{
    match ticket.kind() {
        TaskKind::FactoryReset => ops.factory_reset().await,
        TaskKind::VersionReadout => ops.version_readout().await,
    }
    Completion { ticket }
}

/// Owner of the single outstanding maintenance operation.
#[derive(Clone, Debug, Default)]
pub struct TaskSupervisor {
    outstanding: Option<TaskTicket>,
    launched: u32,
    completed: u32,
}

impl TaskSupervisor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outstanding: None,
            launched: 0,
            completed: 0,
        }
    }

    /// Registers a new outstanding operation and returns its ticket.
    ///
    /// A previous ticket that was never resolved is abandoned; its late
    /// completion will be rejected by [`TaskSupervisor::resolve`].
    pub fn launch(&mut self, kind: TaskKind, epoch: Epoch) -> TaskTicket {
        let ticket = TaskTicket::new(epoch, kind);
        self.outstanding = Some(ticket);
        self.launched = self.launched.wrapping_add(1);
        ticket
    }

    /// Resolves `ticket` exactly once. Returns `None` for stale tickets and
    /// for tickets that already completed.
    pub fn resolve(&mut self, ticket: TaskTicket) -> Option<TaskKind> {
        match self.outstanding {
            Some(current) if current == ticket => {
                self.outstanding = None;
                self.completed = self.completed.wrapping_add(1);
                Some(ticket.kind())
            }
            _ => None,
        }
    }

    /// Drops the outstanding ticket without completing it.
    pub fn release(&mut self) -> Option<TaskTicket> {
        self.outstanding.take()
    }

    #[must_use]
    pub const fn outstanding(&self) -> Option<TaskTicket> {
        self.outstanding
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    #[must_use]
    pub const fn launched_count(&self) -> u32 {
        self.launched
    }

    #[must_use]
    pub const fn completed_count(&self) -> u32 {
        self.completed
    }
}
