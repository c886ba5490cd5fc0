//! Maintenance operations run from the invoke states.

use controller_core::config::ControllerConfig;
use controller_core::supervisor::{MaintenanceOps, TaskKind};
use embassy_time::Timer;

use crate::instant::core_duration_to_embassy;

/// Board implementation of the long-running operations.
///
/// Context is not persisted, so a factory reset only has to outlast its
/// configured latency; the controller restores defaults on completion.
pub struct BoardMaintenance {
    config: ControllerConfig,
}

impl BoardMaintenance {
    pub const fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    async fn wait_out(&self, kind: TaskKind) {
        Timer::after(core_duration_to_embassy(self.config.task_latency(kind))).await;
    }
}

impl MaintenanceOps for BoardMaintenance {
    async fn factory_reset(&mut self) {
        self.wait_out(TaskKind::FactoryReset).await;
    }

    async fn version_readout(&mut self) {
        defmt::info!("maintenance: firmware {}", env!("CARGO_PKG_VERSION"));
        self.wait_out(TaskKind::VersionReadout).await;
    }
}
