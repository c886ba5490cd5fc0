use embassy_stm32::peripherals::TIM3;

use super::GESTURE_QUEUE;
use crate::hw::PwmChannel;
use crate::hw::maintenance::BoardMaintenance;
use crate::light::PwmLight;
use crate::runner::ControllerRunner;

pub type BoardRunner = ControllerRunner<PwmLight<PwmChannel<'static, TIM3>>, BoardMaintenance>;

#[embassy_executor::task]
pub async fn run(runner: BoardRunner) -> ! {
    runner.run(GESTURE_QUEUE.receiver()).await
}
