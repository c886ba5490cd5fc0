use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{OutputType, Pull};
use embassy_stm32::time::khz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};

use controller_core::config::ControllerConfig;
use controller_core::controller::ModeController;
use controller_core::table;

use crate::button::{GestureDecoder, GestureTiming};
use crate::hw::maintenance::BoardMaintenance;
use crate::hw::{ExtiButton, PwmChannel};
use crate::instant::FirmwareInstant;
use crate::light::PwmLight;
use crate::runner::{ControllerRunner, GestureQueue};

mod button_task;
mod controller_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static GESTURE_QUEUE: GestureQueue = GestureQueue::new();

/// PWM carrier for the emitter, above the audible range.
const PWM_FREQUENCY_KHZ: u32 = 25;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    if let Err(error) = table::validate() {
        defmt::panic!("transition table: {}", defmt::Display2Format(&error));
    }

    let config = hal::Config::default();
    let hal::Peripherals {
        PA0, PA6, EXTI0, TIM3, ..
    } = hal::init(config);

    let led_pin = PwmPin::new(PA6, OutputType::PushPull);
    let pwm = SimplePwm::new(
        TIM3,
        Some(led_pin),
        None,
        None,
        None,
        khz(PWM_FREQUENCY_KHZ),
        CountingMode::EdgeAlignedUp,
    );
    let light = PwmLight::new(PwmChannel::new(pwm.split().ch1));

    let controller_config = ControllerConfig::default();
    let controller = ModeController::with_config(light, controller_config);
    let runner = ControllerRunner::new(
        controller,
        BoardMaintenance::new(controller_config),
        FirmwareInstant::now(),
    );

    let button = ExtiButton::new(ExtiInput::new(PA0, EXTI0, Pull::Up));
    let decoder = GestureDecoder::new(GestureTiming::default());

    spawner
        .spawn(controller_task::run(runner))
        .expect("failed to spawn controller task");

    spawner
        .spawn(button_task::run(button, decoder))
        .expect("failed to spawn button task");

    core::future::pending::<()>().await;
}
