//! Board bindings for the STM32G0 flashlight driver.
//!
//! The emitter is driven from TIM3 channel 1 through a low-side FET; the
//! button is an active-low switch to ground with the internal pull-up enabled.

#![cfg(target_os = "none")]

pub mod maintenance;

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::timer::GeneralInstance4Channel;
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;
use embassy_time::{Duration, Timer};

use crate::button::ButtonInput;
use crate::light::DutyOutput;

/// Settling time applied after every button edge.
const DEBOUNCE: Duration = Duration::from_millis(20);

/// One enabled PWM channel.
pub struct PwmChannel<'d, T: GeneralInstance4Channel> {
    channel: SimplePwmChannel<'d, T>,
}

impl<'d, T: GeneralInstance4Channel> PwmChannel<'d, T> {
    pub fn new(mut channel: SimplePwmChannel<'d, T>) -> Self {
        channel.set_duty_cycle_fully_off();
        channel.enable();
        Self { channel }
    }
}

impl<T: GeneralInstance4Channel> DutyOutput for PwmChannel<'_, T> {
    fn max_duty(&self) -> u16 {
        self.channel.max_duty_cycle()
    }

    fn set_duty(&mut self, duty: u16) {
        self.channel.set_duty_cycle(duty);
    }
}

/// Debounced EXTI button, pressed when low.
pub struct ExtiButton<'d> {
    input: ExtiInput<'d>,
}

impl<'d> ExtiButton<'d> {
    pub fn new(input: ExtiInput<'d>) -> Self {
        Self { input }
    }
}

impl ButtonInput for ExtiButton<'_> {
    async fn wait_for_press(&mut self) {
        loop {
            self.input.wait_for_falling_edge().await;
            Timer::after(DEBOUNCE).await;
            if self.input.is_low() {
                return;
            }
        }
    }

    async fn wait_for_release(&mut self) {
        loop {
            self.input.wait_for_rising_edge().await;
            Timer::after(DEBOUNCE).await;
            if self.input.is_high() {
                return;
            }
        }
    }
}
