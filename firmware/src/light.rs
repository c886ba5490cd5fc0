//! PWM-backed light output.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use controller_core::context::Brightness;
use controller_core::controller::{LightOutput, LightPower};

use crate::telemetry::log_diagnostic_line;

/// Single PWM channel driving the emitter.
pub trait DutyOutput {
    fn max_duty(&self) -> u16;

    fn set_duty(&mut self, duty: u16);
}

/// Duty cycle for `level` on a channel whose full scale is `max_duty`.
pub fn duty_for(level: Brightness, max_duty: u16) -> u16 {
    let scaled = u32::from(max_duty) * u32::from(level.percent()) / 100;
    u16::try_from(scaled).unwrap_or(max_duty)
}

/// [`LightOutput`] that renders the brightness ramp onto a PWM channel.
pub struct PwmLight<D> {
    channel: D,
    power: LightPower,
    level: Brightness,
}

impl<D: DutyOutput> PwmLight<D> {
    pub fn new(mut channel: D) -> Self {
        channel.set_duty(0);
        Self {
            channel,
            power: LightPower::Off,
            level: Brightness::DEFAULT,
        }
    }

    pub fn channel(&self) -> &D {
        &self.channel
    }

    fn apply(&mut self) {
        let duty = match self.power {
            LightPower::On => duty_for(self.level, self.channel.max_duty()),
            LightPower::Off => 0,
        };
        self.channel.set_duty(duty);
    }
}

impl<D: DutyOutput> LightOutput for PwmLight<D> {
    fn render_brightness(&mut self, level: Brightness) {
        self.level = level;
        self.apply();
    }

    fn set_light_power(&mut self, power: LightPower) {
        self.power = power;
        self.apply();
    }

    fn render_diagnostic_line(&mut self, line: &str) {
        log_diagnostic_line(line);
    }
}
