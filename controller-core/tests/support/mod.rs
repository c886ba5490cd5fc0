#![allow(dead_code)]

use core::ops::Add;
use core::time::Duration;

use controller_core::context::Brightness;
use controller_core::controller::{LightOutput, LightPower, ModeController};
use controller_core::gesture::Gesture;

/// Output call captured by [`RecordingOutput`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputCall {
    Brightness(u8),
    Power(LightPower),
    Line(String),
}

/// Light output that keeps every call for later inspection.
#[derive(Default)]
pub struct RecordingOutput {
    pub calls: Vec<OutputCall>,
}

impl RecordingOutput {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|call| match call {
            OutputCall::Line(line) => Some(line.as_str()),
            _ => None,
        })
    }

    pub fn last_power(&self) -> Option<LightPower> {
        self.calls.iter().rev().find_map(|call| match call {
            OutputCall::Power(power) => Some(*power),
            _ => None,
        })
    }
}

impl LightOutput for RecordingOutput {
    fn render_brightness(&mut self, level: Brightness) {
        self.calls.push(OutputCall::Brightness(level.percent()));
    }

    fn set_light_power(&mut self, power: LightPower) {
        self.calls.push(OutputCall::Power(power));
    }

    fn render_diagnostic_line(&mut self, line: &str) {
        self.calls.push(OutputCall::Line(line.to_owned()));
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MillisInstant(pub u64);

impl Add<Duration> for MillisInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_millis() as u64)
    }
}

pub fn controller() -> ModeController<RecordingOutput> {
    ModeController::new(RecordingOutput::default())
}

/// Controller in `Off` with the advanced UI unlocked.
pub fn advanced_controller() -> ModeController<RecordingOutput> {
    let mut controller = controller();
    controller.dispatch(Gesture::hold(10));
    controller
}

/// Deterministic xorshift generator for gesture sequences.
pub struct GestureSource(u32);

impl GestureSource {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Draws from 1-5 clicks and the table's long gestures (10, 13 and 15),
    /// either posture.
    pub fn next_gesture(&mut self) -> Gesture {
        const CLICKS: [u8; 10] = [1, 1, 2, 2, 3, 4, 5, 10, 13, 15];
        let value = self.next_u32();
        let clicks = CLICKS[(value % CLICKS.len() as u32) as usize];
        if value & 0x100 == 0 {
            Gesture::click(clicks)
        } else {
            Gesture::hold(clicks)
        }
    }
}
