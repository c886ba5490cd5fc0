//! Gesture decoder for the single momentary button.
//!
//! [`GestureDecoder`] is a sans-IO state machine fed with debounced edges and
//! timeouts. A press that stays down past `hold_threshold` turns the gesture
//! into a hold, reported when the button is released. A release followed by
//! `click_window` of silence closes a click gesture. [`next_gesture`] drives
//! the decoder from an async [`ButtonInput`].

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use controller_core::gesture::Gesture;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, Timer};

/// Press duration that turns the final press into a hold.
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_millis(400);
/// Idle time after a release that closes a click gesture.
pub const DEFAULT_CLICK_WINDOW: Duration = Duration::from_millis(300);

/// Timing parameters for gesture decoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GestureTiming {
    pub hold_threshold: Duration,
    pub click_window: Duration,
}

impl GestureTiming {
    pub const fn new(hold_threshold: Duration, click_window: Duration) -> Self {
        Self {
            hold_threshold,
            click_window,
        }
    }
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_THRESHOLD, DEFAULT_CLICK_WINDOW)
    }
}

/// Debounced level change reported by the button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Async source of debounced button edges.
#[allow(async_fn_in_trait)]
pub trait ButtonInput {
    async fn wait_for_press(&mut self);

    async fn wait_for_release(&mut self);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Down { since: Instant },
    Holding,
    Up { since: Instant },
}

/// Turns edges and timeouts into completed gestures.
#[derive(Clone, Debug)]
pub struct GestureDecoder {
    timing: GestureTiming,
    clicks: u8,
    phase: Phase,
}

impl GestureDecoder {
    pub const fn new(timing: GestureTiming) -> Self {
        Self {
            timing,
            clicks: 0,
            phase: Phase::Idle,
        }
    }

    pub const fn timing(&self) -> GestureTiming {
        self.timing
    }

    /// Whether the decoder believes the button is currently held down.
    pub const fn is_down(&self) -> bool {
        matches!(self.phase, Phase::Down { .. } | Phase::Holding)
    }

    /// Instant at which [`GestureDecoder::on_timeout`] must be called.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Down { since } => Some(since + self.timing.hold_threshold),
            Phase::Up { since } => Some(since + self.timing.click_window),
            Phase::Idle | Phase::Holding => None,
        }
    }

    /// Feeds one edge. Edges that do not match the tracked level are dropped.
    pub fn on_edge(&mut self, edge: ButtonEdge, now: Instant) -> Option<Gesture> {
        match (self.phase, edge) {
            (Phase::Idle, ButtonEdge::Pressed) => {
                self.clicks = 1;
                self.phase = Phase::Down { since: now };
                None
            }
            (Phase::Up { .. }, ButtonEdge::Pressed) => {
                self.clicks = self.clicks.saturating_add(1);
                self.phase = Phase::Down { since: now };
                None
            }
            (Phase::Down { .. }, ButtonEdge::Released) => {
                self.phase = Phase::Up { since: now };
                None
            }
            (Phase::Holding, ButtonEdge::Released) => Some(self.finish(Gesture::hold(self.clicks))),
            _ => None,
        }
    }

    /// Advances timing. Returns a click gesture once the click window lapses.
    pub fn on_timeout(&mut self, now: Instant) -> Option<Gesture> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        match self.phase {
            Phase::Down { .. } => {
                self.phase = Phase::Holding;
                None
            }
            Phase::Up { .. } => Some(self.finish(Gesture::click(self.clicks))),
            Phase::Idle | Phase::Holding => None,
        }
    }

    fn finish(&mut self, gesture: Gesture) -> Gesture {
        self.clicks = 0;
        self.phase = Phase::Idle;
        gesture
    }
}

/// Waits for the next completed gesture on `button`.
pub async fn next_gesture<B: ButtonInput>(button: &mut B, decoder: &mut GestureDecoder) -> Gesture {
    loop {
        let down = decoder.is_down();
        let edge = async {
            if down {
                button.wait_for_release().await;
                ButtonEdge::Released
            } else {
                button.wait_for_press().await;
                ButtonEdge::Pressed
            }
        };

        let gesture = match decoder.deadline() {
            Some(deadline) => match select(edge, Timer::at(deadline)).await {
                Either::First(edge) => decoder.on_edge(edge, Instant::now()),
                Either::Second(()) => decoder.on_timeout(Instant::now()),
            },
            None => {
                let edge = edge.await;
                decoder.on_edge(edge, Instant::now())
            }
        };

        if let Some(gesture) = gesture {
            return gesture;
        }
    }
}
