//! Mutable operating context owned by the mode controller.
//!
//! Everything here is plain data. Mutations are total functions that keep
//! the brightness inside `[MIN, MAX]`, so guards can take a [`Context`] by
//! value and never observe an out-of-range level.

use core::fmt;

use crate::strobe::StrobePattern;

/// Lowest brightness the ramp can reach.
pub const BRIGHTNESS_MIN: u8 = 10;
/// Highest brightness the ramp can reach.
pub const BRIGHTNESS_MAX: u8 = 100;
/// Brightness at power-up and after a factory reset.
pub const BRIGHTNESS_DEFAULT: u8 = 50;

/// Output level in percent, clamped to `[BRIGHTNESS_MIN, BRIGHTNESS_MAX]`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Self = Self(BRIGHTNESS_MIN);
    pub const MAX: Self = Self(BRIGHTNESS_MAX);
    pub const DEFAULT: Self = Self(BRIGHTNESS_DEFAULT);

    /// Clamps `percent` into the valid ramp.
    #[must_use]
    pub const fn new(percent: u8) -> Self {
        if percent < BRIGHTNESS_MIN {
            Self::MIN
        } else if percent > BRIGHTNESS_MAX {
            Self::MAX
        } else {
            Self(percent)
        }
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// One step brighter, saturating at [`Brightness::MAX`].
    #[must_use]
    pub const fn increased(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One step dimmer, saturating at [`Brightness::MIN`].
    #[must_use]
    pub const fn decreased(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// UI complexity level gating the advanced gestures.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum UiMode {
    #[default]
    Simple,
    Advanced,
}

impl UiMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            UiMode::Simple => "simple",
            UiMode::Advanced => "advanced",
        }
    }
}

/// Snapshot of the operating context.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Context {
    pub brightness: Brightness,
    pub ui: UiMode,
    pub last_strobe: StrobePattern,
}

impl Context {
    /// Power-up defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            brightness: Brightness::DEFAULT,
            ui: UiMode::Simple,
            last_strobe: StrobePattern::Candle,
        }
    }

    pub fn increase_brightness(&mut self) {
        self.brightness = self.brightness.increased();
    }

    pub fn decrease_brightness(&mut self) {
        self.brightness = self.brightness.decreased();
    }

    pub fn set_brightness(&mut self, level: Brightness) {
        self.brightness = level;
    }

    pub fn set_ui(&mut self, ui: UiMode) {
        self.ui = ui;
    }

    pub fn record_strobe(&mut self, pattern: StrobePattern) {
        self.last_strobe = pattern;
    }

    /// Restores every field to its power-up value.
    pub fn restore_defaults(&mut self) {
        *self = Self::new();
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
