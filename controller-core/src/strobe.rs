//! Strobe pattern ring.
//!
//! Patterns advance in a fixed cyclic order. The controller remembers the last
//! pattern entered so that re-entering strobe mode resumes where the user left
//! off instead of restarting at [`StrobePattern::Candle`].

use core::fmt;

/// Total number of strobe patterns in the ring.
pub const STROBE_PATTERN_COUNT: usize = 5;

/// Identifier for each pattern state in the strobe ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StrobePattern {
    Candle,
    BikeFlash,
    PartyStrobe,
    TacticalStrobe,
    LightningStorm,
}

/// Ring order, first to last.
pub const ALL_PATTERNS: [StrobePattern; STROBE_PATTERN_COUNT] = [
    StrobePattern::Candle,
    StrobePattern::BikeFlash,
    StrobePattern::PartyStrobe,
    StrobePattern::TacticalStrobe,
    StrobePattern::LightningStorm,
];

impl StrobePattern {
    /// Position within [`ALL_PATTERNS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            StrobePattern::Candle => 0,
            StrobePattern::BikeFlash => 1,
            StrobePattern::PartyStrobe => 2,
            StrobePattern::TacticalStrobe => 3,
            StrobePattern::LightningStorm => 4,
        }
    }

    /// Attempts to construct a pattern from a raw ring index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < STROBE_PATTERN_COUNT {
            Some(ALL_PATTERNS[index])
        } else {
            None
        }
    }

    /// Next pattern in the ring, wrapping after the last.
    #[must_use]
    pub const fn next(self) -> Self {
        ALL_PATTERNS[(self.as_index() + 1) % STROBE_PATTERN_COUNT]
    }

    /// Kebab-case label used in logs and the console.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StrobePattern::Candle => "candle",
            StrobePattern::BikeFlash => "bike-flash",
            StrobePattern::PartyStrobe => "party-strobe",
            StrobePattern::TacticalStrobe => "tactical-strobe",
            StrobePattern::LightningStorm => "lightning-storm",
        }
    }
}

impl fmt::Display for StrobePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
