//! Completed button interactions as seen by the mode controller.
//!
//! The decoder that turns raw edges into gestures lives with the hardware;
//! this module only defines the value type and its short `3H` / `10C`
//! notation used by the console and transcripts.

use core::fmt;
use core::str::FromStr;

/// How the final press of a gesture ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Posture {
    /// The final click was a plain release.
    Release,
    /// The button stayed down past the hold threshold after the final click.
    Hold,
}

impl Posture {
    /// Suffix used in the short gesture notation.
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Posture::Release => 'C',
            Posture::Hold => 'H',
        }
    }
}

/// One completed button interaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Gesture {
    clicks: u8,
    posture: Posture,
}

impl Gesture {
    /// Builds a gesture, clamping the click count to at least one.
    #[must_use]
    pub const fn new(clicks: u8, posture: Posture) -> Self {
        let clicks = if clicks == 0 { 1 } else { clicks };
        Self { clicks, posture }
    }

    /// `clicks` presses, the last one released normally.
    #[must_use]
    pub const fn click(clicks: u8) -> Self {
        Self::new(clicks, Posture::Release)
    }

    /// `clicks` presses, the last one held.
    #[must_use]
    pub const fn hold(clicks: u8) -> Self {
        Self::new(clicks, Posture::Hold)
    }

    #[must_use]
    pub const fn clicks(self) -> u8 {
        self.clicks
    }

    #[must_use]
    pub const fn posture(self) -> Posture {
        self.posture
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.clicks, self.posture.suffix())
    }
}

/// Failure parsing the short gesture notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GestureParseError {
    /// Input was empty or missing the posture suffix.
    MissingPosture,
    /// Suffix was neither `C` nor `H`.
    UnknownPosture(char),
    /// Click count was absent, zero, or did not fit in a `u8`.
    InvalidClicks,
}

impl fmt::Display for GestureParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureParseError::MissingPosture => f.write_str("gesture is missing a C/H suffix"),
            GestureParseError::UnknownPosture(suffix) => {
                write!(f, "unknown gesture suffix `{suffix}`")
            }
            GestureParseError::InvalidClicks => f.write_str("click count must be 1-255"),
        }
    }
}

impl FromStr for Gesture {
    type Err = GestureParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let suffix = text.chars().last().ok_or(GestureParseError::MissingPosture)?;
        let posture = match suffix {
            'C' | 'c' => Posture::Release,
            'H' | 'h' => Posture::Hold,
            other if other.is_ascii_digit() => return Err(GestureParseError::MissingPosture),
            other => return Err(GestureParseError::UnknownPosture(other)),
        };

        let digits = &text[..text.len() - suffix.len_utf8()];
        let clicks = digits
            .parse::<u8>()
            .map_err(|_| GestureParseError::InvalidClicks)?;
        if clicks == 0 {
            return Err(GestureParseError::InvalidClicks);
        }

        Ok(Gesture::new(clicks, posture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_notation() {
        assert_eq!("3H".parse::<Gesture>(), Ok(Gesture::hold(3)));
        assert_eq!("10c".parse::<Gesture>(), Ok(Gesture::click(10)));
        assert_eq!("13H".parse::<Gesture>(), Ok(Gesture::hold(13)));
    }

    #[test]
    fn rejects_malformed_gestures() {
        assert_eq!(
            "".parse::<Gesture>(),
            Err(GestureParseError::MissingPosture)
        );
        assert_eq!(
            "12".parse::<Gesture>(),
            Err(GestureParseError::MissingPosture)
        );
        assert_eq!(
            "3X".parse::<Gesture>(),
            Err(GestureParseError::UnknownPosture('X'))
        );
        assert_eq!(
            "0C".parse::<Gesture>(),
            Err(GestureParseError::InvalidClicks)
        );
        assert_eq!(
            "H".parse::<Gesture>(),
            Err(GestureParseError::InvalidClicks)
        );
    }

    #[test]
    fn zero_clicks_is_clamped() {
        assert_eq!(Gesture::new(0, Posture::Hold).clicks(), 1);
    }
}
