//! Device state set and the per-state entry/exit actions.

use core::fmt;

use crate::display::DiagnosticKind;
use crate::strobe::{ALL_PATTERNS, StrobePattern};
use crate::supervisor::TaskKind;
use crate::table::Action;

/// Generation counter bumped on every state entry.
pub type Epoch = u32;

/// Total number of states, strobe patterns included.
pub const STATE_COUNT: usize = 16;

/// Every state the controller can occupy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ModeState {
    Off,
    On,
    TintRamping,
    Lockout,
    FactoryReset,
    VersionCheck,
    BatteryCheck,
    TemperatureCheck,
    BeaconMode,
    SosMode,
    /// Pseudo-state that resolves to the last used strobe pattern.
    StrobeEntry,
    Strobe(StrobePattern),
}

/// All states in declaration order.
pub const ALL_STATES: [ModeState; STATE_COUNT] = [
    ModeState::Off,
    ModeState::On,
    ModeState::TintRamping,
    ModeState::Lockout,
    ModeState::FactoryReset,
    ModeState::VersionCheck,
    ModeState::BatteryCheck,
    ModeState::TemperatureCheck,
    ModeState::BeaconMode,
    ModeState::SosMode,
    ModeState::StrobeEntry,
    ModeState::Strobe(ALL_PATTERNS[0]),
    ModeState::Strobe(ALL_PATTERNS[1]),
    ModeState::Strobe(ALL_PATTERNS[2]),
    ModeState::Strobe(ALL_PATTERNS[3]),
    ModeState::Strobe(ALL_PATTERNS[4]),
];

const LIGHT_ON: &[Action] = &[Action::TurnLightOn];
const LIGHT_OFF: &[Action] = &[Action::TurnLightOff];
const LAUNCH_FACTORY_RESET: &[Action] = &[Action::LaunchTask(TaskKind::FactoryReset)];
const LAUNCH_VERSION_READOUT: &[Action] = &[Action::LaunchTask(TaskKind::VersionReadout)];
const ARM_BATTERY: &[Action] = &[Action::ArmDisplay(DiagnosticKind::Battery)];
const ARM_TEMPERATURE: &[Action] = &[Action::ArmDisplay(DiagnosticKind::Temperature)];
const ARM_BEACON: &[Action] = &[Action::ArmDisplay(DiagnosticKind::Beacon)];
const ARM_SOS: &[Action] = &[Action::ArmDisplay(DiagnosticKind::Sos)];
const DISARM: &[Action] = &[Action::DisarmDisplay];
const RELEASE: &[Action] = &[Action::ReleaseTask];
const RECORD_CANDLE: &[Action] = &[Action::RecordStrobe(StrobePattern::Candle)];
const RECORD_BIKE_FLASH: &[Action] = &[Action::RecordStrobe(StrobePattern::BikeFlash)];
const RECORD_PARTY_STROBE: &[Action] = &[Action::RecordStrobe(StrobePattern::PartyStrobe)];
const RECORD_TACTICAL_STROBE: &[Action] = &[Action::RecordStrobe(StrobePattern::TacticalStrobe)];
const RECORD_LIGHTNING_STORM: &[Action] = &[Action::RecordStrobe(StrobePattern::LightningStorm)];
const NONE: &[Action] = &[];

impl ModeState {
    /// Position within [`ALL_STATES`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            ModeState::Off => 0,
            ModeState::On => 1,
            ModeState::TintRamping => 2,
            ModeState::Lockout => 3,
            ModeState::FactoryReset => 4,
            ModeState::VersionCheck => 5,
            ModeState::BatteryCheck => 6,
            ModeState::TemperatureCheck => 7,
            ModeState::BeaconMode => 8,
            ModeState::SosMode => 9,
            ModeState::StrobeEntry => 10,
            ModeState::Strobe(pattern) => 11 + pattern.as_index(),
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < STATE_COUNT {
            Some(ALL_STATES[index])
        } else {
            None
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ModeState::Off => "off",
            ModeState::On => "on",
            ModeState::TintRamping => "tint-ramping",
            ModeState::Lockout => "lockout",
            ModeState::FactoryReset => "factory-reset",
            ModeState::VersionCheck => "version-check",
            ModeState::BatteryCheck => "battery-check",
            ModeState::TemperatureCheck => "temperature-check",
            ModeState::BeaconMode => "beacon",
            ModeState::SosMode => "sos",
            ModeState::StrobeEntry => "strobe-entry",
            ModeState::Strobe(pattern) => pattern.label(),
        }
    }

    /// Diagnostic readout owned by this state, if any.
    #[must_use]
    pub const fn diagnostic(self) -> Option<DiagnosticKind> {
        match self {
            ModeState::BatteryCheck => Some(DiagnosticKind::Battery),
            ModeState::TemperatureCheck => Some(DiagnosticKind::Temperature),
            ModeState::BeaconMode => Some(DiagnosticKind::Beacon),
            ModeState::SosMode => Some(DiagnosticKind::Sos),
            _ => None,
        }
    }

    /// Long-running operation invoked on entry, if any.
    #[must_use]
    pub const fn invoked_task(self) -> Option<TaskKind> {
        match self {
            ModeState::FactoryReset => Some(TaskKind::FactoryReset),
            ModeState::VersionCheck => Some(TaskKind::VersionReadout),
            _ => None,
        }
    }

    /// Actions run after the state becomes current.
    #[must_use]
    pub const fn entry_actions(self) -> &'static [Action] {
        match self {
            ModeState::Off => LIGHT_OFF,
            ModeState::On | ModeState::TintRamping => LIGHT_ON,
            ModeState::FactoryReset => LAUNCH_FACTORY_RESET,
            ModeState::VersionCheck => LAUNCH_VERSION_READOUT,
            ModeState::BatteryCheck => ARM_BATTERY,
            ModeState::TemperatureCheck => ARM_TEMPERATURE,
            ModeState::BeaconMode => ARM_BEACON,
            ModeState::SosMode => ARM_SOS,
            ModeState::Strobe(StrobePattern::Candle) => RECORD_CANDLE,
            ModeState::Strobe(StrobePattern::BikeFlash) => RECORD_BIKE_FLASH,
            ModeState::Strobe(StrobePattern::PartyStrobe) => RECORD_PARTY_STROBE,
            ModeState::Strobe(StrobePattern::TacticalStrobe) => RECORD_TACTICAL_STROBE,
            ModeState::Strobe(StrobePattern::LightningStorm) => RECORD_LIGHTNING_STORM,
            ModeState::Lockout | ModeState::StrobeEntry => NONE,
        }
    }

    /// Actions run before the state is left.
    #[must_use]
    pub const fn exit_actions(self) -> &'static [Action] {
        match self {
            ModeState::FactoryReset | ModeState::VersionCheck => RELEASE,
            ModeState::BatteryCheck
            | ModeState::TemperatureCheck
            | ModeState::BeaconMode
            | ModeState::SosMode => DISARM,
            _ => NONE,
        }
    }
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeState::Strobe(pattern) => write!(f, "strobe/{pattern}"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lookup_round_trips_every_state() {
        for (index, state) in ALL_STATES.iter().enumerate() {
            assert_eq!(state.as_index(), index);
            assert_eq!(ModeState::from_index(index), Some(*state));
        }
        assert_eq!(ModeState::from_index(STATE_COUNT), None);
    }

    #[test]
    fn diagnostic_states_pair_arm_with_disarm() {
        for state in ALL_STATES {
            let arms = state
                .entry_actions()
                .iter()
                .any(|action| matches!(action, Action::ArmDisplay(_)));
            let disarms = state.exit_actions().contains(&Action::DisarmDisplay);
            assert_eq!(arms, disarms, "{state}");
            assert_eq!(arms, state.diagnostic().is_some(), "{state}");
        }
    }

    #[test]
    fn strobe_patterns_record_themselves() {
        for pattern in ALL_PATTERNS {
            assert_eq!(
                ModeState::Strobe(pattern).entry_actions(),
                &[Action::RecordStrobe(pattern)]
            );
        }
    }
}
