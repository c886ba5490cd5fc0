//! Static transition table.
//!
//! Each [`TransitionSpec`] is keyed by `(from, trigger)`. Specs that share a
//! key form a guarded fan-out; the engine evaluates them in declared order and
//! the first whose guard holds wins. [`validate`] checks the structural rules
//! the engine relies on: fan-outs are exhaustive and mutually exclusive,
//! invoke states only leave through their completion edge, pseudo-states only
//! have eventless edges, and every acquired resource is released on exit.

use core::fmt;

use crate::context::{Brightness, Context, UiMode};
use crate::display::DiagnosticKind;
use crate::gesture::Gesture;
use crate::states::{ALL_STATES, ModeState};
use crate::strobe::{ALL_PATTERNS, StrobePattern};
use crate::supervisor::TaskKind;

use ModeState::{
    BatteryCheck, BeaconMode, FactoryReset, Lockout, Off, On, SosMode, StrobeEntry,
    TemperatureCheck, TintRamping, VersionCheck,
};

/// What causes a transition to be considered.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Trigger {
    /// A user gesture delivered by the decoder.
    Gesture(Gesture),
    /// Taken immediately on entry, without waiting for input.
    Always,
    /// The state's long-running operation resolved.
    TaskDone,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Gesture(gesture) => write!(f, "{gesture}"),
            Trigger::Always => f.write_str("always"),
            Trigger::TaskDone => f.write_str("done"),
        }
    }
}

/// Pure predicate over a context snapshot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Guard {
    UiIs(UiMode),
    LastStrobeIs(StrobePattern),
}

impl Guard {
    #[must_use]
    pub fn holds(self, context: Context) -> bool {
        match self {
            Guard::UiIs(ui) => context.ui == ui,
            Guard::LastStrobeIs(pattern) => context.last_strobe == pattern,
        }
    }
}

/// Side effects run by the engine during a transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    TurnLightOn,
    TurnLightOff,
    IncreaseBrightness,
    DecreaseBrightness,
    SetBrightness(Brightness),
    SetUi(UiMode),
    RecordStrobe(StrobePattern),
    RestoreDefaults,
    ArmDisplay(DiagnosticKind),
    DisarmDisplay,
    LaunchTask(TaskKind),
    ReleaseTask,
}

/// One row of the transition table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TransitionSpec {
    pub from: ModeState,
    pub trigger: Trigger,
    pub guard: Option<Guard>,
    pub actions: &'static [Action],
    pub target: ModeState,
}

impl TransitionSpec {
    const fn new(from: ModeState, trigger: Trigger, target: ModeState) -> Self {
        Self {
            from,
            trigger,
            guard: None,
            actions: &[],
            target,
        }
    }

    const fn when(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    const fn with(mut self, actions: &'static [Action]) -> Self {
        self.actions = actions;
        self
    }

    /// Whether this row applies to `trigger` in `state`.
    #[must_use]
    pub fn keyed_by(&self, state: ModeState, trigger: Trigger) -> bool {
        self.from == state && self.trigger == trigger
    }

    #[must_use]
    pub fn admits(&self, context: Context) -> bool {
        self.guard.is_none_or(|guard| guard.holds(context))
    }
}

const fn click(from: ModeState, clicks: u8, target: ModeState) -> TransitionSpec {
    TransitionSpec::new(from, Trigger::Gesture(Gesture::click(clicks)), target)
}

const fn hold(from: ModeState, clicks: u8, target: ModeState) -> TransitionSpec {
    TransitionSpec::new(from, Trigger::Gesture(Gesture::hold(clicks)), target)
}

const fn always(from: ModeState, target: ModeState) -> TransitionSpec {
    TransitionSpec::new(from, Trigger::Always, target)
}

const fn done(from: ModeState, target: ModeState) -> TransitionSpec {
    TransitionSpec::new(from, Trigger::TaskDone, target)
}

const fn resume(pattern: StrobePattern) -> TransitionSpec {
    always(ModeState::StrobeEntry, ModeState::Strobe(pattern)).when(Guard::LastStrobeIs(pattern))
}

const fn strobe_edges(pattern: StrobePattern) -> [TransitionSpec; 2] {
    [
        click(ModeState::Strobe(pattern), 1, ModeState::Off),
        click(
            ModeState::Strobe(pattern),
            2,
            ModeState::Strobe(pattern.next()),
        ),
    ]
}

const ADVANCED: Guard = Guard::UiIs(UiMode::Advanced);
const SIMPLE: Guard = Guard::UiIs(UiMode::Simple);

/// Number of rows in [`TRANSITIONS`].
pub const TRANSITION_COUNT: usize = 45;

const CANDLE: [TransitionSpec; 2] = strobe_edges(StrobePattern::Candle);
const BIKE_FLASH: [TransitionSpec; 2] = strobe_edges(StrobePattern::BikeFlash);
const PARTY_STROBE: [TransitionSpec; 2] = strobe_edges(StrobePattern::PartyStrobe);
const TACTICAL_STROBE: [TransitionSpec; 2] = strobe_edges(StrobePattern::TacticalStrobe);
const LIGHTNING_STORM: [TransitionSpec; 2] = strobe_edges(StrobePattern::LightningStorm);

/// The complete device behaviour, in evaluation order.
pub static TRANSITIONS: [TransitionSpec; TRANSITION_COUNT] = [
    // off
    click(Off, 1, On),
    hold(Off, 1, On).with(&[Action::SetBrightness(Brightness::MIN)]),
    click(Off, 2, On).with(&[Action::SetBrightness(Brightness::MAX)]),
    click(Off, 3, BatteryCheck).when(ADVANCED),
    hold(Off, 3, StrobeEntry).when(ADVANCED),
    click(Off, 4, Lockout),
    click(Off, 10, Off)
        .when(ADVANCED)
        .with(&[Action::SetUi(UiMode::Simple)]),
    hold(Off, 10, Off)
        .when(SIMPLE)
        .with(&[Action::SetUi(UiMode::Advanced)]),
    hold(Off, 13, FactoryReset),
    click(Off, 15, VersionCheck),
    // on
    click(On, 1, Off),
    hold(On, 1, On).with(&[Action::IncreaseBrightness]),
    click(On, 2, On).with(&[Action::SetBrightness(Brightness::MAX)]),
    hold(On, 2, On).with(&[Action::DecreaseBrightness]),
    hold(On, 3, TintRamping),
    click(On, 4, Lockout),
    // tint ramping
    click(TintRamping, 1, Off),
    hold(TintRamping, 3, On),
    // lockout
    click(Lockout, 3, Off),
    click(Lockout, 4, On),
    // invoke states
    done(FactoryReset, Off).with(&[Action::RestoreDefaults]),
    done(VersionCheck, Off),
    // diagnostic ring
    click(BatteryCheck, 1, Off),
    click(BatteryCheck, 2, TemperatureCheck),
    click(TemperatureCheck, 1, Off),
    click(TemperatureCheck, 2, BeaconMode),
    click(BeaconMode, 1, Off),
    click(BeaconMode, 2, SosMode),
    click(SosMode, 1, Off),
    click(SosMode, 2, BatteryCheck),
    // strobe entry point
    resume(StrobePattern::Candle),
    resume(StrobePattern::BikeFlash),
    resume(StrobePattern::PartyStrobe),
    resume(StrobePattern::TacticalStrobe),
    resume(StrobePattern::LightningStorm),
    // strobe ring
    CANDLE[0],
    CANDLE[1],
    BIKE_FLASH[0],
    BIKE_FLASH[1],
    PARTY_STROBE[0],
    PARTY_STROBE[1],
    TACTICAL_STROBE[0],
    TACTICAL_STROBE[1],
    LIGHTNING_STORM[0],
    LIGHTNING_STORM[1],
];

/// First row keyed by `(state, trigger)` whose guard holds for `context`.
#[must_use]
pub fn lookup(
    state: ModeState,
    trigger: Trigger,
    context: Context,
) -> Option<&'static TransitionSpec> {
    TRANSITIONS
        .iter()
        .find(|spec| spec.keyed_by(state, trigger) && spec.admits(context))
}

/// Rows leaving `state`, in evaluation order.
pub fn edges_from(state: ModeState) -> impl Iterator<Item = &'static TransitionSpec> {
    TRANSITIONS.iter().filter(move |spec| spec.from == state)
}

/// Structural defect found in the transition table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableError {
    /// An unguarded row hides a later row with the same key.
    ShadowedRow { from: ModeState, trigger: Trigger },
    /// Guards on a fan-out overlap for some context.
    OverlappingGuards { from: ModeState, trigger: Trigger },
    /// Guards on a fan-out leave some context unmatched.
    UncoveredContext { from: ModeState, trigger: Trigger },
    /// An invoke state reacts to something other than its completion.
    InvokeStateAcceptsInput(ModeState),
    /// An invoke state has no completion edge.
    MissingCompletionEdge(ModeState),
    /// A pseudo-state mixes eventless and triggered edges.
    MixedPseudoState(ModeState),
    /// Entry acquires a resource the exit never releases.
    UnreleasedResource(ModeState),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::ShadowedRow { from, trigger } => {
                write!(f, "{from} on {trigger}: unguarded row shadows a later row")
            }
            TableError::OverlappingGuards { from, trigger } => {
                write!(f, "{from} on {trigger}: guards are not mutually exclusive")
            }
            TableError::UncoveredContext { from, trigger } => {
                write!(f, "{from} on {trigger}: guards are not exhaustive")
            }
            TableError::InvokeStateAcceptsInput(state) => {
                write!(f, "{state}: invoke state must only leave on completion")
            }
            TableError::MissingCompletionEdge(state) => {
                write!(f, "{state}: invoke state has no completion edge")
            }
            TableError::MixedPseudoState(state) => {
                write!(f, "{state}: eventless edges mixed with triggered edges")
            }
            TableError::UnreleasedResource(state) => {
                write!(f, "{state}: entry resource is not released on exit")
            }
        }
    }
}

/// Contexts that exercise every guard outcome.
fn guard_contexts() -> impl Iterator<Item = Context> {
    [UiMode::Simple, UiMode::Advanced]
        .into_iter()
        .flat_map(|ui| {
            ALL_PATTERNS.into_iter().map(move |last_strobe| Context {
                ui,
                last_strobe,
                ..Context::new()
            })
        })
}

/// Checks the structural rules of [`TRANSITIONS`].
///
/// # Errors
///
/// Returns the first [`TableError`] found, scanning rows in table order.
pub fn validate() -> Result<(), TableError> {
    validate_rows(&TRANSITIONS)
}

fn validate_rows(rows: &[TransitionSpec]) -> Result<(), TableError> {
    for (index, spec) in rows.iter().enumerate() {
        let (from, trigger) = (spec.from, spec.trigger);
        let first = rows
            .iter()
            .position(|other| other.keyed_by(from, trigger))
            .unwrap_or(index);
        if first != index {
            continue;
        }

        let group = || rows.iter().filter(move |other| other.keyed_by(from, trigger));
        if group().count() < 2 {
            continue;
        }
        if group().any(|other| other.guard.is_none()) {
            return Err(TableError::ShadowedRow { from, trigger });
        }
        for context in guard_contexts() {
            match group().filter(|other| other.admits(context)).count() {
                0 => return Err(TableError::UncoveredContext { from, trigger }),
                1 => {}
                _ => return Err(TableError::OverlappingGuards { from, trigger }),
            }
        }
    }

    for state in ALL_STATES {
        let mut edges = rows.iter().filter(|spec| spec.from == state);

        if state.invoked_task().is_some() {
            if edges.clone().any(|spec| spec.trigger != Trigger::TaskDone) {
                return Err(TableError::InvokeStateAcceptsInput(state));
            }
            if !edges.any(|spec| spec.trigger == Trigger::TaskDone) {
                return Err(TableError::MissingCompletionEdge(state));
            }
        } else {
            let eventless = edges.clone().any(|spec| spec.trigger == Trigger::Always);
            if eventless && edges.any(|spec| spec.trigger != Trigger::Always) {
                return Err(TableError::MixedPseudoState(state));
            }
        }

        let acquires = state.entry_actions().iter().any(|action| {
            matches!(action, Action::ArmDisplay(_) | Action::LaunchTask(_))
        });
        let releases = state
            .exit_actions()
            .iter()
            .any(|action| matches!(action, Action::DisarmDisplay | Action::ReleaseTask));
        if acquires && !releases {
            return Err(TableError::UnreleasedResource(state));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_table_is_well_formed() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn strobe_entry_resolves_every_pattern() {
        for pattern in ALL_PATTERNS {
            let context = Context {
                last_strobe: pattern,
                ..Context::new()
            };
            let spec = lookup(ModeState::StrobeEntry, Trigger::Always, context);
            assert_eq!(spec.map(|spec| spec.target), Some(ModeState::Strobe(pattern)));
        }
    }

    #[test]
    fn overlapping_fan_out_is_rejected() {
        let rows = [
            always(StrobeEntry, ModeState::Strobe(StrobePattern::Candle)).when(SIMPLE),
            always(StrobeEntry, ModeState::Strobe(StrobePattern::BikeFlash))
                .when(Guard::LastStrobeIs(StrobePattern::Candle)),
        ];
        assert_eq!(
            validate_rows(&rows),
            Err(TableError::OverlappingGuards {
                from: StrobeEntry,
                trigger: Trigger::Always,
            })
        );
    }

    #[test]
    fn non_exhaustive_fan_out_is_rejected() {
        let rows = [resume(StrobePattern::Candle), resume(StrobePattern::BikeFlash)];
        assert_eq!(
            validate_rows(&rows),
            Err(TableError::UncoveredContext {
                from: StrobeEntry,
                trigger: Trigger::Always,
            })
        );
    }

    #[test]
    fn unguarded_row_in_fan_out_is_rejected() {
        let rows = [click(Off, 3, On), click(Off, 3, BatteryCheck).when(ADVANCED)];
        assert_eq!(
            validate_rows(&rows),
            Err(TableError::ShadowedRow {
                from: Off,
                trigger: Trigger::Gesture(Gesture::click(3)),
            })
        );
    }

    #[test]
    fn invoke_state_with_gesture_edge_is_rejected() {
        let rows = [click(FactoryReset, 1, Off), done(FactoryReset, Off)];
        assert_eq!(
            validate_rows(&rows),
            Err(TableError::InvokeStateAcceptsInput(FactoryReset))
        );
    }
}
