mod support;

use controller_core::context::{Brightness, UiMode};
use controller_core::controller::{DispatchOutcome, LightPower};
use controller_core::gesture::Gesture;
use controller_core::states::ModeState;
use controller_core::strobe::StrobePattern;
use controller_core::supervisor::TaskKind;

use support::{OutputCall, advanced_controller, controller};

#[test]
fn single_click_turns_the_light_on() {
    let mut controller = controller();
    assert_eq!(controller.context().ui, UiMode::Simple);

    let outcome = controller.dispatch(Gesture::click(1));

    assert_eq!(
        outcome,
        DispatchOutcome::Transitioned {
            from: ModeState::Off,
            to: ModeState::On,
        }
    );
    assert_eq!(controller.output().last_power(), Some(LightPower::On));
    assert_eq!(
        controller.output().calls.last(),
        Some(&OutputCall::Brightness(50))
    );
}

#[test]
fn ten_holds_raise_brightness_by_ten() {
    let mut controller = controller();
    controller.dispatch(Gesture::click(1));
    assert_eq!(controller.context().brightness, Brightness::DEFAULT);

    for _ in 0..10 {
        controller.dispatch(Gesture::hold(1));
    }

    assert_eq!(controller.state(), ModeState::On);
    assert_eq!(controller.context().brightness.percent(), 60);
    assert_eq!(
        controller.output().calls.last(),
        Some(&OutputCall::Brightness(60))
    );
}

#[test]
fn advanced_gesture_is_ignored_in_simple_ui() {
    let mut controller = controller();
    let before = controller.snapshot();

    let outcome = controller.dispatch(Gesture::click(3));

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert_eq!(controller.state(), ModeState::Off);
    assert_eq!(controller.snapshot(), before);
    assert!(controller.armed_display().is_none());
}

#[test]
fn strobe_entry_resumes_the_last_pattern() {
    let mut controller = advanced_controller();
    controller.dispatch(Gesture::hold(3));
    controller.dispatch(Gesture::click(2));
    controller.dispatch(Gesture::click(2));
    assert_eq!(controller.context().last_strobe, StrobePattern::PartyStrobe);
    controller.dispatch(Gesture::click(1));
    assert_eq!(controller.state(), ModeState::Off);

    let outcome = controller.dispatch(Gesture::hold(3));

    assert_eq!(
        outcome,
        DispatchOutcome::Transitioned {
            from: ModeState::Off,
            to: ModeState::Strobe(StrobePattern::PartyStrobe),
        }
    );
}

#[test]
fn factory_reset_blocks_gestures_until_it_completes() {
    let mut controller = controller();
    controller.dispatch(Gesture::click(2));
    assert_eq!(controller.context().brightness, Brightness::MAX);
    controller.dispatch(Gesture::click(1));

    controller.dispatch(Gesture::hold(13));
    assert_eq!(controller.state(), ModeState::FactoryReset);
    let ticket = controller
        .outstanding_task()
        .expect("entry launches the reset");
    assert_eq!(ticket.kind(), TaskKind::FactoryReset);

    for gesture in [Gesture::click(1), Gesture::hold(1), Gesture::click(4), Gesture::hold(13)] {
        assert!(controller.dispatch(gesture).is_ignored());
        assert_eq!(controller.state(), ModeState::FactoryReset);
    }

    let outcome = controller.complete_task(ticket);

    assert_eq!(
        outcome,
        DispatchOutcome::Transitioned {
            from: ModeState::FactoryReset,
            to: ModeState::Off,
        }
    );
    assert!(controller.outstanding_task().is_none());
    assert_eq!(controller.context().brightness, Brightness::DEFAULT);
    assert_eq!(controller.output().last_power(), Some(LightPower::Off));
}

#[test]
fn version_check_returns_to_off() {
    let mut controller = controller();
    controller.dispatch(Gesture::click(15));
    assert_eq!(controller.state(), ModeState::VersionCheck);

    let ticket = controller.outstanding_task().expect("readout launched");
    assert_eq!(ticket.kind(), TaskKind::VersionReadout);
    controller.complete_task(ticket);

    assert_eq!(controller.state(), ModeState::Off);
}

#[test]
fn ui_toggle_round_trips() {
    let mut controller = controller();

    assert!(controller.dispatch(Gesture::click(10)).is_ignored());
    controller.dispatch(Gesture::hold(10));
    assert_eq!(controller.context().ui, UiMode::Advanced);
    assert!(controller.dispatch(Gesture::hold(10)).is_ignored());

    controller.dispatch(Gesture::click(10));
    assert_eq!(controller.context().ui, UiMode::Simple);
    assert_eq!(controller.state(), ModeState::Off);
}

#[test]
fn lockout_ignores_everything_but_its_exits() {
    let mut controller = controller();
    controller.dispatch(Gesture::click(4));
    assert_eq!(controller.state(), ModeState::Lockout);

    assert!(controller.dispatch(Gesture::click(1)).is_ignored());
    assert!(controller.dispatch(Gesture::hold(1)).is_ignored());

    controller.dispatch(Gesture::click(4));
    assert_eq!(controller.state(), ModeState::On);
    controller.dispatch(Gesture::click(4));
    controller.dispatch(Gesture::click(3));
    assert_eq!(controller.state(), ModeState::Off);
}

#[test]
fn tint_ramping_keeps_the_light_on_and_exits() {
    let mut controller = controller();
    controller.dispatch(Gesture::click(1));
    controller.dispatch(Gesture::hold(3));
    assert_eq!(controller.state(), ModeState::TintRamping);
    assert_eq!(controller.output().last_power(), Some(LightPower::On));

    controller.dispatch(Gesture::hold(3));
    assert_eq!(controller.state(), ModeState::On);
    controller.dispatch(Gesture::hold(3));
    controller.dispatch(Gesture::click(1));
    assert_eq!(controller.state(), ModeState::Off);
}

#[test]
fn diagnostic_ring_cycles_and_cancels() {
    let mut controller = advanced_controller();
    controller.dispatch(Gesture::click(3));

    let ring = [
        ModeState::BatteryCheck,
        ModeState::TemperatureCheck,
        ModeState::BeaconMode,
        ModeState::SosMode,
        ModeState::BatteryCheck,
    ];
    for (index, expected) in ring.iter().enumerate() {
        assert_eq!(controller.state(), *expected);
        let armed = controller.armed_display().expect("diagnostic state arms");
        assert_eq!(Some(armed.handle.kind()), expected.diagnostic());
        if index + 1 < ring.len() {
            controller.dispatch(Gesture::click(2));
        }
    }

    controller.dispatch(Gesture::click(1));
    assert_eq!(controller.state(), ModeState::Off);
    assert!(controller.armed_display().is_none());
}
