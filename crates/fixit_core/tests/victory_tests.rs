//! Victory countdown and session end tests.

use fixit_core::prelude::*;
use fixit_test_utils::fixtures::{
    click_character, fixed, fixed_f, one_machine_layout, one_second, run_idle, simulation,
    working_layout,
};
use fixit_test_utils::recording::RecordingPresenter;

#[test]
fn thirty_working_seconds_win_the_session() {
    let mut sim = simulation(SessionConfig::default(), working_layout());

    let events = run_idle(&mut sim, 30, one_second());

    assert!(events[..29].iter().all(|e| e.outcome.is_none()));
    assert_eq!(events[29].outcome, Some(SessionOutcome::Victory));
    assert_eq!(sim.victory_time_remaining(), Fixed::ZERO);
    assert!(sim.characters().all(Character::is_celebrating));
}

#[test]
fn nothing_changes_after_victory() {
    let mut sim = simulation(SessionConfig::default(), working_layout());
    run_idle(&mut sim, 30, one_second());
    let positions: Vec<Vec3Fixed> = sim.characters().map(Character::position).collect();

    let later = run_idle(&mut sim, 50, one_second());

    assert!(later.iter().all(|e| e.outcome.is_none() && e.broken.is_empty()));
    assert!(sim.machines().all(|m| !m.is_broken()));
    assert_eq!(
        sim.characters().map(Character::position).collect::<Vec<_>>(),
        positions
    );
    assert_eq!(sim.current_tick(), 80);
    assert_eq!(sim.session().outcome(), Some(SessionOutcome::Victory));
}

#[test]
fn victory_freezes_decay_for_good() {
    let config = SessionConfig {
        grace_period: fixed(40),
        ..SessionConfig::default()
    };
    let mut layout = working_layout();
    layout.machines[0].break_rate = fixed(10);
    let mut sim = simulation(config, layout);

    let events = run_idle(&mut sim, 30, one_second());
    assert_eq!(events[29].outcome, Some(SessionOutcome::Victory));

    run_idle(&mut sim, 100, one_second());
    let press = sim.machine(MachineId(1)).unwrap();
    assert!(!press.breakage_allowed());
    assert!(!press.is_broken());
    assert_eq!(press.repair_level(), fixed(100));
}

#[test]
fn countdown_pauses_while_a_machine_is_broken() {
    let config = SessionConfig {
        grace_period: fixed(2),
        ..SessionConfig::default()
    };
    let mut layout = working_layout();
    layout.machines[0].break_rate = fixed(100);
    let mut sim = simulation(config, layout);

    let events = run_idle(&mut sim, 10, one_second());
    assert_eq!(events[2].broken, vec![MachineId(1)]);
    assert_eq!(sim.victory_time_remaining(), fixed(28));
    assert!(!sim.session().view().counting);

    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();
    let mut fixed_on_tick = None;
    for _ in 0..50 {
        let events = sim.tick(one_second(), &FrameInput::idle());
        if !events.fixed.is_empty() {
            fixed_on_tick = Some(events.tick);
            break;
        }
    }

    assert!(fixed_on_tick.is_some(), "press was never repaired");
    // Resumes from where it paused rather than starting over.
    assert_eq!(sim.victory_time_remaining(), fixed(27));
}

#[test]
fn time_limit_ends_the_session_without_victory() {
    let config = SessionConfig {
        time_limit: Some(fixed(5)),
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, one_machine_layout());

    let events = run_idle(&mut sim, 5, one_second());

    assert_eq!(events[4].outcome, Some(SessionOutcome::TimeUp));
    assert!(sim.characters().all(Character::is_celebrating));
    assert!(sim.machines().all(|m| !m.breakage_allowed()));
    assert_eq!(sim.victory_time_remaining(), fixed(30));
}

#[test]
fn a_finished_session_ignores_clicks() {
    let config = SessionConfig {
        time_limit: Some(fixed(1)),
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, one_machine_layout());
    run_idle(&mut sim, 1, one_second());

    let events = sim.tick(one_second(), &click_character(1));

    assert_eq!(events.tick, 2);
    assert!(events.presentation.is_empty());
    assert!(sim.selected_characters().is_empty());
    assert_eq!(sim.spawn_character(), None);
}

#[test]
fn celebration_and_widget_reach_the_presenter() {
    let config = SessionConfig {
        victory_duration: fixed(2),
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, working_layout());
    let mut presenter = RecordingPresenter::new();

    for events in run_idle(&mut sim, 4, fixed_f(0.5)) {
        events.present(&mut presenter);
    }

    let seconds: Vec<(bool, u32)> = presenter
        .victory
        .iter()
        .map(|v| (v.counting, v.seconds_remaining))
        .collect();
    assert_eq!(seconds, vec![(true, 2), (true, 1), (false, 0)]);
    assert!(presenter.last_character(CharacterId(1)).unwrap().dancing);
}
