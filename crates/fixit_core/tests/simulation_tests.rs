//! End-to-end simulation scenarios.

use fixit_core::prelude::*;
use fixit_test_utils::fixtures::{
    fixed, one_machine_layout, one_second, run_idle, simulation, vec3, workshop_layout,
};
use fixit_test_utils::recording::RecordingPresenter;

#[test]
fn ten_seconds_of_repair_fixes_the_press_and_rewards_one_worker() {
    let mut sim = simulation(SessionConfig::default(), one_machine_layout());
    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();

    let events = run_idle(&mut sim, 10, one_second());

    let press = sim.machine(MachineId(1)).unwrap();
    assert_eq!(press.repair_level(), fixed(100));
    assert!(!press.is_broken());
    assert_eq!(sim.character_count(), 2);

    let spawned: Vec<CharacterId> = events.iter().flat_map(|e| e.spawned.clone()).collect();
    assert_eq!(spawned, vec![CharacterId(2)]);
    assert_eq!(events[9].fixed, vec![MachineId(1)]);
    assert!(events[..9].iter().all(|e| e.fixed.is_empty()));
}

#[test]
fn repair_is_not_applied_before_arrival() {
    let layout = FactoryLayout {
        factory_entry: vec3(0.0, -6.0),
        entry_points: vec![vec3(0.0, -4.0)],
        machines: vec![MachineSpec::new("press", vec3(0.0, 4.0)).with_rally_point(vec3(0.0, 2.0))],
    };
    let mut sim = simulation(SessionConfig::default(), layout);
    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();

    // Eight units away with an arrival distance of one: seven ticks of walking.
    run_idle(&mut sim, 7, one_second());
    let worker = sim.character(CharacterId(1)).unwrap();
    assert_eq!(worker.position(), vec3(0.0, 1.0));
    assert!(worker.is_moving());
    assert_eq!(sim.machine(MachineId(1)).unwrap().repair_level(), fixed(0));

    run_idle(&mut sim, 1, one_second());
    let worker = sim.character(CharacterId(1)).unwrap();
    assert!(worker.is_repairing());
    assert!(!worker.is_moving());
    assert_eq!(sim.machine(MachineId(1)).unwrap().repair_level(), fixed(10));
}

#[test]
fn fixing_a_machine_releases_every_worker_to_the_nearest_entry_point() {
    let config = SessionConfig {
        initial_characters: 2,
        ..SessionConfig::default()
    };
    let mut layout = one_machine_layout();
    layout.entry_points = vec![vec3(-5.0, 0.0), vec3(3.0, 0.0)];
    let mut sim = simulation(config, layout);
    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();
    sim.assign_target(CharacterId(2), Some(MachineId(1))).unwrap();

    let events = run_idle(&mut sim, 5, one_second());
    assert_eq!(events[4].fixed, vec![MachineId(1)]);

    for id in [CharacterId(1), CharacterId(2)] {
        let worker = sim.character(id).unwrap();
        assert_eq!(worker.target_machine(), None);
        assert!(!worker.is_repairing());
        assert_eq!(worker.move_to_point(), vec3(3.0, 0.0));
    }
}

#[test]
fn a_machine_fixed_again_never_rewards_twice() {
    let config = SessionConfig {
        grace_period: fixed(0),
        ..SessionConfig::default()
    };
    let mut layout = one_machine_layout();
    layout.machines[0].break_rate = fixed(100);
    let mut sim = simulation(config, layout);

    let mut fixes = 0;
    let mut spawned = Vec::new();
    for _ in 0..200 {
        let idle: Vec<CharacterId> = sim
            .characters()
            .filter(|c| c.target_machine().is_none())
            .map(Character::id)
            .collect();
        for id in idle {
            sim.assign_target(id, Some(MachineId(1))).unwrap();
        }
        let events = sim.tick(one_second(), &FrameInput::idle());
        fixes += events.fixed.len();
        spawned.extend(events.spawned);
    }

    assert!(fixes >= 2, "press was only fixed {fixes} times");
    assert_eq!(spawned, vec![CharacterId(2)]);
    assert_eq!(sim.machines_fixed_once(), 1);
}

#[test]
fn population_cap_drops_reward_spawns() {
    let config = SessionConfig {
        population_cap: 1,
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, one_machine_layout());
    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();

    let events = run_idle(&mut sim, 10, one_second());
    assert_eq!(events[9].fixed, vec![MachineId(1)]);
    assert!(events[9].spawned.is_empty());
    assert_eq!(sim.character_count(), 1);
    assert_eq!(sim.spawn_character(), None);
}

#[test]
fn decayed_machine_breaks_after_its_grace_period() {
    let config = SessionConfig {
        grace_period: fixed(2),
        initial_characters: 0,
        ..SessionConfig::default()
    };
    let mut layout = one_machine_layout();
    layout.machines[0] = layout.machines[0]
        .clone()
        .with_initial_repair(fixed(100))
        .with_break_rate(fixed(25));
    let mut sim = simulation(config, layout);

    let events = run_idle(&mut sim, 6, one_second());

    // Two seconds of grace, then four seconds at 25 per second.
    assert!(events[..5].iter().all(|e| e.broken.is_empty()));
    assert_eq!(events[5].broken, vec![MachineId(1)]);
    let press = sim.machine(MachineId(1)).unwrap();
    assert!(press.is_broken());
    assert_eq!(press.repair_level(), fixed(0));
}

#[test]
fn crowded_workers_are_pushed_apart() {
    let config = SessionConfig {
        initial_characters: 3,
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, workshop_layout());

    run_idle(&mut sim, 40, one_second() / fixed(10));

    let positions: Vec<Vec3Fixed> = sim.characters().map(Character::position).collect();
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert_ne!(a, b, "two workers share a spot");
        }
    }
}

#[test]
fn presenter_sees_pips_and_repair_loop() {
    let mut sim = simulation(SessionConfig::default(), one_machine_layout());
    sim.assign_target(CharacterId(1), Some(MachineId(1))).unwrap();

    let mut presenter = RecordingPresenter::new();
    for events in run_idle(&mut sim, 12, one_second()) {
        events.present(&mut presenter);
    }

    let press = presenter.last_machine(MachineId(1)).unwrap();
    assert!(!press.broken);
    assert_eq!((press.pips_total, press.pips_repaired), (20, 20));
    assert_eq!(presenter.repair_loop, vec![true, false]);
    assert_eq!(presenter.cue_count(AudioCue::Entrance), 2);
    assert!(presenter.victory.last().unwrap().counting);
}

#[test]
fn unchanged_state_produces_no_views() {
    let config = SessionConfig {
        initial_characters: 0,
        ..SessionConfig::default()
    };
    let mut sim = simulation(config, one_machine_layout());
    let first = sim.tick(one_second(), &FrameInput::idle());
    assert!(!first.presentation.is_empty());

    let second = sim.tick(one_second(), &FrameInput::idle());
    assert!(second.presentation.is_empty(), "{:?}", second.presentation);
}

#[test]
fn scenario_text_builds_a_session() {
    let scenario = Scenario::from_ron_str(
        r#"
        Scenario(
            name: "pair",
            session: (initial_characters: 2, population_cap: 4),
            layout: (
                factory_entry: (x: 0.0, z: -6.0),
                entry_points: [(x: -2.0, z: -4.0), (x: 2.0, z: -4.0)],
                machines: [
                    (name: "press", position: (x: -3.0, z: 3.0), rally_point: (x: -3.0, z: 1.5)),
                    (name: "lathe", position: (x: 3.0, z: 3.0), rally_point: (x: 3.0, z: 1.5), break_rate: 2.0),
                ],
            ),
        )
        "#,
    )
    .unwrap();

    let sim = Simulation::from_scenario(&scenario).unwrap();
    assert_eq!(sim.character_count(), 2);
    assert_eq!(sim.machines().count(), 2);
    assert_eq!(sim.machine(MachineId(2)).unwrap().name(), "lathe");
}

#[test]
fn invalid_layout_is_rejected_at_start() {
    let mut layout = one_machine_layout();
    layout.machines.clear();
    let err = Simulation::new(SessionConfig::default(), layout).unwrap_err();
    assert!(matches!(err, GameError::InvalidConfig(_)));

    let config = SessionConfig {
        initial_characters: 9,
        population_cap: 8,
        ..SessionConfig::default()
    };
    assert!(Simulation::new(config, one_machine_layout()).is_err());
}

#[test]
fn layouts_beyond_the_floor_are_rejected_at_start() {
    let mut far_machine = one_machine_layout();
    far_machine.machines[0] = MachineSpec::new("far press", vec3(60_000.0, 0.0));
    let err = Simulation::new(SessionConfig::default(), far_machine).unwrap_err();
    assert!(matches!(err, GameError::InvalidConfig(_)));

    let mut far_door = one_machine_layout();
    far_door.entry_points.push(vec3(0.0, -60_000.0));
    assert!(Simulation::new(SessionConfig::default(), far_door).is_err());

    let mut huge_press = one_machine_layout();
    huge_press.machines[0] = huge_press.machines[0]
        .clone()
        .with_repair_needed(fixed(200_000))
        .with_initial_repair(fixed(200_000));
    let err = Simulation::new(SessionConfig::default(), huge_press).unwrap_err();
    assert!(matches!(err, GameError::InvalidConfig(_)));
}

#[test]
fn largest_machine_reports_exact_pips() {
    let mut layout = one_machine_layout();
    layout.machines[0] = layout.machines[0]
        .clone()
        .with_repair_needed(fixed(100_000))
        .with_initial_repair(fixed(100_000));
    let mut sim = simulation(SessionConfig::default(), layout);
    let mut presenter = RecordingPresenter::new();

    sim.tick(one_second(), &FrameInput::idle()).present(&mut presenter);

    let view = presenter.last_machine(MachineId(1)).unwrap();
    assert!(!view.broken);
    assert_eq!((view.pips_total, view.pips_repaired), (20_000, 20_000));
}

#[test]
fn picking_far_off_the_floor_finds_nothing() {
    let sim = simulation(SessionConfig::default(), workshop_layout());
    assert!(sim.hits_at(vec3(1_000_000.0, -1_000_000.0)).is_empty());
}
