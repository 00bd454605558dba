//! Test fixtures and helpers.
//!
//! Pre-built layouts, sessions and inputs for consistent testing.

use fixed::types::I32F32;
use fixit_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a point on the factory floor from floats.
#[must_use]
pub fn vec3(x: f64, z: f64) -> Vec3Fixed {
    Vec3Fixed::ground(fixed_f(x), fixed_f(z))
}

/// One second of simulated time.
#[must_use]
pub fn one_second() -> Fixed {
    fixed(1)
}

/// One fixed-rate tick.
#[must_use]
pub fn tick_dt() -> Fixed {
    fixed(1) / Fixed::from_num(TICK_RATE)
}

/// A single broken press whose rally point is the factory entry.
///
/// Workers spawn already standing at the rally point, so a worker told to
/// fix the press starts repairing on the first tick. Entry points sit at
/// `x = -5` and `x = 5`.
#[must_use]
pub fn one_machine_layout() -> FactoryLayout {
    FactoryLayout {
        factory_entry: vec3(0.0, 0.0),
        entry_points: vec![vec3(-5.0, 0.0), vec3(5.0, 0.0)],
        machines: vec![MachineSpec::new("press", vec3(0.0, 1.0)).with_rally_point(vec3(0.0, 0.0))],
    }
}

/// Three broken machines spread across the floor, entry at the bottom.
#[must_use]
pub fn workshop_layout() -> FactoryLayout {
    FactoryLayout {
        factory_entry: vec3(0.0, -8.0),
        entry_points: vec![vec3(-3.0, -5.0), vec3(3.0, -5.0)],
        machines: vec![
            MachineSpec::new("press", vec3(-6.0, 4.0)).with_rally_point(vec3(-6.0, 2.5)),
            MachineSpec::new("lathe", vec3(0.0, 6.0)).with_rally_point(vec3(0.0, 4.5)),
            MachineSpec::new("conveyor", vec3(6.0, 4.0))
                .with_rally_point(vec3(6.0, 2.5))
                .with_repair_needed(fixed(50)),
        ],
    }
}

/// Every machine already working, so the victory clock runs from tick one.
#[must_use]
pub fn working_layout() -> FactoryLayout {
    let mut layout = one_machine_layout();
    for spec in &mut layout.machines {
        spec.initial_repair = spec.repair_needed;
    }
    layout
}

/// Start a session, panicking on an invalid fixture.
///
/// # Panics
///
/// Panics if `config` or `layout` fail validation.
#[must_use]
pub fn simulation(config: SessionConfig, layout: FactoryLayout) -> Simulation {
    Simulation::new(config, layout).expect("fixture session is valid")
}

/// Advance `sim` by `n` ticks of `dt` with no pointer input.
pub fn run_idle(sim: &mut Simulation, n: u32, dt: Fixed) -> Vec<TickEvents> {
    (0..n).map(|_| sim.tick(dt, &FrameInput::idle())).collect()
}

/// A click on a worker.
#[must_use]
pub fn click_character(id: u32) -> FrameInput {
    FrameInput::click(vec![EntityRef::Character(CharacterId(id))])
}

/// A click on a machine.
#[must_use]
pub fn click_machine(id: u32) -> FrameInput {
    FrameInput::click(vec![EntityRef::Machine(MachineId(id))])
}

/// A click on empty floor.
#[must_use]
pub fn click_nothing() -> FrameInput {
    FrameInput::click(Vec::new())
}
