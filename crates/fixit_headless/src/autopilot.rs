//! A scripted player.
//!
//! The autopilot plays through the same pointer input a person would:
//! it picks a spot on the floor with [`Simulation::hits_at`] and clicks.
//! It alternates between selecting an idle worker and sending that worker
//! to the broken machine with the fewest helpers.

use fixit_core::prelude::*;

/// Chooses one click per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autopilot;

impl Autopilot {
    /// Create an autopilot.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Input for the next tick.
    #[must_use]
    pub fn next_input(&self, sim: &Simulation) -> FrameInput {
        if sim.session().is_locked() {
            return FrameInput::idle();
        }
        let Some(machine) = Self::neediest_machine(sim) else {
            return FrameInput::idle();
        };

        if sim.selected_characters().is_empty() {
            match Self::idle_worker(sim) {
                Some(worker) => Self::click_at(sim, worker.position(), |hit| hit.character().is_some()),
                None => FrameInput::idle(),
            }
        } else {
            Self::click_at(sim, machine.position(), |hit| hit.machine().is_some())
        }
    }

    /// Lowest-ID worker with nothing to do.
    fn idle_worker(sim: &Simulation) -> Option<&Character> {
        sim.characters()
            .find(|c| c.target_machine().is_none() && !c.is_repairing() && !c.is_celebrating())
    }

    /// Broken machine with the fewest workers assigned, lowest ID on ties.
    fn neediest_machine(sim: &Simulation) -> Option<&Machine> {
        sim.machines()
            .filter(|m| m.is_broken())
            .min_by_key(|m| {
                let helpers = sim
                    .characters()
                    .filter(|c| c.target_machine() == Some(m.id()))
                    .count();
                (helpers, m.id())
            })
    }

    /// Click on the floor at `point`, aiming only at hits that pass `keep`.
    fn click_at(sim: &Simulation, point: Vec3Fixed, keep: impl Fn(&EntityRef) -> bool) -> FrameInput {
        let mut hits = sim.hits_at(point);
        hits.retain(|hit| keep(hit));
        FrameInput::click(hits)
    }
}
