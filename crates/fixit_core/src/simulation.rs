//! Core simulation loop.
//!
//! One [`Simulation::tick`] resolves the pointer, walks every worker toward
//! its goal, applies repair, hands out reward workers, pushes crowded
//! workers apart, decays machines and advances the session clock. Anything
//! visible that changed is reported back in [`TickEvents`].
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No randomness
//! - Consistent iteration order (sorted IDs)
//! - Same inputs always produce the same [`Simulation::state_hash`]
//!
//! # Example
//!
//! ```
//! use fixit_core::prelude::*;
//!
//! let layout = FactoryLayout {
//!     factory_entry: Vec3Fixed::ground(Fixed::from_num(0), Fixed::from_num(-6)),
//!     entry_points: vec![Vec3Fixed::ground(Fixed::from_num(0), Fixed::from_num(-4))],
//!     machines: vec![MachineSpec::new(
//!         "press",
//!         Vec3Fixed::ground(Fixed::from_num(3), Fixed::from_num(3)),
//!     )],
//! };
//! let mut sim = Simulation::new(SessionConfig::default(), layout).unwrap();
//!
//! // Click the worker, then the machine.
//! let worker = EntityRef::Character(CharacterId(1));
//! let press = EntityRef::Machine(MachineId(1));
//! let dt = Fixed::from_num(1) / Fixed::from_num(20);
//! sim.tick(dt, &FrameInput::click(vec![worker]));
//! sim.tick(dt, &FrameInput::click(vec![press]));
//!
//! assert_eq!(sim.character(CharacterId(1)).unwrap().target_machine(), Some(MachineId(1)));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::character::Character;
use crate::components::{CharacterId, EntityRef, MachineId};
use crate::config::{FactoryLayout, Scenario, SessionConfig};
use crate::error::{GameError, Result};
use crate::machine::{Machine, RepairOutcome};
use crate::math::{Fixed, Vec3Fixed};
use crate::presentation::{
    AudioCue, CharacterView, MachineView, PresentationEvent, Presenter, VictoryView,
};
use crate::selection::{ClickAction, FrameInput, OutlineState, Targeting};
use crate::session::{Session, SessionOutcome};
use crate::storage::Arena;
use crate::systems::{nearest_point, separation_system, step_toward};

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick number after this tick completed.
    pub tick: u64,
    /// Presentation notifications, in the order they should be applied.
    pub presentation: Vec<PresentationEvent>,
    /// Reward workers that walked in.
    pub spawned: Vec<CharacterId>,
    /// Machines that went from broken to working.
    pub fixed: Vec<MachineId>,
    /// Machines that decayed into breaking down.
    pub broken: Vec<MachineId>,
    /// Set on the tick the session ends.
    pub outcome: Option<SessionOutcome>,
}

impl TickEvents {
    /// Replay the presentation notifications through `presenter`.
    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        for event in &self.presentation {
            event.dispatch(presenter);
        }
    }

    /// The one-shot sounds played this tick.
    pub fn cues(&self) -> impl Iterator<Item = AudioCue> + '_ {
        self.presentation.iter().filter_map(|event| match event {
            PresentationEvent::Cue(cue) => Some(*cue),
            _ => None,
        })
    }
}

/// The game simulation state.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SessionConfig,
    factory_entry: Vec3Fixed,
    entry_points: Vec<Vec3Fixed>,
    characters: Arena<CharacterId, Character>,
    machines: Arena<MachineId, Machine>,
    fixed_once: BTreeSet<MachineId>,
    outline: OutlineState,
    session: Session,
    tick: u64,
    repair_loop: bool,
    last_victory_view: Option<VictoryView>,
    pending: Vec<PresentationEvent>,
}

impl Simulation {
    /// Start a session on `layout`.
    ///
    /// Spawns the opening workers at the factory entry.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the tunables or the layout
    /// are unusable.
    pub fn new(config: SessionConfig, layout: FactoryLayout) -> Result<Self> {
        config.validate()?;
        layout.validate()?;

        let mut machines = Arena::new();
        for spec in &layout.machines {
            machines.insert_with(|id| Machine::from_spec(id, spec, config.grace_period));
        }

        let mut sim = Self {
            session: Session::new(&config),
            factory_entry: layout.factory_entry,
            entry_points: layout.entry_points,
            characters: Arena::new(),
            machines,
            fixed_once: BTreeSet::new(),
            outline: OutlineState::default(),
            tick: 0,
            repair_loop: false,
            last_victory_view: None,
            pending: Vec::new(),
            config,
        };
        for _ in 0..sim.config.initial_characters {
            sim.spawn_character();
        }
        Ok(sim)
    }

    /// Start a session from a parsed scenario.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the scenario is unusable.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self> {
        Self::new(scenario.session.clone(), scenario.layout.clone())
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: Fixed, input: &FrameInput) -> TickEvents {
        let dt = dt.max(Fixed::ZERO);
        let mut events = TickEvents::default();

        if !self.session.is_locked() {
            self.resolve_input(input);
            self.run_character_system(dt, &mut events);
            self.run_separation_system(dt);
            self.run_decay_system(dt, &mut events);
            self.run_session_system(dt, &mut events);
        }

        self.tick += 1;
        events.tick = self.tick;
        self.flush(&mut events);

        debug_assert!(
            self.invariant_violations().is_empty(),
            "invariants broken after tick {}: {:?}",
            self.tick,
            self.invariant_violations()
        );

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    // ========================================================================
    // Systems
    // ========================================================================

    fn resolve_input(&mut self, input: &FrameInput) {
        if input.primary_click {
            let action = Targeting::new(&self.characters, &self.machines).click(&input.hits);
            self.apply_click(action);
        }
        let next = Targeting::new(&self.characters, &self.machines).outline(&input.hits);
        self.set_outline(next);
    }

    fn apply_click(&mut self, action: ClickAction) {
        match action {
            ClickAction::Select(id) => {
                for character in self.characters.values_mut() {
                    character.set_selected(character.id() == id);
                }
                self.pending.push(PresentationEvent::Cue(AudioCue::Select));
            }
            ClickAction::Assign(machine) => {
                for id in self.characters.sorted_ids() {
                    let Some(character) = self.characters.get_mut(id) else {
                        continue;
                    };
                    if character.is_selected() {
                        character.set_target_machine(Some(machine));
                        character.set_selected(false);
                        self.pending.push(PresentationEvent::Cue(AudioCue::Confirm));
                    }
                }
            }
            ClickAction::ClearSelection => {
                for character in self.characters.values_mut() {
                    character.set_selected(false);
                }
            }
            ClickAction::Ignore => {}
        }
    }

    fn set_outline(&mut self, next: Option<EntityRef>) {
        let Some(change) = self.outline.update(next) else {
            return;
        };
        if let Some(previous) = change.previous {
            self.apply_outline(previous, false);
        }
        if let Some(next) = change.next {
            self.apply_outline(next, true);
            self.pending.push(PresentationEvent::Cue(AudioCue::Highlight));
        }
    }

    fn apply_outline(&mut self, entity: EntityRef, outlined: bool) {
        match entity {
            EntityRef::Character(id) => {
                if let Some(character) = self.characters.get_mut(id) {
                    character.set_outlined(outlined);
                }
            }
            EntityRef::Machine(id) => {
                if let Some(machine) = self.machines.get_mut(id) {
                    machine.set_outlined(outlined);
                }
            }
        }
    }

    /// Move, repair and release workers, then hand out reward workers.
    fn run_character_system(&mut self, dt: Fixed, events: &mut TickEvents) {
        let step = self.config.move_speed * dt;
        let arrival = self.config.arrival_distance;
        let mut newly_fixed = Vec::new();

        for id in self.characters.sorted_ids() {
            let Some(character) = self.characters.get_mut(id) else {
                continue;
            };
            let target = character
                .target_machine()
                .and_then(|machine| self.machines.get_mut(machine));

            match target {
                Some(machine) => {
                    let rally = machine.rally_point();
                    if machine.distance_to(character.position()) > arrival {
                        character.set_moving(true, rally);
                        character.set_position(step_toward(character.position(), rally, step));
                    } else if machine.is_broken() {
                        character.set_moving(false, rally);
                        if !character.is_repairing() {
                            character.set_repairing(true);
                            character.set_selected(false);
                            character.set_outlined(false);
                            self.outline.forget(EntityRef::Character(id));
                        }
                        if machine.repair(character.repair_rate() * dt) == RepairOutcome::Fixed {
                            newly_fixed.push(machine.id());
                        }
                    } else {
                        character.set_repairing(false);
                        character.set_moving(false, rally);
                    }
                }
                None => {
                    character.set_target_machine(None);
                    character.set_repairing(false);
                    let destination = character.move_to_point();
                    if character.position().distance(destination) > arrival {
                        character.set_moving(true, destination);
                        character.set_position(step_toward(
                            character.position(),
                            destination,
                            step,
                        ));
                    } else {
                        character.set_moving(false, destination);
                    }
                }
            }
        }

        let mut rewards = 0_u32;
        for machine in newly_fixed {
            events.fixed.push(machine);
            self.release_workers(machine);
            if self.fixed_once.insert(machine) {
                if let Some(fixed) = self.machines.get(machine) {
                    tracing::info!(machine = %machine, name = fixed.name(), "Machine fixed for the first time");
                }
                rewards += 1;
            }
        }

        // Deferred so the pass above never sees a half-built roster.
        for _ in 0..rewards {
            if let Some(id) = self.spawn_character() {
                events.spawned.push(id);
            }
        }
    }

    /// Send everyone working on `machine` back to the nearest entry point.
    fn release_workers(&mut self, machine: MachineId) {
        for id in self.characters.sorted_ids() {
            let Some(character) = self.characters.get_mut(id) else {
                continue;
            };
            if character.target_machine() != Some(machine) {
                continue;
            }
            let destination = nearest_point(&self.entry_points, character.position())
                .unwrap_or(self.factory_entry);
            character.set_target_machine(None);
            character.set_move_to_point(destination);
            character.set_repairing(false);
        }
    }

    fn run_separation_system(&mut self, dt: Fixed) {
        let snapshot: Vec<(CharacterId, Vec3Fixed)> = self
            .characters
            .iter_sorted()
            .map(|(id, character)| (id, character.position()))
            .collect();
        let anchored: Vec<CharacterId> = self
            .characters
            .iter_sorted()
            .filter(|(_, character)| character.is_repairing())
            .map(|(id, _)| id)
            .collect();
        let step = self.config.move_speed * dt / Fixed::from_num(2);

        for (id, position) in
            separation_system(&snapshot, &anchored, self.config.repel_radius, step)
        {
            if let Some(character) = self.characters.get_mut(id) {
                character.set_position(position);
            }
        }
    }

    fn run_decay_system(&mut self, dt: Fixed, events: &mut TickEvents) {
        for id in self.machines.sorted_ids() {
            let Some(machine) = self.machines.get_mut(id) else {
                continue;
            };
            if machine.tick(dt) {
                tracing::debug!(machine = %id, name = machine.name(), "Machine broke down");
                events.broken.push(id);
            }
        }
    }

    fn run_session_system(&mut self, dt: Fixed, events: &mut TickEvents) {
        let all_working = self.machines.values().all(|machine| !machine.is_broken());
        if let Some(outcome) = self.session.advance(dt, all_working) {
            self.lock(outcome);
            events.outcome = Some(outcome);
        }
    }

    /// Freeze the factory and start the celebration.
    fn lock(&mut self, outcome: SessionOutcome) {
        tracing::info!(
            ?outcome,
            tick = self.tick,
            elapsed = %self.session.elapsed(),
            "Session over"
        );
        for machine in self.machines.values_mut() {
            machine.set_breakage_allowed(false);
        }
        for character in self.characters.values_mut() {
            character.set_dancing(true);
        }
        self.set_outline(None);
    }

    /// Move queued notifications and dirty views into `events`.
    fn flush(&mut self, events: &mut TickEvents) {
        events.presentation.append(&mut self.pending);

        for id in self.characters.sorted_ids() {
            if let Some(character) = self.characters.get_mut(id) {
                if character.take_dirty() {
                    events
                        .presentation
                        .push(PresentationEvent::Character(CharacterView::of(character)));
                }
            }
        }
        for id in self.machines.sorted_ids() {
            if let Some(machine) = self.machines.get_mut(id) {
                if machine.take_dirty() {
                    events
                        .presentation
                        .push(PresentationEvent::Machine(MachineView::of(machine)));
                }
            }
        }

        let repairing = self.characters.values().any(Character::is_repairing);
        if repairing != self.repair_loop {
            self.repair_loop = repairing;
            events
                .presentation
                .push(PresentationEvent::RepairLoop(repairing));
        }

        let view = self.session.view();
        if self.last_victory_view != Some(view) {
            self.last_victory_view = Some(view);
            events.presentation.push(PresentationEvent::Victory(view));
        }
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Walk a new worker in through the factory entry.
    ///
    /// Returns `None` when the factory is at its population cap or the
    /// session is over; the request is dropped, not queued.
    pub fn spawn_character(&mut self) -> Option<CharacterId> {
        if self.session.is_locked() {
            tracing::debug!("Spawn dropped: session is over");
            return None;
        }
        let cap = self.config.population_cap as usize;
        if self.characters.len() >= cap {
            tracing::debug!(cap, "Spawn dropped: population cap reached");
            return None;
        }

        let entry = self.factory_entry;
        let destination = nearest_point(&self.entry_points, entry).unwrap_or(entry);
        let repair_rate = self.config.repair_rate;
        let id = self
            .characters
            .insert_with(|id| Character::new(id, entry, destination, repair_rate));
        self.pending.push(PresentationEvent::Cue(AudioCue::Entrance));
        tracing::info!(character = %id, population = self.characters.len(), "Worker entered the factory");
        Some(id)
    }

    /// Remove a worker from the session.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if there is no such worker.
    pub fn despawn_character(&mut self, id: CharacterId) -> Result<()> {
        let entity = EntityRef::Character(id);
        self.characters
            .remove(id)
            .ok_or(GameError::EntityNotFound(entity))?;
        self.outline.forget(entity);
        Ok(())
    }

    /// Point a worker at a machine, or clear its target with `None`.
    ///
    /// Equivalent to selecting the worker and clicking the machine, without
    /// the selection or the sound.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if either entity is missing.
    pub fn assign_target(&mut self, id: CharacterId, machine: Option<MachineId>) -> Result<()> {
        if let Some(machine) = machine {
            if !self.machines.contains(machine) {
                return Err(GameError::EntityNotFound(EntityRef::Machine(machine)));
            }
        }
        let character = self
            .characters
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(EntityRef::Character(id)))?;
        character.set_target_machine(machine);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Everything under a point on the factory floor, nearest first.
    ///
    /// Workers within the character pick radius come before machines within
    /// the machine pick radius. Distances are measured on the floor plane.
    #[must_use]
    pub fn hits_at(&self, point: Vec3Fixed) -> Vec<EntityRef> {
        let character_radius_sq = self.config.character_pick_radius * self.config.character_pick_radius;
        let machine_radius_sq = self.config.machine_pick_radius * self.config.machine_pick_radius;

        let mut characters: Vec<(Fixed, CharacterId)> = self
            .characters
            .iter_sorted()
            .map(|(id, c)| (c.position().planar_distance_squared(point), id))
            .filter(|(dist_sq, _)| *dist_sq <= character_radius_sq)
            .collect();
        characters.sort_unstable();

        let mut machines: Vec<(Fixed, MachineId)> = self
            .machines
            .iter_sorted()
            .map(|(id, m)| (m.position().planar_distance_squared(point), id))
            .filter(|(dist_sq, _)| *dist_sq <= machine_radius_sq)
            .collect();
        machines.sort_unstable();

        characters
            .into_iter()
            .map(|(_, id)| EntityRef::Character(id))
            .chain(machines.into_iter().map(|(_, id)| EntityRef::Machine(id)))
            .collect()
    }

    /// Look up a worker.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Look up a machine.
    #[must_use]
    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    /// All workers in ID order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> + '_ {
        self.characters.iter_sorted().map(|(_, c)| c)
    }

    /// All machines in ID order.
    pub fn machines(&self) -> impl Iterator<Item = &Machine> + '_ {
        self.machines.iter_sorted().map(|(_, m)| m)
    }

    /// Number of workers.
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Workers that are currently selected.
    #[must_use]
    pub fn selected_characters(&self) -> Vec<CharacterId> {
        self.characters
            .iter_sorted()
            .filter(|(_, c)| c.is_selected())
            .map(|(id, _)| id)
            .collect()
    }

    /// The highlighted entity.
    #[must_use]
    pub const fn outlined(&self) -> Option<EntityRef> {
        self.outline.current()
    }

    /// Whether `machine` has been fixed at least once this session.
    #[must_use]
    pub fn has_been_fixed(&self, machine: MachineId) -> bool {
        self.fixed_once.contains(&machine)
    }

    /// Number of machines fixed at least once.
    #[must_use]
    pub fn machines_fixed_once(&self) -> usize {
        self.fixed_once.len()
    }

    /// Session clock and outcome.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Seconds left on the victory countdown.
    #[must_use]
    pub const fn victory_time_remaining(&self) -> Fixed {
        self.session.victory_time_remaining()
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Session tunables.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Where released workers head back to.
    #[must_use]
    pub fn entry_points(&self) -> &[Vec3Fixed] {
        &self.entry_points
    }

    /// Gameplay invariants that do not hold right now.
    ///
    /// Always empty after a tick; a non-empty list is a simulation bug.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (id, character) in self.characters.iter_sorted() {
            if !character.is_repairing() {
                continue;
            }
            let target = character
                .target_machine()
                .and_then(|machine| self.machines.get(machine));
            match target {
                None => violations.push(format!("{id} is repairing without a target")),
                Some(machine) if !machine.is_broken() => violations.push(format!(
                    "{id} is repairing {} which is not broken",
                    machine.id()
                )),
                Some(machine)
                    if machine.distance_to(character.position()) > self.config.arrival_distance =>
                {
                    violations.push(format!("{id} is repairing {} from afar", machine.id()));
                }
                Some(_) => {}
            }
        }

        for (id, machine) in self.machines.iter_sorted() {
            let level = machine.repair_level();
            if level < Fixed::ZERO || level > machine.repair_needed() {
                violations.push(format!("{id} has repair level {level} out of range"));
            }
        }

        let selected = self.characters.values().filter(|c| c.is_selected()).count();
        if selected > 1 {
            violations.push(format!("{selected} workers selected at once"));
        }

        let outlined_characters = self
            .characters
            .iter_sorted()
            .filter(|(_, c)| c.is_outlined())
            .map(|(id, _)| EntityRef::Character(id));
        let outlined_machines = self
            .machines
            .iter_sorted()
            .filter(|(_, m)| m.is_outlined())
            .map(|(id, _)| EntityRef::Machine(id));
        let outlined: Vec<EntityRef> = outlined_characters.chain(outlined_machines).collect();
        let expected: Vec<EntityRef> = self.outline.current().into_iter().collect();
        if outlined != expected {
            violations.push(format!(
                "outlined entities {outlined:?} do not match highlight {expected:?}"
            ));
        }

        if self.characters.len() > self.config.population_cap as usize {
            violations.push(format!(
                "{} workers exceed the cap of {}",
                self.characters.len(),
                self.config.population_cap
            ));
        }

        violations
    }

    /// Compute a hash of the simulation state for desync detection.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.characters.len().hash(&mut hasher);
        for (id, character) in self.characters.iter_sorted() {
            id.hash(&mut hasher);
            character.position().hash(&mut hasher);
            character.move_to_point().hash(&mut hasher);
            character.target_machine().hash(&mut hasher);
            character.activity().hash(&mut hasher);
            character.is_selected().hash(&mut hasher);
            character.facing().hash(&mut hasher);
        }

        self.machines.len().hash(&mut hasher);
        for (id, machine) in self.machines.iter_sorted() {
            id.hash(&mut hasher);
            machine.repair_level().to_bits().hash(&mut hasher);
            machine.safety_buffer_remaining().to_bits().hash(&mut hasher);
            machine.is_broken().hash(&mut hasher);
            machine.breakage_allowed().hash(&mut hasher);
        }

        self.fixed_once.hash(&mut hasher);
        self.outline.current().hash(&mut hasher);
        self.session.victory_time_remaining().to_bits().hash(&mut hasher);
        self.session.elapsed().to_bits().hash(&mut hasher);
        self.session.outcome().hash(&mut hasher);

        hasher.finish()
    }
}
