//! Pointer targeting: which entity a click or hover refers to.
//!
//! The host reports everything under the pointer each tick as a list of
//! [`EntityRef`]s, front to back. This module ranks that list and decides
//! what a click means; the simulation applies the result.
//!
//! Rules:
//! - A character beats a machine.
//! - A repairing character can only be picked while nobody is selected,
//!   so it cannot steal an active selection.
//! - Machines are only highlighted while at least one character is
//!   selected; otherwise clicking them does nothing.
//! - Repairing and celebrating characters are never highlighted.

use crate::character::Character;
use crate::components::{CharacterId, EntityRef, MachineId};
use crate::machine::Machine;
use crate::storage::Arena;

/// Input gathered by the host for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Everything under the pointer, nearest first.
    pub hits: Vec<EntityRef>,
    /// Whether the primary button was pressed this tick.
    pub primary_click: bool,
}

impl FrameInput {
    /// Pointer over nothing, no click.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Pointer hovering over `hits`.
    #[must_use]
    pub fn hover(hits: Vec<EntityRef>) -> Self {
        Self {
            hits,
            primary_click: false,
        }
    }

    /// Click on `hits`.
    #[must_use]
    pub fn click(hits: Vec<EntityRef>) -> Self {
        Self {
            hits,
            primary_click: true,
        }
    }
}

/// What a click resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Make this the only selected character.
    Select(CharacterId),
    /// Send every selected character to this machine.
    Assign(MachineId),
    /// Clicked empty space: drop the selection.
    ClearSelection,
    /// Clicked a machine with nobody selected.
    Ignore,
}

/// Read-only view of the entities the rules need.
#[derive(Clone, Copy)]
pub struct Targeting<'a> {
    characters: &'a Arena<CharacterId, Character>,
    machines: &'a Arena<MachineId, Machine>,
    any_selected: bool,
}

impl<'a> Targeting<'a> {
    /// Build a targeting view over the current entities.
    #[must_use]
    pub fn new(
        characters: &'a Arena<CharacterId, Character>,
        machines: &'a Arena<MachineId, Machine>,
    ) -> Self {
        let any_selected = characters.values().any(Character::is_selected);
        Self {
            characters,
            machines,
            any_selected,
        }
    }

    /// Whether at least one character is selected.
    #[must_use]
    pub const fn any_selected(&self) -> bool {
        self.any_selected
    }

    fn selectable(&self, id: CharacterId) -> bool {
        self.characters.get(id).is_some_and(|c| {
            !c.is_celebrating() && (!c.is_repairing() || !self.any_selected)
        })
    }

    fn highlightable(&self, id: CharacterId) -> bool {
        self.characters
            .get(id)
            .is_some_and(|c| !c.is_celebrating() && !c.is_repairing())
    }

    fn first_machine(&self, hits: &[EntityRef]) -> Option<MachineId> {
        hits.iter()
            .filter_map(|hit| hit.machine())
            .find(|id| self.machines.contains(*id))
    }

    /// The single entity a click on `hits` refers to.
    #[must_use]
    pub fn rank(&self, hits: &[EntityRef]) -> Option<EntityRef> {
        hits.iter()
            .filter_map(|hit| hit.character())
            .find(|id| self.selectable(*id))
            .map(EntityRef::Character)
            .or_else(|| self.first_machine(hits).map(EntityRef::Machine))
    }

    /// What clicking on `hits` does.
    #[must_use]
    pub fn click(&self, hits: &[EntityRef]) -> ClickAction {
        match self.rank(hits) {
            Some(EntityRef::Character(id)) => ClickAction::Select(id),
            Some(EntityRef::Machine(id)) if self.any_selected => ClickAction::Assign(id),
            Some(EntityRef::Machine(_)) => ClickAction::Ignore,
            None => ClickAction::ClearSelection,
        }
    }

    /// The entity that should be highlighted while hovering over `hits`.
    #[must_use]
    pub fn outline(&self, hits: &[EntityRef]) -> Option<EntityRef> {
        let character = hits
            .iter()
            .filter_map(|hit| hit.character())
            .find(|id| self.highlightable(*id))
            .map(EntityRef::Character);
        if character.is_some() {
            return character;
        }
        if self.any_selected {
            self.first_machine(hits).map(EntityRef::Machine)
        } else {
            None
        }
    }
}

/// Tracks the single highlighted entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineState {
    current: Option<EntityRef>,
}

/// A change of highlighted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineChange {
    /// Entity losing the highlight.
    pub previous: Option<EntityRef>,
    /// Entity gaining the highlight.
    pub next: Option<EntityRef>,
}

impl OutlineState {
    /// The highlighted entity.
    #[must_use]
    pub const fn current(&self) -> Option<EntityRef> {
        self.current
    }

    /// Move the highlight to `next`.
    ///
    /// Returns `None` when `next` is already highlighted, so hovering over
    /// the same thing every tick produces no notifications.
    pub fn update(&mut self, next: Option<EntityRef>) -> Option<OutlineChange> {
        if self.current == next {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, next);
        Some(OutlineChange { previous, next })
    }

    /// Drop the highlight if it is on `entity`.
    pub fn forget(&mut self, entity: EntityRef) -> bool {
        if self.current == Some(entity) {
            self.current = None;
            true
        } else {
            false
        }
    }
}
