//! Worker characters.
//!
//! Characters are plain state holders: the simulation decides where they
//! go and what they do, and calls the setters below. Each setter marks the
//! character dirty only when something visible actually changed.

use crate::components::{CharacterId, Facing, MachineId};
use crate::math::{Fixed, Vec3Fixed};

/// What a character is doing right now.
///
/// Walking and repairing are mutually exclusive, and celebrating is
/// terminal: once entered, movement and repair commands are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activity {
    /// Standing still.
    #[default]
    Idle,
    /// Walking toward a destination.
    Walking,
    /// Working on a machine.
    Repairing,
    /// Session won; dancing forever.
    Celebrating,
}

/// A worker.
#[derive(Debug, Clone)]
pub struct Character {
    id: CharacterId,
    position: Vec3Fixed,
    repair_rate: Fixed,
    target_machine: Option<MachineId>,
    move_to_point: Vec3Fixed,
    activity: Activity,
    selected: bool,
    outlined: bool,
    facing: Facing,
    facing_stale: bool,
    dirty: bool,
}

impl Character {
    /// Create an idle character.
    #[must_use]
    pub fn new(
        id: CharacterId,
        position: Vec3Fixed,
        move_to_point: Vec3Fixed,
        repair_rate: Fixed,
    ) -> Self {
        Self {
            id,
            position,
            repair_rate,
            target_machine: None,
            move_to_point,
            activity: Activity::Idle,
            selected: false,
            outlined: false,
            facing: Facing::default(),
            facing_stale: true,
            dirty: true,
        }
    }

    /// Assign or clear the machine this character works on.
    ///
    /// Without a target the character heads for its move-to point.
    pub fn set_target_machine(&mut self, machine: Option<MachineId>) {
        if self.is_celebrating() || self.target_machine == machine {
            return;
        }
        self.target_machine = machine;
        self.facing_stale = true;
    }

    /// Set where the character walks when it has no target machine.
    pub fn set_move_to_point(&mut self, point: Vec3Fixed) {
        if self.is_celebrating() || self.move_to_point == point {
            return;
        }
        self.move_to_point = point;
        self.facing_stale = true;
    }

    /// Start or stop walking.
    ///
    /// Facing is recomputed toward `toward` only when walking starts or the
    /// destination changed since the last computation, never every frame.
    pub fn set_moving(&mut self, moving: bool, toward: Vec3Fixed) {
        if self.is_celebrating() {
            return;
        }
        if moving {
            if self.activity != Activity::Walking || self.facing_stale {
                let facing = Facing::toward(self.position, toward);
                if facing != self.facing {
                    self.facing = facing;
                    self.dirty = true;
                }
                self.facing_stale = false;
            }
            self.set_activity(Activity::Walking);
        } else if self.activity == Activity::Walking {
            self.set_activity(Activity::Idle);
        }
    }

    /// Start or stop repairing.
    pub fn set_repairing(&mut self, repairing: bool) {
        if self.is_celebrating() {
            return;
        }
        if repairing {
            self.set_activity(Activity::Repairing);
        } else if self.activity == Activity::Repairing {
            self.set_activity(Activity::Idle);
        }
    }

    /// Set the selection flag.
    pub fn set_selected(&mut self, selected: bool) {
        if self.selected != selected {
            self.selected = selected;
            self.dirty = true;
        }
    }

    /// Set the highlight flag.
    pub fn set_outlined(&mut self, outlined: bool) {
        if self.outlined != outlined {
            self.outlined = outlined;
            self.dirty = true;
        }
    }

    /// Enter the celebrating state. There is no way back out.
    pub fn set_dancing(&mut self, dancing: bool) {
        if !dancing || self.is_celebrating() {
            return;
        }
        self.set_selected(false);
        self.set_outlined(false);
        self.set_activity(Activity::Celebrating);
    }

    pub(crate) fn set_position(&mut self, position: Vec3Fixed) {
        self.position = position;
    }

    fn set_activity(&mut self, activity: Activity) {
        if self.activity != activity {
            self.activity = activity;
            self.dirty = true;
        }
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Character ID.
    #[must_use]
    pub const fn id(&self) -> CharacterId {
        self.id
    }

    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec3Fixed {
        self.position
    }

    /// Repair applied per second.
    #[must_use]
    pub const fn repair_rate(&self) -> Fixed {
        self.repair_rate
    }

    /// Assigned machine, if any.
    #[must_use]
    pub const fn target_machine(&self) -> Option<MachineId> {
        self.target_machine
    }

    /// Fallback destination.
    #[must_use]
    pub const fn move_to_point(&self) -> Vec3Fixed {
        self.move_to_point
    }

    /// Current activity.
    #[must_use]
    pub const fn activity(&self) -> Activity {
        self.activity
    }

    /// Whether the character is walking.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.activity == Activity::Walking
    }

    /// Whether the character is working on a machine.
    #[must_use]
    pub fn is_repairing(&self) -> bool {
        self.activity == Activity::Repairing
    }

    /// Whether the character is in the terminal dancing state.
    #[must_use]
    pub fn is_celebrating(&self) -> bool {
        self.activity == Activity::Celebrating
    }

    /// Selection flag.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Highlight flag.
    #[must_use]
    pub const fn is_outlined(&self) -> bool {
        self.outlined
    }

    /// Current sprite facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Depth, Lateral};

    fn p(x: i32, z: i32) -> Vec3Fixed {
        Vec3Fixed::ground(Fixed::from_num(x), Fixed::from_num(z))
    }

    fn worker() -> Character {
        let mut c = Character::new(CharacterId(1), p(0, 0), p(0, 0), Fixed::from_num(10));
        c.take_dirty();
        c
    }

    #[test]
    fn facing_is_latched_while_walking() {
        let mut c = worker();
        c.set_moving(true, p(-5, 0));
        assert_eq!(c.facing().lateral, Lateral::Left);

        // Same walk, different instantaneous heading: no recompute.
        c.set_moving(true, p(5, 5));
        assert_eq!(c.facing().lateral, Lateral::Left);
        assert_eq!(c.facing().depth, Depth::Forward);
    }

    #[test]
    fn facing_recomputed_after_stop() {
        let mut c = worker();
        c.set_moving(true, p(-5, 0));
        c.set_moving(false, p(-5, 0));
        c.set_moving(true, p(5, 5));
        assert_eq!(c.facing().lateral, Lateral::Right);
        assert_eq!(c.facing().depth, Depth::Backward);
    }

    #[test]
    fn facing_recomputed_on_new_target() {
        let mut c = worker();
        c.set_moving(true, p(-5, 0));
        c.set_target_machine(Some(MachineId(4)));
        c.set_moving(true, p(5, 0));
        assert_eq!(c.facing().lateral, Lateral::Right);
    }

    #[test]
    fn repairing_replaces_walking() {
        let mut c = worker();
        c.set_moving(true, p(1, 0));
        c.set_repairing(true);
        assert!(c.is_repairing());
        assert!(!c.is_moving());
        c.set_moving(false, p(1, 0));
        assert!(c.is_repairing());
        c.set_repairing(false);
        assert_eq!(c.activity(), Activity::Idle);
    }

    #[test]
    fn redundant_setters_stay_clean() {
        let mut c = worker();
        c.set_selected(false);
        c.set_outlined(false);
        c.set_repairing(false);
        c.set_moving(false, p(0, 0));
        assert!(!c.take_dirty());

        c.set_selected(true);
        assert!(c.take_dirty());
        c.set_selected(true);
        assert!(!c.take_dirty());
    }

    #[test]
    fn dancing_is_terminal() {
        let mut c = worker();
        c.set_selected(true);
        c.set_dancing(true);
        assert!(c.is_celebrating());
        assert!(!c.is_selected());

        c.set_moving(true, p(9, 9));
        c.set_repairing(true);
        c.set_target_machine(Some(MachineId(1)));
        c.set_dancing(false);
        assert!(c.is_celebrating());
        assert_eq!(c.target_machine(), None);
    }
}
