//! Shared identifiers and small value types.
//!
//! Entities reference each other by ID only, never by handle, so removing
//! a record from its arena can never leave a dangling reference behind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec3Fixed};

/// Unique identifier for a worker character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

/// Unique identifier for a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineId(pub u32);

impl From<u32> for CharacterId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<u32> for MachineId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "character#{}", self.0)
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "machine#{}", self.0)
    }
}

/// Either kind of interactable entity.
///
/// Hit lists and the highlight state hold these; the selection rules only
/// ever need to know which variant they are looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// A worker.
    Character(CharacterId),
    /// A machine.
    Machine(MachineId),
}

impl EntityRef {
    /// The character ID, if this refers to a character.
    #[must_use]
    pub const fn character(self) -> Option<CharacterId> {
        match self {
            Self::Character(id) => Some(id),
            Self::Machine(_) => None,
        }
    }

    /// The machine ID, if this refers to a machine.
    #[must_use]
    pub const fn machine(self) -> Option<MachineId> {
        match self {
            Self::Machine(id) => Some(id),
            Self::Character(_) => None,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(id) => id.fmt(f),
            Self::Machine(id) => id.fmt(f),
        }
    }
}

/// Which way a sprite faces sideways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lateral {
    /// Facing screen left (mirrored sprite).
    Left,
    /// Facing screen right.
    #[default]
    Right,
}

/// Whether a sprite shows its front or its back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Depth {
    /// Walking toward the camera (front visible).
    #[default]
    Forward,
    /// Walking away from the camera (back visible).
    Backward,
}

/// Sprite facing derived from a movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Facing {
    /// Sideways component.
    pub lateral: Lateral,
    /// Depth component.
    pub depth: Depth,
}

impl Facing {
    /// Facing for a character at `from` looking at `toward`.
    ///
    /// Exactly vertical or exactly sideways directions resolve to
    /// `Right` and `Forward` respectively.
    #[must_use]
    pub fn toward(from: Vec3Fixed, toward: Vec3Fixed) -> Self {
        let delta = toward - from;
        Self {
            lateral: if delta.x < Fixed::ZERO {
                Lateral::Left
            } else {
                Lateral::Right
            },
            depth: if delta.z > Fixed::ZERO {
                Depth::Backward
            } else {
                Depth::Forward
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, z: i32) -> Vec3Fixed {
        Vec3Fixed::ground(Fixed::from_num(x), Fixed::from_num(z))
    }

    #[test]
    fn facing_follows_direction_signs() {
        let origin = p(0, 0);
        assert_eq!(
            Facing::toward(origin, p(-3, 2)),
            Facing {
                lateral: Lateral::Left,
                depth: Depth::Backward
            }
        );
        assert_eq!(
            Facing::toward(origin, p(4, -1)),
            Facing {
                lateral: Lateral::Right,
                depth: Depth::Forward
            }
        );
    }

    #[test]
    fn facing_straight_ahead_defaults() {
        assert_eq!(Facing::toward(p(1, 1), p(1, 1)), Facing::default());
    }

    #[test]
    fn entity_ref_accessors() {
        let c = EntityRef::Character(CharacterId(3));
        let m = EntityRef::Machine(MachineId(7));
        assert_eq!(c.character(), Some(CharacterId(3)));
        assert_eq!(c.machine(), None);
        assert_eq!(m.machine(), Some(MachineId(7)));
        assert_eq!(m.to_string(), "machine#7");
    }
}
