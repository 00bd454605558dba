//! Machines: repair progress and post-repair decay.
//!
//! A machine starts broken and is fixed once its repair level reaches
//! `repair_needed`. After a fix it holds steady for a grace period, then
//! loses repair at `break_rate` per second and breaks again at zero.
//! Breakage can be switched off for good when the session is won.

use crate::components::MachineId;
use crate::config::MachineSpec;
use crate::math::{Fixed, Vec3Fixed};

/// Effect of a [`Machine::repair`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Repair level rose but the machine is still broken.
    Progress,
    /// This call took the machine from broken to working.
    Fixed,
    /// The machine was already working.
    AlreadyWorking,
}

/// A machine on the factory floor.
#[derive(Debug, Clone)]
pub struct Machine {
    id: MachineId,
    name: String,
    position: Vec3Fixed,
    rally_point: Vec3Fixed,
    repair_level: Fixed,
    repair_needed: Fixed,
    broken: bool,
    break_rate: Fixed,
    grace_period: Fixed,
    safety_buffer_remaining: Fixed,
    breakage_allowed: bool,
    outlined: bool,
    dirty: bool,
}

impl Machine {
    /// Build a machine from its layout entry.
    #[must_use]
    pub fn from_spec(id: MachineId, spec: &MachineSpec, grace_period: Fixed) -> Self {
        let repair_level = spec.initial_repair.clamp(Fixed::ZERO, spec.repair_needed);
        let broken = repair_level < spec.repair_needed;
        Self {
            id,
            name: spec.name.clone(),
            position: spec.position,
            rally_point: spec.rally_point,
            repair_level,
            repair_needed: spec.repair_needed,
            broken,
            break_rate: spec.break_rate,
            grace_period,
            safety_buffer_remaining: if broken { Fixed::ZERO } else { grace_period },
            breakage_allowed: true,
            outlined: false,
            dirty: true,
        }
    }

    /// Apply `amount` of repair.
    ///
    /// The level is clamped to `repair_needed`; hitting the clamp fixes the
    /// machine and restarts its grace period. Negative amounts count as zero.
    pub fn repair(&mut self, amount: Fixed) -> RepairOutcome {
        let was_broken = self.broken;
        let amount = amount.max(Fixed::ZERO);
        let level = (self.repair_level + amount).min(self.repair_needed);
        if level != self.repair_level {
            self.repair_level = level;
            self.dirty = true;
        }

        if self.repair_level >= self.repair_needed {
            self.safety_buffer_remaining = self.grace_period;
            if self.broken {
                self.broken = false;
                self.dirty = true;
            }
        }

        match (was_broken, self.broken) {
            (true, false) => RepairOutcome::Fixed,
            (true, true) => RepairOutcome::Progress,
            (false, _) => RepairOutcome::AlreadyWorking,
        }
    }

    /// Advance decay by `dt` seconds. Returns `true` if the machine broke.
    pub fn tick(&mut self, dt: Fixed) -> bool {
        if self.broken || !self.breakage_allowed {
            return false;
        }

        if self.safety_buffer_remaining > Fixed::ZERO {
            self.safety_buffer_remaining = (self.safety_buffer_remaining - dt).max(Fixed::ZERO);
            return false;
        }

        if self.break_rate == Fixed::ZERO {
            return false;
        }

        self.repair_level = (self.repair_level - self.break_rate * dt).max(Fixed::ZERO);
        self.dirty = true;
        if self.repair_level == Fixed::ZERO {
            self.broken = true;
            return true;
        }
        false
    }

    /// Permanently enable or disable decay.
    ///
    /// Once disabled it stays disabled; the session is over.
    pub fn set_breakage_allowed(&mut self, allowed: bool) {
        self.breakage_allowed = self.breakage_allowed && allowed;
    }

    /// Set the highlight flag.
    pub fn set_outlined(&mut self, outlined: bool) {
        if self.outlined != outlined {
            self.outlined = outlined;
            self.dirty = true;
        }
    }

    /// Distance from the rally point to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec3Fixed) -> Fixed {
        self.rally_point.distance(point)
    }

    /// Machine ID.
    #[must_use]
    pub const fn id(&self) -> MachineId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the machine needs repair.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// Where the machine stands.
    #[must_use]
    pub const fn position(&self) -> Vec3Fixed {
        self.position
    }

    /// Where workers stand to repair it.
    #[must_use]
    pub const fn rally_point(&self) -> Vec3Fixed {
        self.rally_point
    }

    /// Current repair level, `0..=repair_needed`.
    #[must_use]
    pub const fn repair_level(&self) -> Fixed {
        self.repair_level
    }

    /// Repair needed for a full fix.
    #[must_use]
    pub const fn repair_needed(&self) -> Fixed {
        self.repair_needed
    }

    /// Seconds left before decay begins.
    #[must_use]
    pub const fn safety_buffer_remaining(&self) -> Fixed {
        self.safety_buffer_remaining
    }

    /// Whether decay is still possible.
    #[must_use]
    pub const fn breakage_allowed(&self) -> bool {
        self.breakage_allowed
    }

    /// Highlight flag.
    #[must_use]
    pub const fn is_outlined(&self) -> bool {
        self.outlined
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
