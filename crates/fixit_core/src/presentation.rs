//! One-way notifications for the presentation layer.
//!
//! The simulation never calls into renderers or audio directly. It records
//! what changed during a tick as [`PresentationEvent`]s; hosts replay them
//! through a [`Presenter`] to update sprites, status icons and sound.

use serde::Serialize;

use crate::character::{Activity, Character};
use crate::components::{CharacterId, Facing, MachineId};
use crate::machine::Machine;
use crate::math::{fixed_decimal, Fixed};

/// Repair represented by one progress pip.
pub const PIPS_PER_REPAIR: i32 = 5;

/// Snapshot of everything a character sprite displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterView {
    /// Which character.
    pub id: CharacterId,
    /// Walking animation.
    pub moving: bool,
    /// Sprite facing.
    pub facing: Facing,
    /// Repair status icon.
    pub repairing: bool,
    /// Selection status icon.
    pub selected: bool,
    /// Highlight outline.
    pub outlined: bool,
    /// Victory dance.
    pub dancing: bool,
}

impl CharacterView {
    /// Capture a character's current display state.
    #[must_use]
    pub fn of(character: &Character) -> Self {
        let activity = character.activity();
        Self {
            id: character.id(),
            moving: activity == Activity::Walking,
            facing: character.facing(),
            repairing: activity == Activity::Repairing,
            selected: character.is_selected(),
            outlined: character.is_outlined(),
            dancing: activity == Activity::Celebrating,
        }
    }
}

/// Snapshot of everything a machine and its status widget display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineView {
    /// Which machine.
    pub id: MachineId,
    /// Broken or working icon.
    pub broken: bool,
    /// Current repair level.
    #[serde(with = "fixed_decimal")]
    pub repair_level: Fixed,
    /// Repair needed for a full fix.
    #[serde(with = "fixed_decimal")]
    pub repair_needed: Fixed,
    /// Number of pips in the progress bar.
    pub pips_total: u32,
    /// Number of pips shown as repaired.
    pub pips_repaired: u32,
    /// Highlight outline.
    pub outlined: bool,
}

impl MachineView {
    /// Capture a machine's current display state.
    #[must_use]
    pub fn of(machine: &Machine) -> Self {
        let (pips_total, pips_repaired) =
            repair_pips(machine.repair_level(), machine.repair_needed());
        Self {
            id: machine.id(),
            broken: machine.is_broken(),
            repair_level: machine.repair_level(),
            repair_needed: machine.repair_needed(),
            pips_total,
            pips_repaired,
            outlined: machine.is_outlined(),
        }
    }
}

/// Pip counts for a progress bar: `(total, repaired)`.
///
/// One pip per [`PIPS_PER_REPAIR`] of repair needed, rounded down; the
/// repaired count is the repaired fraction of that, also rounded down.
#[must_use]
pub fn repair_pips(repair_level: Fixed, repair_needed: Fixed) -> (u32, u32) {
    if repair_needed <= Fixed::ZERO {
        return (0, 0);
    }
    let total = (repair_needed / Fixed::from_num(PIPS_PER_REPAIR)).to_num::<u32>();
    // Integer maths on the raw bits: `total * repair_level` leaves the
    // fixed-point range long before either operand does.
    let level_bits = i128::from(repair_level.max(Fixed::ZERO).to_bits());
    let repaired = i128::from(total) * level_bits / i128::from(repair_needed.to_bits());
    let repaired = u32::try_from(repaired).unwrap_or(total).min(total);
    (total, repaired)
}

/// Status of the victory countdown widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VictoryView {
    /// Whether every machine is working and the clock is running.
    pub counting: bool,
    /// Whole seconds left, rounded up.
    pub seconds_remaining: u32,
}

/// Sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AudioCue {
    /// A character was selected.
    Select,
    /// A character was sent to a machine.
    Confirm,
    /// Something new is under the pointer.
    Highlight,
    /// A character walked into the factory.
    Entrance,
}

/// A single notification for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PresentationEvent {
    /// A character's display state changed.
    Character(CharacterView),
    /// A machine's display state changed.
    Machine(MachineView),
    /// Play a one-shot sound.
    Cue(AudioCue),
    /// Start or stop the looping repair sound.
    RepairLoop(bool),
    /// The victory widget changed.
    Victory(VictoryView),
}

/// Receiver for presentation notifications.
///
/// Every method defaults to doing nothing, so implementors only handle
/// what they display.
pub trait Presenter {
    /// A character's display state changed.
    fn character_changed(&mut self, _view: &CharacterView) {}
    /// A machine's display state changed.
    fn machine_changed(&mut self, _view: &MachineView) {}
    /// Play a one-shot sound.
    fn play_cue(&mut self, _cue: AudioCue) {}
    /// Start or stop the looping repair sound.
    fn set_repair_loop(&mut self, _active: bool) {}
    /// The victory widget changed.
    fn victory_changed(&mut self, _view: &VictoryView) {}
}

impl PresentationEvent {
    /// Deliver this event to a presenter.
    pub fn dispatch<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        match self {
            Self::Character(view) => presenter.character_changed(view),
            Self::Machine(view) => presenter.machine_changed(view),
            Self::Cue(cue) => presenter.play_cue(*cue),
            Self::RepairLoop(active) => presenter.set_repair_loop(*active),
            Self::Victory(view) => presenter.victory_changed(view),
        }
    }
}

/// A presenter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn pips_follow_repair_fraction() {
        assert_eq!(repair_pips(fx(0), fx(100)), (20, 0));
        assert_eq!(repair_pips(fx(50), fx(100)), (20, 10));
        assert_eq!(repair_pips(fx(54), fx(100)), (20, 10));
        assert_eq!(repair_pips(fx(55), fx(100)), (20, 11));
        assert_eq!(repair_pips(fx(100), fx(100)), (20, 20));
    }

    #[test]
    fn pips_round_total_down() {
        assert_eq!(repair_pips(fx(12), fx(12)), (2, 2));
        assert_eq!(repair_pips(fx(3), fx(4)), (0, 0));
    }

    #[test]
    fn pips_stay_exact_for_large_machines() {
        assert_eq!(repair_pips(fx(200_000), fx(200_000)), (40_000, 40_000));
        assert_eq!(repair_pips(fx(100_000), fx(200_000)), (40_000, 20_000));
        assert_eq!(repair_pips(fx(-5), fx(200_000)), (40_000, 0));
    }

    #[derive(Default)]
    struct Counter {
        cues: Vec<AudioCue>,
        loops: Vec<bool>,
    }

    impl Presenter for Counter {
        fn play_cue(&mut self, cue: AudioCue) {
            self.cues.push(cue);
        }

        fn set_repair_loop(&mut self, active: bool) {
            self.loops.push(active);
        }
    }

    #[test]
    fn dispatch_routes_by_variant() {
        let mut counter = Counter::default();
        PresentationEvent::Cue(AudioCue::Select).dispatch(&mut counter);
        PresentationEvent::RepairLoop(true).dispatch(&mut counter);
        PresentationEvent::Victory(VictoryView {
            counting: true,
            seconds_remaining: 3,
        })
        .dispatch(&mut counter);
        assert_eq!(counter.cues, vec![AudioCue::Select]);
        assert_eq!(counter.loops, vec![true]);
    }
}
