//! A presenter that remembers every notification.

use fixit_core::prelude::*;

/// Records everything it is told, in order, per channel.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    /// Character views received.
    pub characters: Vec<CharacterView>,
    /// Machine views received.
    pub machines: Vec<MachineView>,
    /// One-shot sounds played.
    pub cues: Vec<AudioCue>,
    /// Repair loop on/off switches.
    pub repair_loop: Vec<bool>,
    /// Victory widget updates.
    pub victory: Vec<VictoryView>,
}

impl RecordingPresenter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent view of a character.
    #[must_use]
    pub fn last_character(&self, id: CharacterId) -> Option<&CharacterView> {
        self.characters.iter().rev().find(|view| view.id == id)
    }

    /// The most recent view of a machine.
    #[must_use]
    pub fn last_machine(&self, id: MachineId) -> Option<&MachineView> {
        self.machines.iter().rev().find(|view| view.id == id)
    }

    /// How many times `cue` was played.
    #[must_use]
    pub fn cue_count(&self, cue: AudioCue) -> usize {
        self.cues.iter().filter(|played| **played == cue).count()
    }
}

impl Presenter for RecordingPresenter {
    fn character_changed(&mut self, view: &CharacterView) {
        self.characters.push(view.clone());
    }

    fn machine_changed(&mut self, view: &MachineView) {
        self.machines.push(view.clone());
    }

    fn play_cue(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }

    fn set_repair_loop(&mut self, active: bool) {
        self.repair_loop.push(active);
    }

    fn victory_changed(&mut self, view: &VictoryView) {
        self.victory.push(*view);
    }
}
