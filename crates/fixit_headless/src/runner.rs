//! Headless game runner implementation.

use std::io::Write;

use fixit_core::config::{Scenario, TICK_RATE};
use fixit_core::error::GameError;
use fixit_core::math::{fixed_decimal, Fixed};
use fixit_core::presentation::{
    AudioCue, CharacterView, MachineView, PresentationEvent, Presenter, VictoryView,
};
use fixit_core::session::SessionOutcome;
use fixit_core::simulation::{Simulation, TickEvents};
use serde::Serialize;
use thiserror::Error;

use crate::autopilot::Autopilot;

/// Error type for headless runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// The scenario could not start a session.
    #[error("Failed to start session: {0}")]
    Core(#[from] GameError),
    /// Writing trace output failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding trace output failed.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// Tick rate of zero.
    #[error("Tick rate must be at least 1 Hz")]
    InvalidTickRate,
}

/// Headless runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Give up after this many ticks.
    pub max_ticks: u64,
    /// Fixed steps per simulated second.
    pub tick_rate: u32,
    /// Write every presentation event as a JSON line.
    pub trace: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_ticks: 6000,
            tick_rate: TICK_RATE,
            trace: false,
        }
    }
}

/// Presenter that forwards everything to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn character_changed(&mut self, view: &CharacterView) {
        tracing::trace!(
            character = %view.id,
            moving = view.moving,
            repairing = view.repairing,
            selected = view.selected,
            dancing = view.dancing,
            "Worker changed"
        );
    }

    fn machine_changed(&mut self, view: &MachineView) {
        tracing::trace!(
            machine = %view.id,
            broken = view.broken,
            pips = format!("{}/{}", view.pips_repaired, view.pips_total),
            "Machine changed"
        );
    }

    fn play_cue(&mut self, cue: AudioCue) {
        tracing::trace!(?cue, "Cue");
    }

    fn set_repair_loop(&mut self, active: bool) {
        tracing::debug!(active, "Repair loop");
    }

    fn victory_changed(&mut self, view: &VictoryView) {
        tracing::debug!(
            counting = view.counting,
            seconds_remaining = view.seconds_remaining,
            "Victory countdown"
        );
    }
}

/// One line of `--trace` output.
#[derive(Serialize)]
struct TraceLine<'a> {
    tick: u64,
    event: &'a PresentationEvent,
}

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// How the session ended, if it did.
    pub outcome: Option<SessionOutcome>,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    #[serde(with = "fixed_decimal")]
    pub elapsed_seconds: Fixed,
    /// Workers on the floor at the end.
    pub characters: usize,
    /// Machines fixed at least once.
    pub machines_fixed: usize,
    /// Machines in the factory.
    pub machines_total: usize,
    /// Final state hash.
    pub state_hash: u64,
}

/// Plays one scenario to completion with the autopilot.
pub struct HeadlessRunner {
    sim: Simulation,
    scenario: String,
    autopilot: Autopilot,
    config: RunConfig,
    dt: Fixed,
    presenter: LogPresenter,
}

impl HeadlessRunner {
    /// Start a session for `scenario`.
    ///
    /// # Errors
    ///
    /// Fails if the tick rate is zero or the scenario cannot start a session.
    pub fn new(scenario: &Scenario, config: RunConfig) -> Result<Self, RunError> {
        if config.tick_rate == 0 {
            return Err(RunError::InvalidTickRate);
        }
        let sim = Simulation::from_scenario(scenario)?;
        Ok(Self {
            sim,
            scenario: scenario.name.clone(),
            autopilot: Autopilot::new(),
            config,
            dt: Fixed::from_num(1) / Fixed::from_num(config.tick_rate),
            presenter: LogPresenter,
        })
    }

    /// The running simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Advance one tick with the autopilot's input.
    pub fn step(&mut self) -> TickEvents {
        let input = self.autopilot.next_input(&self.sim);
        let events = self.sim.tick(self.dt, &input);
        events.present(&mut self.presenter);
        events
    }

    /// Run until the session ends or the tick budget is spent.
    ///
    /// With tracing enabled every presentation event is written to `out`
    /// as one JSON object per line.
    ///
    /// # Errors
    ///
    /// Fails only if writing trace output fails.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunSummary, RunError> {
        tracing::info!(
            scenario = %self.scenario,
            max_ticks = self.config.max_ticks,
            tick_rate = self.config.tick_rate,
            "Starting run"
        );

        let mut outcome = None;
        while self.sim.current_tick() < self.config.max_ticks {
            let events = self.step();
            if self.config.trace {
                for event in &events.presentation {
                    let line = TraceLine {
                        tick: events.tick,
                        event,
                    };
                    serde_json::to_writer(&mut *out, &line)?;
                    writeln!(out)?;
                }
            }
            if events.outcome.is_some() {
                outcome = events.outcome;
                break;
            }
        }
        out.flush()?;

        let summary = self.summary(outcome);
        tracing::info!(
            outcome = ?summary.outcome,
            ticks = summary.ticks,
            machines_fixed = summary.machines_fixed,
            "Run finished"
        );
        Ok(summary)
    }

    fn summary(&self, outcome: Option<SessionOutcome>) -> RunSummary {
        RunSummary {
            scenario: self.scenario.clone(),
            outcome,
            ticks: self.sim.current_tick(),
            elapsed_seconds: self.sim.session().elapsed(),
            characters: self.sim.character_count(),
            machines_fixed: self.sim.machines_fixed_once(),
            machines_total: self.sim.machines().count(),
            state_hash: self.sim.state_hash(),
        }
    }
}
