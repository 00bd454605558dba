//! Session configuration and factory layout data.
//!
//! Pure data structures designed to be deserialized from RON. This module
//! performs no IO; reading scenario files from disk is the host's job.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "tiny",
//!     description: "One press, one door",
//!     session: (victory_duration: 10.0),
//!     layout: (
//!         factory_entry: (x: 0.0, z: -6.0),
//!         entry_points: [(x: 0.0, z: -4.0)],
//!         machines: [
//!             (name: "press", position: (x: 3.0, z: 3.0), rally_point: (x: 3.0, z: 1.5)),
//!         ],
//!     ),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal, option_fixed_decimal, Fixed, Vec3Fixed};

/// Ticks per second used by hosts that run a fixed step.
pub const TICK_RATE: u32 = 20;

/// Largest `repair_needed` a machine may ask for.
pub const MAX_REPAIR_NEEDED: i32 = 100_000;

/// Largest absolute value of any layout coordinate.
///
/// Keeps squared distances between any two points of the floor inside the
/// fixed-point range.
pub const MAX_COORDINATE: i32 = 10_000;

/// Tunables for one play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Character walking speed, units per second.
    #[serde(with = "fixed_decimal")]
    pub move_speed: Fixed,
    /// Distance at which a character counts as arrived.
    #[serde(with = "fixed_decimal")]
    pub arrival_distance: Fixed,
    /// Characters closer than this push each other apart.
    #[serde(with = "fixed_decimal")]
    pub repel_radius: Fixed,
    /// Repair applied per second by each working character.
    #[serde(with = "fixed_decimal")]
    pub repair_rate: Fixed,
    /// Maximum number of characters in the factory.
    pub population_cap: u32,
    /// Characters present when the session starts.
    pub initial_characters: u32,
    /// Seconds every machine must stay working to win.
    #[serde(with = "fixed_decimal")]
    pub victory_duration: Fixed,
    /// Seconds after a fix before a machine starts decaying.
    #[serde(with = "fixed_decimal")]
    pub grace_period: Fixed,
    /// Optional hard cap on session length, in seconds.
    #[serde(with = "option_fixed_decimal")]
    pub time_limit: Option<Fixed>,
    /// Pointer pick radius around a character.
    #[serde(with = "fixed_decimal")]
    pub character_pick_radius: Fixed,
    /// Pointer pick radius around a machine.
    #[serde(with = "fixed_decimal")]
    pub machine_pick_radius: Fixed,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            move_speed: Fixed::from_num(1),
            arrival_distance: Fixed::from_num(1),
            repel_radius: Fixed::from_num(0.75),
            repair_rate: Fixed::from_num(10),
            population_cap: 8,
            initial_characters: 1,
            victory_duration: Fixed::from_num(30),
            grace_period: Fixed::from_num(5),
            time_limit: None,
            character_pick_radius: Fixed::from_num(0.5),
            machine_pick_radius: Fixed::from_num(1.5),
        }
    }
}

/// One machine on the factory floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Display name.
    pub name: String,
    /// Where the machine stands (used for picking).
    pub position: Vec3Fixed,
    /// Where workers stand while repairing it.
    pub rally_point: Vec3Fixed,
    /// Repair needed to bring it from broken to working.
    #[serde(with = "fixed_decimal", default = "default_repair_needed")]
    pub repair_needed: Fixed,
    /// Repair lost per second once the grace period is over. Zero never decays.
    #[serde(with = "fixed_decimal", default)]
    pub break_rate: Fixed,
    /// Starting repair level. Machines below `repair_needed` start broken.
    #[serde(with = "fixed_decimal", default)]
    pub initial_repair: Fixed,
}

fn default_repair_needed() -> Fixed {
    Fixed::from_num(100)
}

impl MachineSpec {
    /// A broken, non-decaying machine whose rally point is its own position.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Vec3Fixed) -> Self {
        Self {
            name: name.into(),
            position,
            rally_point: position,
            repair_needed: default_repair_needed(),
            break_rate: Fixed::ZERO,
            initial_repair: Fixed::ZERO,
        }
    }

    /// Set the rally point.
    #[must_use]
    pub fn with_rally_point(mut self, rally_point: Vec3Fixed) -> Self {
        self.rally_point = rally_point;
        self
    }

    /// Set the repair needed.
    #[must_use]
    pub fn with_repair_needed(mut self, repair_needed: Fixed) -> Self {
        self.repair_needed = repair_needed;
        self
    }

    /// Set the decay rate.
    #[must_use]
    pub fn with_break_rate(mut self, break_rate: Fixed) -> Self {
        self.break_rate = break_rate;
        self
    }

    /// Set the starting repair level.
    #[must_use]
    pub fn with_initial_repair(mut self, initial_repair: Fixed) -> Self {
        self.initial_repair = initial_repair;
        self
    }
}

/// Static layout of the factory, read once at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryLayout {
    /// Where new characters appear.
    pub factory_entry: Vec3Fixed,
    /// Waypoints unassigned characters walk to.
    pub entry_points: Vec<Vec3Fixed>,
    /// Every machine in the factory.
    pub machines: Vec<MachineSpec>,
}

/// A complete scenario: tunables plus layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Session tunables.
    #[serde(default)]
    pub session: SessionConfig,
    /// Factory layout.
    pub layout: FactoryLayout,
}

impl Scenario {
    /// Parse a scenario from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }
}

impl SessionConfig {
    /// Check the tunables for values the simulation cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.move_speed > Fixed::ZERO, "move_speed must be positive"),
            (
                self.arrival_distance > Fixed::ZERO,
                "arrival_distance must be positive",
            ),
            (
                self.repel_radius >= Fixed::ZERO,
                "repel_radius must not be negative",
            ),
            (
                self.repair_rate >= Fixed::ZERO,
                "repair_rate must not be negative",
            ),
            (self.population_cap > 0, "population_cap must be at least 1"),
            (
                self.initial_characters <= self.population_cap,
                "initial_characters exceeds population_cap",
            ),
            (
                self.victory_duration > Fixed::ZERO,
                "victory_duration must be positive",
            ),
            (
                self.grace_period >= Fixed::ZERO,
                "grace_period must not be negative",
            ),
            (
                self.time_limit.map_or(true, |limit| limit > Fixed::ZERO),
                "time_limit must be positive when set",
            ),
            (
                self.character_pick_radius >= Fixed::ZERO && self.machine_pick_radius >= Fixed::ZERO,
                "pick radii must not be negative",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(GameError::InvalidConfig((*message).to_string())),
            None => Ok(()),
        }
    }
}

impl FactoryLayout {
    /// Check the layout for missing or impossible entries.
    pub fn validate(&self) -> Result<()> {
        if self.entry_points.is_empty() {
            return Err(GameError::InvalidConfig(
                "layout needs at least one entry point".to_string(),
            ));
        }
        if self.machines.is_empty() {
            return Err(GameError::InvalidConfig(
                "layout needs at least one machine".to_string(),
            ));
        }
        check_point("factory_entry", self.factory_entry)?;
        for point in &self.entry_points {
            check_point("entry point", *point)?;
        }
        for spec in &self.machines {
            check_point(&spec.name, spec.position)?;
            check_point(&spec.name, spec.rally_point)?;
            if spec.repair_needed <= Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!(
                    "machine '{}' needs a positive repair_needed",
                    spec.name
                )));
            }
            if spec.repair_needed > Fixed::from_num(MAX_REPAIR_NEEDED) {
                return Err(GameError::InvalidConfig(format!(
                    "machine '{}' needs at most {MAX_REPAIR_NEEDED} repair",
                    spec.name
                )));
            }
            if spec.break_rate < Fixed::ZERO || spec.initial_repair < Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!(
                    "machine '{}' has a negative break_rate or initial_repair",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

fn check_point(what: &str, point: Vec3Fixed) -> Result<()> {
    let limit = Fixed::from_num(MAX_COORDINATE);
    if [point.x, point.y, point.z]
        .iter()
        .all(|c| (-limit..=limit).contains(c))
    {
        Ok(())
    } else {
        Err(GameError::InvalidConfig(format!(
            "{what} at ({}, {}, {}) is outside the floor (|coordinate| <= {MAX_COORDINATE})",
            point.x, point.y, point.z
        )))
    }
}

impl Scenario {
    /// Validate both the tunables and the layout.
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.layout.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"
        Scenario(
            name: "tiny",
            session: (victory_duration: 10.0, population_cap: 3),
            layout: (
                factory_entry: (x: 0.0, z: -6.0),
                entry_points: [(x: 0.0, z: -4.0)],
                machines: [
                    (name: "press", position: (x: 3.0, z: 3.0), rally_point: (x: 3.0, z: 1.5)),
                ],
            ),
        )
    "#;

    #[test]
    fn parses_with_defaults() {
        let scenario = Scenario::from_ron_str(TINY).unwrap();
        assert_eq!(scenario.session.victory_duration, Fixed::from_num(10));
        assert_eq!(scenario.session.population_cap, 3);
        assert_eq!(scenario.session.move_speed, Fixed::from_num(1));
        assert_eq!(scenario.layout.machines[0].repair_needed, Fixed::from_num(100));
        assert_eq!(scenario.layout.machines[0].break_rate, Fixed::ZERO);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn parse_errors_are_reported() {
        let err = Scenario::from_ron_str("Scenario(name: ").unwrap_err();
        assert!(matches!(err, GameError::ScenarioParse(_)));
    }

    #[test]
    fn empty_entry_points_rejected() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.layout.entry_points.clear();
        assert!(matches!(
            scenario.validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn initial_characters_above_cap_rejected() {
        let config = SessionConfig {
            population_cap: 2,
            initial_characters: 3,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_repair_needed_rejected() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.layout.machines[0].repair_needed = Fixed::from_num(MAX_REPAIR_NEEDED);
        assert!(scenario.validate().is_ok());

        scenario.layout.machines[0].repair_needed = Fixed::from_num(200_000);
        assert!(matches!(
            scenario.validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn far_away_points_rejected() {
        let far = Vec3Fixed::ground(Fixed::from_num(60_000), Fixed::ZERO);
        let edge = Vec3Fixed::ground(
            Fixed::from_num(-MAX_COORDINATE),
            Fixed::from_num(MAX_COORDINATE),
        );
        let base = Scenario::from_ron_str(TINY).unwrap();

        let mut scenario = base.clone();
        scenario.layout.machines[0].position = edge;
        scenario.layout.entry_points.push(edge);
        assert!(scenario.validate().is_ok());

        let edits: [fn(&mut FactoryLayout, Vec3Fixed); 4] = [
            |layout, p| layout.factory_entry = p,
            |layout, p| layout.entry_points.push(p),
            |layout, p| layout.machines[0].position = p,
            |layout, p| layout.machines[0].rally_point = p,
        ];
        for edit in edits {
            let mut scenario = base.clone();
            edit(&mut scenario.layout, far);
            assert!(matches!(
                scenario.validate(),
                Err(GameError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn zero_repair_needed_rejected() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.layout.machines[0].repair_needed = Fixed::ZERO;
        assert!(scenario.validate().is_err());
    }
}
