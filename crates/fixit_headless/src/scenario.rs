//! Scenario loading.
//!
//! Scenarios are RON files holding the session tunables and the factory
//! layout. One scenario ships with the binary so `run` works out of the box.

use std::path::Path;

use fixit_core::config::Scenario;
use fixit_core::error::GameError;
use thiserror::Error;

/// Name of the scenario used when no file is given.
pub const BUILTIN_SCENARIO: &str = "factory_floor";

const FACTORY_FLOOR_RON: &str = include_str!("../../../assets/scenarios/factory_floor.ron");

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(String),
    /// Parsed, but the session could not start with it.
    #[error("Invalid scenario: {0}")]
    Invalid(GameError),
}

impl From<GameError> for ScenarioError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::ScenarioParse(message) => Self::ParseError(message),
            other => Self::Invalid(other),
        }
    }
}

/// Load and validate a scenario from a RON file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let scenario = from_ron_str(&contents)?;
    tracing::debug!(path = %path.display(), name = %scenario.name, "Loaded scenario");
    Ok(scenario)
}

/// Parse and validate a scenario from RON text.
pub fn from_ron_str(ron: &str) -> Result<Scenario, ScenarioError> {
    let scenario = Scenario::from_ron_str(ron)?;
    scenario.validate()?;
    Ok(scenario)
}

/// The scenario embedded in the binary.
pub fn builtin() -> Result<Scenario, ScenarioError> {
    from_ron_str(FACTORY_FLOOR_RON)
}

/// Load `path` if given, otherwise the built-in scenario.
pub fn load_or_builtin(path: Option<&Path>) -> Result<Scenario, ScenarioError> {
    match path {
        Some(path) => load(path),
        None => builtin(),
    }
}
