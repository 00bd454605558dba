//! Headless session runner for CI and balance checks.
//!
//! Loads a scenario, lets a scripted player work the factory floor through
//! the same pointer input a person would use, and reports how the session
//! went.
//!
//! # Output
//!
//! - **stdout**: the run summary, plus presentation events as JSON lines
//!   when tracing is enabled
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Play the built-in factory floor
//! cargo run -p fixit_headless -- run
//!
//! # Play a scenario file and dump every presentation event
//! cargo run -p fixit_headless -- run --scenario assets/scenarios/factory_floor.ron --trace
//!
//! # Check a scenario file without playing it
//! cargo run -p fixit_headless -- validate --scenario my_floor.ron
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod autopilot;
pub mod runner;
pub mod scenario;

pub use autopilot::Autopilot;
pub use runner::{HeadlessRunner, LogPresenter, RunConfig, RunError, RunSummary};
pub use scenario::ScenarioError;
