//! # Fix-It Core
//!
//! Deterministic simulation core for the Fix-It Factory game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math (uses fixed-point)
//!
//! Hosts feed it one [`selection::FrameInput`] per tick and apply the
//! returned [`simulation::TickEvents`] to sprites, widgets and sound.
//!
//! ## Crate Structure
//!
//! - [`machine`] - Repair progress and decay
//! - [`character`] - Worker state
//! - [`selection`] - Pointer targeting and highlight
//! - [`session`] - Victory countdown and end conditions
//! - [`simulation`] - Core simulation loop
//! - [`presentation`] - Notifications for renderers and audio
//! - [`config`] - Tunables, factory layouts and scenarios
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod character;
pub mod components;
pub mod config;
pub mod error;
pub mod machine;
pub mod math;
pub mod presentation;
pub mod selection;
pub mod session;
pub mod simulation;
pub mod storage;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::character::{Activity, Character};
    pub use crate::components::*;
    pub use crate::config::{FactoryLayout, MachineSpec, Scenario, SessionConfig, TICK_RATE};
    pub use crate::error::{GameError, Result};
    pub use crate::machine::{Machine, RepairOutcome};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::presentation::{
        AudioCue, CharacterView, MachineView, NullPresenter, PresentationEvent, Presenter,
        VictoryView,
    };
    pub use crate::selection::FrameInput;
    pub use crate::session::SessionOutcome;
    pub use crate::simulation::{Simulation, TickEvents};
}
