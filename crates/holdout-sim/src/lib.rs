//! Simulation engine for HOLDOUT.
//!
//! Owns the hecs entity world, the tile grid and the wave, spawn, projectile
//! and combat subsystems, steps them in a fixed order and produces
//! SimSnapshots for the presentation layer.

pub mod combat;
pub mod config;
pub mod engine;
pub mod entities;
pub mod hooks;
pub mod projectiles;
pub mod spawner;
pub mod status;
pub mod systems;
pub mod waves;
pub mod world_setup;

pub use config::{ConfigError, SimConfig};
pub use engine::Simulation;
pub use holdout_core as core;

#[cfg(test)]
mod tests;
