//! Enemy AI for HOLDOUT.
//!
//! Pure steering and attack-gating functions for chaser, brute and spitter
//! enemies, plus the per-type tuning table the spawner draws from.

pub mod behavior;
pub mod profiles;

pub use holdout_core as core;

pub use behavior::{evaluate, BehaviorContext, BehaviorUpdate, SteeringMode};
pub use profiles::{get_profile, AiTuning, BehaviorProfile, BehaviorTable};

#[cfg(test)]
mod tests;
