//! Procedural level generation for HOLDOUT.
//!
//! Produces a playable grid from a seed: jagged borders, scattered
//! obstacle blobs, a cleared safe zone, carved ring corridors and a
//! solid outer wall, retried until enough of the map is reachable.

pub use holdout_core as core;

pub mod config;
pub mod connectivity;
pub mod generator;

pub use config::GenerationConfig;
pub use connectivity::flood_fill;
pub use generator::{generate, GenerationResult};
