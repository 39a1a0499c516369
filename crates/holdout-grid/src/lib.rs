//! World grid for HOLDOUT.
//!
//! Packed per-tile storage with wall durability, transient overlays,
//! dirty-tile tracking and weak occupancy lists for spatial queries.

pub use holdout_core as core;

pub mod grid;
pub mod tile;

// Re-export key types for convenience.
pub use grid::WorldGrid;
pub use tile::{Tile, TileFlags, TileState};
