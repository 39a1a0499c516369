//! Generation parameters.

use serde::{Deserialize, Serialize};

use holdout_core::constants::DEFAULT_WALL_DURABILITY;
use holdout_core::types::TileCoord;

/// Inputs to [`crate::generate`]. Identical config + grid size = identical level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: u64,
    /// Player spawn tile. Clamped inside the outer wall.
    pub spawn: TileCoord,
    /// Target fraction of the grid covered by walls before clearing.
    pub obstacle_density: f32,
    /// Radius (tiles) of the forced-floor disk around spawn.
    pub safe_zone_radius: u32,
    /// Number of ring corridors carved around spawn.
    pub carve_loop_count: u32,
    /// Brush radius (tiles) of the ring corridors.
    pub carve_loop_radius: u32,
    /// Radius step (tiles) between successive rings.
    pub carve_loop_spacing: u32,
    /// Fractional radius jitter of ring points.
    pub carve_loop_jitter: f32,
    /// Minimum jagged border thickness (tiles).
    pub edge_min_thickness: u32,
    /// Maximum jagged border thickness (tiles).
    pub edge_max_thickness: u32,
    /// Per-column chance that the border thickness random-walks.
    pub edge_jaggedness: f32,
    pub blob_radius_min: u32,
    pub blob_radius_max: u32,
    /// Per-tile edge jitter of obstacle blobs (0 = perfect discs).
    pub blob_edge_jitter: f32,
    /// Durability given to scattered obstacle walls.
    pub wall_durability: u8,
    /// Minimum reachable/total tile ratio to accept an attempt.
    pub required_connected_ratio: f32,
    pub max_attempts: u32,
    /// Extra radius beyond the safe zone excluded from spawnable tiles.
    pub spawnable_margin: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            spawn: TileCoord::new(32, 32),
            obstacle_density: 0.18,
            safe_zone_radius: 5,
            carve_loop_count: 3,
            carve_loop_radius: 1,
            carve_loop_spacing: 7,
            carve_loop_jitter: 0.15,
            edge_min_thickness: 1,
            edge_max_thickness: 4,
            edge_jaggedness: 0.5,
            blob_radius_min: 2,
            blob_radius_max: 4,
            blob_edge_jitter: 0.35,
            wall_durability: DEFAULT_WALL_DURABILITY,
            required_connected_ratio: 0.55,
            max_attempts: 6,
            spawnable_margin: 4,
        }
    }
}
