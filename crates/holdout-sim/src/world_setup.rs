//! Level and player setup at simulation start.

use glam::Vec2;

use holdout_core::components::{Collision, Health, Transform};
use holdout_core::constants::*;
use holdout_core::enums::EntityKind;
use holdout_core::types::EntityId;
use holdout_grid::WorldGrid;
use holdout_procgen::{generate, GenerationResult};

use crate::config::SimConfig;
use crate::entities::EntityStore;

/// Allocate the grid and run procedural generation into it.
pub fn build_level(config: &SimConfig) -> (WorldGrid, GenerationResult) {
    let mut grid = WorldGrid::new(config.grid_width, config.grid_height);
    let generation = generate(&mut grid, &config.generation);
    // The presentation layer draws the whole grid at level start.
    grid.drain_dirty();
    (grid, generation)
}

/// Spawn the player at `pos`.
pub fn spawn_player(store: &mut EntityStore, pos: Vec2) -> EntityId {
    let id = store.create_entity(EntityKind::Player);
    let mut health = Health::new(PLAYER_MAX_HEALTH);
    health.invulnerability_on_hit = PLAYER_INVULNERABILITY_SECS;
    store.insert_bundle(
        id,
        (
            Transform::at(pos, PLAYER_RADIUS * 2.0, PLAYER_SPEED),
            health,
            Collision {
                radius: PLAYER_RADIUS,
            },
        ),
    );
    id
}
