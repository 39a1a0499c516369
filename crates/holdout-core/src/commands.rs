//! Commands sent from the input/debug layers to the simulation.
//!
//! Commands are queued and applied at the next step boundary.

use serde::{Deserialize, Serialize};

/// Debug/test switches honoured by the combat system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugFlags {
    /// The player never takes damage.
    pub infinite_player_health: bool,
    /// Any damage to an enemy is lethal.
    pub one_hit_kill: bool,
    /// Log every damage application.
    pub log_damage: bool,
}

/// All possible external actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Player control ---
    /// Set the player's movement direction. A zero vector stops.
    MovePlayer { x: f32, y: f32 },
    /// Fire a projectile from the player toward a direction.
    /// `projectile` defaults to the stock player bolt.
    Fire {
        x: f32,
        y: f32,
        #[serde(default)]
        projectile: Option<String>,
    },

    // --- Debug / test surface ---
    /// Force-complete the active wave.
    SkipWave,
    /// Spawn a weighted-random batch of enemies.
    SpawnBatch { count: u32 },
    /// Remove every live enemy.
    ClearEnemies,
    /// Replace the debug flags.
    SetDebugFlags { flags: DebugFlags },
}
