//! Notifications emitted by the simulation for presentation, audio and
//! progression layers. Collected per step and drained into the snapshot.

use serde::{Deserialize, Serialize};

use crate::enums::{EntityKind, PickupKind};
use crate::types::{EntityId, TileCoord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// An enemy finished spawning.
    EnemySpawned { id: EntityId, type_key: String },
    /// An enemy's attack triggered.
    EnemyAttack { enemy: EntityId, dx: f32, dy: f32 },
    /// Damage landed on a target.
    DamageApplied {
        target: EntityId,
        amount: f32,
        remaining: f32,
    },
    /// A damageable entity reached zero health.
    EntityKilled {
        target: EntityId,
        kind: EntityKind,
        source: Option<EntityId>,
    },
    /// A wall tile was destroyed.
    WallDestroyed { tile: TileCoord },
    /// The player collected a pickup.
    PickupCollected { kind: PickupKind, value: u32 },
    /// A new wave began.
    WaveStarted { wave: u32 },
    /// A wave's duration elapsed (or it was skipped).
    WaveCompleted { wave: u32 },
    /// A timed wave event fired.
    WaveEventFired { wave: u32, label: String, spawned: u32 },
    /// All waves are done (non-endless).
    WavesFinished,
}
