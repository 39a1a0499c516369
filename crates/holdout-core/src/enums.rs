//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Top-level actor category. Drives which type-indexed list an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Pickup,
}

/// Terrain category of a grid cell, independent of overlay state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileBase {
    #[default]
    Empty = 0,
    Dirt = 1,
    Stone = 2,
    Floor = 3,
    Wall = 4,
    Water = 5,
    Void = 6,
}

impl TileBase {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => TileBase::Dirt,
            2 => TileBase::Stone,
            3 => TileBase::Floor,
            4 => TileBase::Wall,
            5 => TileBase::Water,
            6 => TileBase::Void,
            _ => TileBase::Empty,
        }
    }

    /// Base RGB color used by presentation layers (0xRRGGBB).
    pub fn color(self) -> u32 {
        match self {
            TileBase::Empty => 0x000000,
            TileBase::Dirt => 0x6b4f2a,
            TileBase::Stone => 0x6e6e73,
            TileBase::Floor => 0x2b2d33,
            TileBase::Wall => 0x4a4e5a,
            TileBase::Water => 0x1f4e79,
            TileBase::Void => 0x050507,
        }
    }
}

/// Transient tile overlay. Expires after its time-to-live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileEffect {
    #[default]
    None = 0,
    Scorch = 1,
    Acid = 2,
    Spark = 3,
    Debris = 4,
}

impl TileEffect {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => TileEffect::Scorch,
            2 => TileEffect::Acid,
            3 => TileEffect::Spark,
            4 => TileEffect::Debris,
            _ => TileEffect::None,
        }
    }

    /// Overlay tint (0xRRGGBB), or `None` when no overlay is drawn.
    pub fn tint(self) -> Option<u32> {
        match self {
            TileEffect::None => None,
            TileEffect::Scorch => Some(0x3a1a0a),
            TileEffect::Acid => Some(0x5fbf3f),
            TileEffect::Spark => Some(0xffd75f),
            TileEffect::Debris => Some(0x8a7f70),
        }
    }
}

/// Enemy movement/attack behavior variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiBehavior {
    /// Runs straight at the target, melee on contact.
    #[default]
    Chaser,
    /// Slow heavy melee attacker.
    Brute,
    /// Keeps an ideal distance band and fires projectiles.
    Spitter,
}

/// How an enemy's attack trigger is resolved by the orchestrating layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttackStyle {
    /// Direct damage to the target when within range.
    #[default]
    Melee,
    /// Spawns an enemy-origin projectile of the named type.
    Ranged { projectile: String },
}

/// Pickup category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Xp,
    OreCommon,
    OreRare,
}

/// Status effect kind with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatusKind {
    /// Movement multiplier capped at `1 - percent`.
    Slow { percent: f32 },
    /// Damage over time.
    Burn { dps: f32 },
    /// Damage over time.
    Poison { dps: f32 },
    /// No movement.
    Freeze,
    /// No movement.
    Stun,
}

impl StatusKind {
    /// Whether this effect fully immobilises its target.
    pub fn immobilises(&self) -> bool {
        matches!(self, StatusKind::Freeze | StatusKind::Stun)
    }

    /// Damage per second for damage-over-time kinds.
    pub fn dps(&self) -> f32 {
        match self {
            StatusKind::Burn { dps } | StatusKind::Poison { dps } => *dps,
            _ => 0.0,
        }
    }
}

/// Status-effect descriptor carried by projectiles and attacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSpec {
    pub kind: StatusKind,
    /// Duration in seconds.
    pub duration: f32,
}

impl StatusSpec {
    pub fn new(kind: StatusKind, duration: f32) -> Self {
        Self { kind, duration }
    }
}

/// Where the spawn controller places new enemies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpawnPlacement {
    /// Uniform random world position, redirected to a walkable tile if needed.
    RandomWorld,
    /// Random angle around the player at a radius in `[min_radius, max_radius]`.
    AroundPlayer { min_radius: f32, max_radius: f32 },
    /// Random walkable tile with a bounded number of retries.
    RandomWalkableTile { max_retries: u32 },
}

impl Default for SpawnPlacement {
    fn default() -> Self {
        SpawnPlacement::AroundPlayer {
            min_radius: crate::constants::SPAWN_RING_MIN,
            max_radius: crate::constants::SPAWN_RING_MAX,
        }
    }
}
