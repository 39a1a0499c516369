//! ECS components for hecs entities.
//!
//! Components are plain data structs. Each is one capability an entity may
//! carry; an absent component means the matching behavior is skipped.
//! Game logic lives in the simulation systems, not here.

use std::ops::BitOr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::EntityId;

/// Capability bit set carried on every entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityFlags(u8);

impl EntityFlags {
    pub const COLLIDABLE: Self = Self(1 << 0);
    pub const MOVABLE: Self = Self(1 << 1);
    pub const DAMAGEABLE: Self = Self(1 << 2);
    pub const HOSTILE: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for EntityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Identity record attached to every entity the store creates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Cleared on removal; inactive entities are skipped by every system.
    pub active: bool,
    pub flags: EntityFlags,
}

/// Names of the attachable components, for by-name capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Health,
    Collision,
    Attack,
    Ai,
    EnemyInfo,
    Pickup,
}

/// Kinematic state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position (world units).
    pub position: Vec2,
    /// World units per second.
    pub velocity: Vec2,
    /// Visual size (diameter, world units).
    pub size: f32,
    /// Live scalar move speed. Status effects rewrite this every tick.
    pub speed: f32,
    /// Unit facing vector.
    pub facing: Vec2,
}

impl Transform {
    pub fn at(position: Vec2, size: f32, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
            speed,
            facing: Vec2::X,
        }
    }
}

/// Hit points. `current` is kept within `[0, max]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub max: f32,
    pub current: f32,
    /// Remaining invulnerability (seconds). Damage is ignored while > 0.
    pub invulnerable_secs: f32,
    /// Invulnerability granted after each successful hit (seconds).
    pub invulnerability_on_hit: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            max,
            current: max,
            invulnerable_secs: 0.0,
            invulnerability_on_hit: 0.0,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_secs > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Circle used for hit tests and spatial queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collision {
    pub radius: f32,
}

/// Attack capability and its timers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attack {
    pub damage: f32,
    /// Cooldown duration between triggers (seconds).
    pub cooldown: f32,
    /// Reach (world units).
    pub range: f32,
    /// Countdown until the attack can trigger again.
    pub timer: f32,
    /// Lock applied after a trigger (seconds).
    pub lock: f32,
    /// Countdown of the post-trigger lock.
    pub lock_timer: f32,
}

impl Attack {
    pub fn ready(&self) -> bool {
        self.timer <= 0.0 && self.lock_timer <= 0.0
    }
}

/// How an AI picks what to chase. The orchestration layer resolves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TargetPolicy {
    /// The live player (default fallback).
    #[default]
    Player,
    /// A specific entity; falls back to the player once it is gone.
    Entity { id: EntityId },
    /// A fixed world point.
    Point { x: f32, y: f32 },
}

/// Enemy behavior state and tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ai {
    pub behavior: AiBehavior,
    /// Multiplier applied to `Transform::speed`.
    pub move_speed: f32,
    /// Beyond this distance the enemy halts.
    pub aggro_radius: f32,
    /// Within this distance the enemy may attack.
    pub attack_radius: f32,
    /// Spitters back off when closer than this.
    pub ideal_min: f32,
    /// Spitters hold still between `ideal_min` and this.
    pub ideal_max: f32,
    pub cooldown: f32,
    pub cooldown_timer: f32,
    pub lock: f32,
    pub lock_timer: f32,
    pub target: TargetPolicy,
    pub style: AttackStyle,
}

/// Enemy subtype and reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyInfo {
    pub type_key: String,
    pub xp_reward: u32,
}

/// Collectible payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub value: u32,
}
