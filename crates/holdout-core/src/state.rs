//! Simulation snapshot: the visible state handed to external layers each step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::SimEvent;
use crate::types::{EntityId, ProjectileId, SimTime, TileCoord};

/// Complete state broadcast after each step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: SimTime,
    pub wave: WaveSnapshot,
    pub player: Option<ActorView>,
    pub enemies: Vec<ActorView>,
    pub pickups: Vec<PickupView>,
    pub projectiles: Vec<ProjectileView>,
    pub kill_count: u32,
    /// Tiles changed since the previous step.
    pub dirty_tiles: Vec<TileCoord>,
    pub events: Vec<SimEvent>,
}

/// Position and health of a player or enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorView {
    pub id: EntityId,
    pub position: Vec2,
    pub facing: Vec2,
    pub size: f32,
    pub health: f32,
    pub max_health: f32,
    /// Enemy subtype key; empty for the player.
    pub type_key: String,
    pub stunned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupView {
    pub id: EntityId,
    pub position: Vec2,
    pub kind: PickupKind,
    pub value: u32,
}

/// Render data for an active projectile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub position: Vec2,
    pub size: f32,
    pub color: u32,
    pub from_player: bool,
}

/// Preview of the next unconsumed timed wave event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPreview {
    pub label: String,
    /// Seconds until the event fires.
    pub in_secs: f32,
}

/// Read-only wave pacing state for HUD display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveSnapshot {
    /// 1-based wave number; 0 before the first wave.
    pub wave_number: u32,
    pub elapsed_secs: f32,
    pub time_remaining_secs: f32,
    pub budget: f32,
    pub budget_per_second: f32,
    pub in_intermission: bool,
    pub intermission_remaining_secs: f32,
    pub endless: bool,
    pub finished: bool,
    pub next_event: Option<EventPreview>,
}
