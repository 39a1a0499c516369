//! Spawn controller: creates enemies from the type registry, within the
//! capacity limit, at positions chosen by the placement mode.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use holdout_core::components::*;
use holdout_core::constants::WALKABLE_SEARCH_RADIUS;
use holdout_core::enums::{EntityKind, SpawnPlacement};
use holdout_core::events::SimEvent;
use holdout_core::types::EntityId;
use holdout_enemy_ai::BehaviorTable;
use holdout_grid::WorldGrid;

use crate::config::{EnemyTypeDef, SimConfig};
use crate::entities::EntityStore;
use crate::hooks::SimEvents;

/// Called on each freshly spawned enemy before it first acts.
pub type SpawnHook = Box<dyn FnMut(&mut EntityStore, EntityId, &EnemyTypeDef)>;

/// Mutable world state a spawn touches.
pub struct SpawnEnv<'a> {
    pub store: &'a mut EntityStore,
    pub grid: &'a WorldGrid,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut SimEvents,
}

/// Pick one item by cumulative weight. Non-positive weights never win;
/// None when nothing has positive weight.
pub fn weighted_pick<'a, T>(
    items: &'a [T],
    weight: impl Fn(&T) -> f32,
    rng: &mut ChaCha8Rng,
) -> Option<&'a T> {
    let total: f32 = items.iter().map(&weight).filter(|w| *w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let roll = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last = None;
    for item in items {
        let w = weight(item);
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last = Some(item);
        if roll < cumulative {
            return Some(item);
        }
    }
    last
}

fn spawn_safe(grid: &WorldGrid, x: i32, y: i32) -> bool {
    grid.is_walkable(x, y) && !grid.is_blocked(x, y)
}

/// Move `pos` onto the nearest walkable tile when it lands on a blocked one.
fn redirect(grid: &WorldGrid, pos: Vec2) -> Vec2 {
    let Some(tile) = grid.world_to_tile(pos) else {
        return pos;
    };
    if spawn_safe(grid, tile.x as i32, tile.y as i32) {
        return pos;
    }
    let whole_grid = grid.width().max(grid.height()) as i32;
    grid.nearest_walkable(tile, WALKABLE_SEARCH_RADIUS)
        .or_else(|| grid.nearest_walkable(tile, whole_grid))
        .map(|c| grid.tile_center(c))
        .unwrap_or(pos)
}

/// Keep a point half a tile inside the world edge.
fn clamp_inside(grid: &WorldGrid, pos: Vec2) -> Vec2 {
    let bounds = grid.bounds();
    let margin = grid.tile_size() * 0.5;
    Vec2::new(
        pos.x.clamp(margin, (bounds.width - margin).max(margin)),
        pos.y.clamp(margin, (bounds.height - margin).max(margin)),
    )
}

pub struct SpawnController {
    registry: Vec<EnemyTypeDef>,
    behaviors: BehaviorTable,
    max_enemies: usize,
    placement: SpawnPlacement,
    on_spawned: Option<SpawnHook>,
}

impl SpawnController {
    pub fn new(
        registry: Vec<EnemyTypeDef>,
        behaviors: BehaviorTable,
        max_enemies: usize,
        placement: SpawnPlacement,
    ) -> Self {
        Self {
            registry,
            behaviors,
            max_enemies,
            placement,
            on_spawned: None,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.enemy_types.clone(),
            config.behaviors.clone(),
            config.max_enemies,
            config.placement,
        )
    }

    pub fn registry(&self) -> &[EnemyTypeDef] {
        &self.registry
    }

    pub fn enemy_type(&self, key: &str) -> Option<&EnemyTypeDef> {
        self.registry.iter().find(|t| t.key == key)
    }

    pub fn max_enemies(&self) -> usize {
        self.max_enemies
    }

    pub fn set_max_enemies(&mut self, max_enemies: usize) {
        self.max_enemies = max_enemies;
    }

    pub fn placement(&self) -> SpawnPlacement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: SpawnPlacement) {
        self.placement = placement;
    }

    /// Register the spawn-completed hook (difficulty scaling and the like).
    pub fn set_on_spawned(&mut self, hook: SpawnHook) {
        self.on_spawned = Some(hook);
    }

    pub fn remaining_capacity(&self, store: &EntityStore) -> usize {
        self.max_enemies.saturating_sub(store.enemy_count())
    }

    /// Known type and room for at least one more enemy.
    pub fn is_spawnable(&self, store: &EntityStore, type_key: &str) -> bool {
        self.enemy_type(type_key).is_some() && self.remaining_capacity(store) > 0
    }

    /// Spawn up to `count` enemies of one type, capped by capacity.
    /// Unknown types spawn nothing.
    pub fn spawn_enemy_type(&mut self, env: &mut SpawnEnv<'_>, type_key: &str, count: u32) -> u32 {
        let Some(index) = self.registry.iter().position(|t| t.key == type_key) else {
            warn!(type_key, "unknown enemy type, nothing spawned");
            return 0;
        };
        let allowed = (count as usize).min(self.remaining_capacity(env.store));
        for _ in 0..allowed {
            self.spawn_one(env, index);
        }
        allowed as u32
    }

    /// Spawn up to `count` enemies, each type rolled by spawn weight.
    pub fn spawn_batch(&mut self, env: &mut SpawnEnv<'_>, count: u32) -> u32 {
        let mut spawned = 0;
        for _ in 0..count {
            if self.remaining_capacity(env.store) == 0 {
                break;
            }
            let Some(index) = self.roll_type(env.rng) else {
                warn!("no enemy type has positive spawn weight");
                break;
            };
            self.spawn_one(env, index);
            spawned += 1;
        }
        spawned
    }

    fn roll_type(&self, rng: &mut ChaCha8Rng) -> Option<usize> {
        let picked = weighted_pick(&self.registry, |t| t.spawn_weight, rng)?;
        self.registry.iter().position(|t| std::ptr::eq(t, picked))
    }

    fn spawn_one(&mut self, env: &mut SpawnEnv<'_>, index: usize) -> EntityId {
        let pos = self.place(env);
        let def = &self.registry[index];
        let tuning = self.behaviors.tuning_for(&def.key);

        let size = if def.size_variance > 0.0 {
            def.size + env.rng.gen_range(-def.size_variance..=def.size_variance)
        } else {
            def.size
        }
        .max(1.0);

        let id = env.store.create_entity(EntityKind::Enemy);
        env.store.insert_bundle(
            id,
            (
                Transform::at(pos, size, def.speed),
                Health::new(def.health),
                Collision { radius: size * 0.5 },
                EnemyInfo {
                    type_key: def.key.clone(),
                    xp_reward: def.xp_reward,
                },
                Attack {
                    damage: def.damage,
                    cooldown: tuning.cooldown,
                    range: tuning.attack_radius,
                    timer: 0.0,
                    lock: tuning.lock,
                    lock_timer: 0.0,
                },
                Ai {
                    behavior: tuning.behavior,
                    move_speed: tuning.move_speed,
                    aggro_radius: tuning.aggro_radius,
                    attack_radius: tuning.attack_radius,
                    ideal_min: tuning.ideal_min,
                    ideal_max: tuning.ideal_max,
                    cooldown: tuning.cooldown,
                    cooldown_timer: 0.0,
                    lock: tuning.lock,
                    lock_timer: 0.0,
                    target: TargetPolicy::Player,
                    style: tuning.style,
                },
            ),
        );

        if let Some(hook) = self.on_spawned.as_mut() {
            hook(&mut *env.store, id, &self.registry[index]);
        }
        env.events.emit(SimEvent::EnemySpawned {
            id,
            type_key: self.registry[index].key.clone(),
        });
        id
    }

    /// Choose a spawn position for the current placement mode. Never a
    /// blocked tile while any walkable tile exists.
    pub fn place(&self, env: &mut SpawnEnv<'_>) -> Vec2 {
        let grid = env.grid;
        match self.placement {
            SpawnPlacement::RandomWorld => random_world(env),
            SpawnPlacement::AroundPlayer {
                min_radius,
                max_radius,
            } => {
                let bounds = grid.bounds();
                let center = env
                    .store
                    .player()
                    .and_then(|id| env.store.position(id))
                    .unwrap_or(Vec2::new(bounds.width, bounds.height) * 0.5);
                let (lo, hi) = (min_radius.min(max_radius), min_radius.max(max_radius));
                let angle = env.rng.gen_range(0.0..TAU);
                let radius = if hi > lo {
                    env.rng.gen_range(lo..=hi)
                } else {
                    lo
                };
                redirect(grid, clamp_inside(grid, center + Vec2::from_angle(angle) * radius))
            }
            SpawnPlacement::RandomWalkableTile { max_retries } => {
                if grid.is_empty() {
                    return random_world(env);
                }
                for _ in 0..max_retries {
                    let x = env.rng.gen_range(0..grid.width()) as i32;
                    let y = env.rng.gen_range(0..grid.height()) as i32;
                    if spawn_safe(grid, x, y) {
                        return grid.tile_center(holdout_core::types::TileCoord::new(
                            x as u32, y as u32,
                        ));
                    }
                }
                random_world(env)
            }
        }
    }
}

fn random_world(env: &mut SpawnEnv<'_>) -> Vec2 {
    let bounds = env.grid.bounds();
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Vec2::ZERO;
    }
    let pos = Vec2::new(
        env.rng.gen_range(0.0..bounds.width),
        env.rng.gen_range(0.0..bounds.height),
    );
    redirect(env.grid, pos)
}
