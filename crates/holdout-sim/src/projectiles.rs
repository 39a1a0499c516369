//! Projectile manager: a pooled arena of projectile records with
//! wall sampling, circle hit tests, pierce and chaining.
//!
//! Slots are recycled through a free list. Every acquire and release goes
//! through [`Projectile::reset`], so no hit set, effect list or chain count
//! survives into the next spawn.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use holdout_core::components::Collision;
use holdout_core::constants::PROJECTILE_SAMPLE_OFFSETS;
use holdout_core::enums::StatusSpec;
use holdout_core::events::SimEvent;
use holdout_core::types::{EntityId, ProjectileId, TileCoord};
use holdout_grid::WorldGrid;

use crate::combat::CombatSystem;
use crate::config::{ProjectileTypeDef, SimConfig};
use crate::entities::EntityStore;
use crate::hooks::SimEvents;

/// Which side fired a projectile. Player shots test enemies, enemy shots
/// test the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOrigin {
    #[default]
    Player,
    Enemy,
}

/// Who fired: the attributed entity and its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shooter {
    pub source: Option<EntityId>,
    pub origin: ProjectileOrigin,
}

impl Shooter {
    pub fn player(source: Option<EntityId>) -> Self {
        Self {
            source,
            origin: ProjectileOrigin::Player,
        }
    }

    pub fn enemy(source: Option<EntityId>) -> Self {
        Self {
            source,
            origin: ProjectileOrigin::Enemy,
        }
    }
}

/// Per-spawn overrides layered over the type's base stats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnOptions {
    pub speed: Option<f32>,
    pub damage: Option<f32>,
    pub lifetime: Option<f32>,
    /// Multiplies both visual size and collision radius.
    pub size_scale: Option<f32>,
    pub statuses: Option<Vec<StatusSpec>>,
    pub pierce: Option<u32>,
    pub chains: Option<u32>,
    pub chain_range: Option<f32>,
    pub color: Option<u32>,
}

/// One pooled projectile record.
#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub id: ProjectileId,
    pub type_key: String,
    pub source: Option<EntityId>,
    pub origin: ProjectileOrigin,
    pub position: Vec2,
    /// Unit vector.
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    /// Seconds left before expiry.
    pub lifetime: f32,
    pub size: f32,
    pub size_scale: f32,
    pub radius: f32,
    pub pierce: u32,
    pub hit: BTreeSet<EntityId>,
    pub statuses: Vec<StatusSpec>,
    pub chains: u32,
    pub chain_range: f32,
    pub color: u32,
    pub wall_damage: i32,
    pub active: bool,
}

impl Projectile {
    /// Clear every per-spawn field. Keeps allocations for reuse.
    pub fn reset(&mut self) {
        self.id = ProjectileId::default();
        self.type_key.clear();
        self.source = None;
        self.origin = ProjectileOrigin::default();
        self.position = Vec2::ZERO;
        self.direction = Vec2::ZERO;
        self.speed = 0.0;
        self.damage = 0.0;
        self.lifetime = 0.0;
        self.size = 0.0;
        self.size_scale = 1.0;
        self.radius = 0.0;
        self.pierce = 0;
        self.hit.clear();
        self.statuses.clear();
        self.chains = 0;
        self.chain_range = 0.0;
        self.color = 0;
        self.wall_damage = 0;
        self.active = false;
    }
}

/// What happened during one `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectileReport {
    /// Walls destroyed by player projectiles, in order.
    pub walls_destroyed: Vec<TileCoord>,
    pub hits: u32,
    pub chains_spawned: u32,
}

/// A follow-up projectile requested by a chaining hit, spawned after the
/// step's loop so the pool is never reshaped mid-iteration.
struct ChainSpawn {
    type_key: String,
    position: Vec2,
    direction: Vec2,
    shooter: Shooter,
    options: SpawnOptions,
    hit: BTreeSet<EntityId>,
}

pub struct ProjectileManager {
    types: Vec<ProjectileTypeDef>,
    slots: Vec<Projectile>,
    free: Vec<usize>,
    /// Active slot indices, oldest first.
    active: Vec<usize>,
    max_active: usize,
    evict_oldest: bool,
    next_id: u32,
}

impl ProjectileManager {
    pub fn new(types: Vec<ProjectileTypeDef>, max_active: usize, evict_oldest: bool) -> Self {
        Self {
            types,
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
            max_active,
            evict_oldest,
            next_id: 1,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.projectile_types.clone(),
            config.max_projectiles,
            config.evict_oldest_projectile,
        )
    }

    pub fn projectile_type(&self, key: &str) -> Option<&ProjectileTypeDef> {
        self.types.iter().find(|t| t.key == key)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Records allocated so far, active or free.
    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Projectile> + '_ {
        self.active.iter().map(move |&i| &self.slots[i])
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.iter_active().find(|p| p.id == id)
    }

    /// Release every active projectile.
    pub fn clear(&mut self) {
        for idx in std::mem::take(&mut self.active) {
            self.slots[idx].reset();
            self.free.push(idx);
        }
    }

    /// Spawn a projectile of `type_key` at `position` heading along
    /// `direction`. None for an unknown type, a zero-length direction, or
    /// a full pool without eviction.
    pub fn spawn(
        &mut self,
        type_key: &str,
        position: Vec2,
        direction: Vec2,
        shooter: Shooter,
        options: SpawnOptions,
    ) -> Option<ProjectileId> {
        self.spawn_slot(type_key, position, direction, shooter, options)
            .map(|idx| self.slots[idx].id)
    }

    fn spawn_slot(
        &mut self,
        type_key: &str,
        position: Vec2,
        direction: Vec2,
        shooter: Shooter,
        options: SpawnOptions,
    ) -> Option<usize> {
        let Some(direction) = direction.try_normalize() else {
            warn!(type_key, "zero-length projectile direction, not spawned");
            return None;
        };
        let Some(type_index) = self.types.iter().position(|t| t.key == type_key) else {
            warn!(type_key, "unknown projectile type, not spawned");
            return None;
        };
        let idx = self.acquire()?;

        let def = &self.types[type_index];
        let p = &mut self.slots[idx];
        p.reset();
        p.id = ProjectileId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let scale = options.size_scale.unwrap_or(1.0).max(0.0);
        p.type_key.push_str(&def.key);
        p.source = shooter.source;
        p.origin = shooter.origin;
        p.position = position;
        p.direction = direction;
        p.speed = options.speed.unwrap_or(def.speed);
        p.damage = options.damage.unwrap_or(def.damage);
        p.lifetime = options.lifetime.unwrap_or(def.lifetime);
        p.size = def.size * scale;
        p.size_scale = scale;
        p.radius = def.radius * scale;
        p.pierce = options.pierce.unwrap_or(def.pierce);
        p.statuses = options.statuses.unwrap_or_else(|| def.statuses.clone());
        p.chains = options.chains.unwrap_or(def.chains);
        p.chain_range = options.chain_range.unwrap_or(def.chain_range);
        p.color = options.color.unwrap_or(def.color);
        p.wall_damage = def.wall_damage;
        p.active = true;

        self.active.push(idx);
        Some(idx)
    }

    /// A free slot, a new one under the cap, or the evicted oldest.
    fn acquire(&mut self) -> Option<usize> {
        if self.active.len() >= self.max_active {
            if !self.evict_oldest || self.active.is_empty() {
                return None;
            }
            let oldest = self.active.remove(0);
            debug!(id = self.slots[oldest].id.0, "projectile cap reached, evicting oldest");
            self.slots[oldest].reset();
            self.free.push(oldest);
        }
        if let Some(idx) = self.free.pop() {
            return Some(idx);
        }
        self.slots.push(Projectile::default());
        Some(self.slots.len() - 1)
    }

    fn release(&mut self, idx: usize) {
        if let Some(pos) = self.active.iter().position(|&i| i == idx) {
            self.active.remove(pos);
        }
        self.slots[idx].reset();
        self.free.push(idx);
    }

    /// Advance every active projectile and resolve its wall and target hits.
    pub fn update(
        &mut self,
        dt: f32,
        grid: &mut WorldGrid,
        store: &mut EntityStore,
        combat: &mut CombatSystem,
        events: &mut SimEvents,
    ) -> ProjectileReport {
        let mut resolver = Resolver {
            grid,
            store,
            combat,
            events,
            report: ProjectileReport::default(),
            chains: Vec::new(),
        };

        let mut finished = Vec::new();
        for &idx in &self.active {
            let p = &mut self.slots[idx];
            if p.active && !resolver.advance(p, dt) {
                finished.push(idx);
            }
        }

        let Resolver {
            mut report, chains, ..
        } = resolver;
        for idx in finished {
            self.release(idx);
        }
        for chain in chains {
            if let Some(idx) = self.spawn_slot(
                &chain.type_key,
                chain.position,
                chain.direction,
                chain.shooter,
                chain.options,
            ) {
                self.slots[idx].hit = chain.hit;
                report.chains_spawned += 1;
            }
        }
        report
    }
}

/// Borrowed world state for one projectile pass.
struct Resolver<'a> {
    grid: &'a mut WorldGrid,
    store: &'a mut EntityStore,
    combat: &'a mut CombatSystem,
    events: &'a mut SimEvents,
    report: ProjectileReport,
    chains: Vec<ChainSpawn>,
}

impl Resolver<'_> {
    /// Move one projectile. Returns false once it is spent.
    fn advance(&mut self, p: &mut Projectile, dt: f32) -> bool {
        p.lifetime -= dt;
        if p.lifetime <= 0.0 {
            return false;
        }
        p.position += p.direction * p.speed * dt;
        if self.blocked_by_wall(p) {
            return false;
        }
        self.resolve_hits(p)
    }

    /// Sample the center and four radius offsets against the grid.
    /// Player shots chip destructible walls and fly on unless the wall
    /// breaks; everything else stops at the first solid sample.
    fn blocked_by_wall(&mut self, p: &Projectile) -> bool {
        let bounds = self.grid.bounds();
        let mut damaged: Vec<TileCoord> = Vec::new();

        for (ox, oy) in PROJECTILE_SAMPLE_OFFSETS {
            let sample = p.position + Vec2::new(ox, oy) * p.radius;
            if !bounds.contains(sample) {
                return true;
            }
            let Some(tile) = self.grid.world_to_tile(sample) else {
                return true;
            };
            let (x, y) = (tile.x as i32, tile.y as i32);
            if !self.grid.is_blocked(x, y) {
                continue;
            }
            if p.origin != ProjectileOrigin::Player || !self.grid.is_destructible(x, y) {
                return true;
            }
            if damaged.contains(&tile) {
                continue;
            }
            damaged.push(tile);
            if self.grid.damage_wall_tile(x, y, p.wall_damage) {
                debug!(x, y, "wall destroyed by projectile");
                self.events.emit(SimEvent::WallDestroyed { tile });
                self.report.walls_destroyed.push(tile);
                return true;
            }
        }
        false
    }

    /// Hit-test the opposing side. Returns false once the projectile is spent.
    fn resolve_hits(&mut self, p: &mut Projectile) -> bool {
        let targets: Vec<EntityId> = match p.origin {
            ProjectileOrigin::Player => self.store.enemy_ids_snapshot(),
            ProjectileOrigin::Enemy => self.store.player().into_iter().collect(),
        };

        for target in targets {
            if p.hit.contains(&target) {
                continue;
            }
            let Some(target_pos) = self.store.position(target) else {
                continue;
            };
            let Some(radius) = self.store.component::<Collision>(target).map(|c| c.radius) else {
                continue;
            };
            let reach = p.radius + radius;
            if target_pos.distance_squared(p.position) > reach * reach {
                continue;
            }

            self.combat
                .apply_damage(self.store, self.events, target, p.damage, p.source);
            for spec in &p.statuses {
                if self.store.is_alive(target) {
                    self.combat.apply_status(self.store, target, *spec, p.source);
                }
            }
            p.hit.insert(target);
            self.report.hits += 1;

            if self.try_chain(p, target_pos) {
                return false;
            }
            if p.pierce > 0 {
                p.pierce -= 1;
                continue;
            }
            return false;
        }
        true
    }

    /// Queue a follow-up toward the nearest unhit enemy near the struck
    /// target. Chains only jump between enemies.
    fn try_chain(&mut self, p: &Projectile, from: Vec2) -> bool {
        if p.chains == 0 || p.origin != ProjectileOrigin::Player {
            return false;
        }
        let Some((_, next_pos)) = self
            .store
            .nearest_enemy(from, p.chain_range, |id| p.hit.contains(&id))
        else {
            return false;
        };
        let toward = next_pos - from;
        let direction = if toward.length_squared() > f32::EPSILON {
            toward
        } else {
            p.direction
        };

        self.chains.push(ChainSpawn {
            type_key: p.type_key.clone(),
            position: from,
            direction,
            shooter: Shooter {
                source: p.source,
                origin: p.origin,
            },
            options: SpawnOptions {
                speed: Some(p.speed),
                damage: Some(p.damage),
                lifetime: None,
                size_scale: Some(p.size_scale),
                statuses: Some(p.statuses.clone()),
                pierce: Some(p.pierce),
                chains: Some(p.chains - 1),
                chain_range: Some(p.chain_range),
                color: Some(p.color),
            },
            hit: p.hit.clone(),
        });
        true
    }
}
