//! Entity & component store.
//!
//! Wraps the hecs world with stable monotonic ids, type-indexed id lists
//! (player slot, enemies, pickups) and the per-tick kinematics/AI pass.

use std::collections::BTreeMap;

use glam::Vec2;
use hecs::{Component, Entity, World};

use holdout_core::components::*;
use holdout_core::enums::{AttackStyle, EntityKind};
use holdout_core::types::{EntityId, WorldBounds};
use holdout_enemy_ai::{evaluate, BehaviorContext};

/// Orchestration hooks the AI pass calls into.
///
/// `resolve_target` turns an AI's target policy into a position;
/// `trigger_attack` receives each attack the AI decides to make.
pub trait AiDirector {
    fn resolve_target(
        &self,
        store: &EntityStore,
        seeker: EntityId,
        policy: TargetPolicy,
    ) -> Option<Vec2>;

    fn trigger_attack(&mut self, enemy: EntityId, direction: Vec2, style: &AttackStyle);
}

/// Default resolution: the policy's target, falling back to the live player.
pub fn resolve_policy(store: &EntityStore, policy: TargetPolicy) -> Option<Vec2> {
    match policy {
        TargetPolicy::Player => store.player().and_then(|id| store.position(id)),
        TargetPolicy::Entity { id } => store
            .position(id)
            .or_else(|| resolve_policy(store, TargetPolicy::Player)),
        TargetPolicy::Point { x, y } => Some(Vec2::new(x, y)),
    }
}

fn default_flags(kind: EntityKind) -> EntityFlags {
    match kind {
        EntityKind::Player => EntityFlags::COLLIDABLE | EntityFlags::MOVABLE | EntityFlags::DAMAGEABLE,
        EntityKind::Enemy => {
            EntityFlags::COLLIDABLE
                | EntityFlags::MOVABLE
                | EntityFlags::DAMAGEABLE
                | EntityFlags::HOSTILE
        }
        EntityKind::Pickup => EntityFlags::COLLIDABLE,
    }
}

/// Owns every actor and its components.
pub struct EntityStore {
    world: World,
    handles: BTreeMap<EntityId, Entity>,
    next_id: u64,
    player: Option<EntityId>,
    enemies: Vec<EntityId>,
    pickups: Vec<EntityId>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            handles: BTreeMap::new(),
            next_id: 1,
            player: None,
            enemies: Vec::new(),
            pickups: Vec::new(),
        }
    }

    // --- Lifecycle ---

    /// Create an entity with a fresh id and file it under its kind.
    /// A new player replaces the previous occupant of the player slot.
    pub fn create_entity(&mut self, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let record = EntityRecord {
            id,
            kind,
            active: true,
            flags: default_flags(kind),
        };
        let entity = self.world.spawn((record,));
        self.handles.insert(id, entity);

        match kind {
            EntityKind::Player => self.player = Some(id),
            EntityKind::Enemy => self.enemies.push(id),
            EntityKind::Pickup => self.pickups.push(id),
        }
        id
    }

    /// Attach (or replace) a component. Returns false for unknown ids.
    pub fn insert<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        match self.handles.get(&id) {
            Some(&entity) => self.world.insert_one(entity, component).is_ok(),
            None => false,
        }
    }

    /// Attach several components at once.
    pub fn insert_bundle(&mut self, id: EntityId, bundle: impl hecs::DynamicBundle) -> bool {
        match self.handles.get(&id) {
            Some(&entity) => self.world.insert(entity, bundle).is_ok(),
            None => false,
        }
    }

    /// Despawn immediately and purge the id from every list.
    ///
    /// Callers iterating `enemies()` must iterate `enemy_ids_snapshot()`
    /// instead when removing inside the loop.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.handles.remove(&id) else {
            return false;
        };
        let _ = self.world.despawn(entity);
        if self.player == Some(id) {
            self.player = None;
        }
        self.enemies.retain(|e| *e != id);
        self.pickups.retain(|e| *e != id);
        true
    }

    /// Flag an entity inactive; it is skipped by every system until
    /// `reap_inactive` removes it.
    pub fn deactivate(&mut self, id: EntityId) {
        if let Some(mut record) = self.component_mut::<EntityRecord>(id) {
            record.active = false;
        }
    }

    /// Remove every entity flagged inactive. Returns how many were removed.
    pub fn reap_inactive(&mut self) -> usize {
        let inactive: Vec<EntityId> = self
            .world
            .query::<&EntityRecord>()
            .iter()
            .filter(|(_, record)| !record.active)
            .map(|(_, record)| record.id)
            .collect();
        for &id in &inactive {
            self.remove_entity(id);
        }
        inactive.len()
    }

    /// Remove every enemy without death handling. Returns how many.
    pub fn clear_enemies(&mut self) -> usize {
        let ids = self.enemy_ids_snapshot();
        for &id in &ids {
            self.remove_entity(id);
        }
        ids.len()
    }

    // --- Queries ---

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn enemies(&self) -> &[EntityId] {
        &self.enemies
    }

    pub fn pickups(&self) -> &[EntityId] {
        &self.pickups
    }

    /// Defensive copy of the enemy list, safe to iterate while removing.
    pub fn enemy_ids_snapshot(&self) -> Vec<EntityId> {
        self.enemies.clone()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn record(&self, id: EntityId) -> Option<EntityRecord> {
        self.component::<EntityRecord>(id).map(|r| *r)
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.record(id).map(|r| r.kind)
    }

    /// Exists and has not been deactivated.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_some_and(|r| r.active)
    }

    pub fn component<C: Component>(&self, id: EntityId) -> Option<hecs::Ref<'_, C>> {
        let entity = *self.handles.get(&id)?;
        self.world.get::<&C>(entity).ok()
    }

    pub fn component_mut<C: Component>(&mut self, id: EntityId) -> Option<hecs::RefMut<'_, C>> {
        let entity = *self.handles.get(&id)?;
        self.world.get::<&mut C>(entity).ok()
    }

    /// By-name capability query.
    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        let Some(&entity) = self.handles.get(&id) else {
            return false;
        };
        let Ok(entity) = self.world.entity(entity) else {
            return false;
        };
        match kind {
            ComponentKind::Transform => entity.has::<Transform>(),
            ComponentKind::Health => entity.has::<Health>(),
            ComponentKind::Collision => entity.has::<Collision>(),
            ComponentKind::Attack => entity.has::<Attack>(),
            ComponentKind::Ai => entity.has::<Ai>(),
            ComponentKind::EnemyInfo => entity.has::<EnemyInfo>(),
            ComponentKind::Pickup => entity.has::<Pickup>(),
        }
    }

    /// Position of a live entity with a Transform.
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        if !self.is_alive(id) {
            return None;
        }
        self.component::<Transform>(id).map(|t| t.position)
    }

    /// Collision radius, zero when the entity has no Collision component.
    pub fn collision_radius(&self, id: EntityId) -> f32 {
        self.component::<Collision>(id).map_or(0.0, |c| c.radius)
    }

    /// Nearest live enemy to `from` within `max_dist`, skipping ids `skip` rejects.
    /// Ties go to the earlier-spawned enemy.
    pub fn nearest_enemy(
        &self,
        from: Vec2,
        max_dist: f32,
        skip: impl Fn(EntityId) -> bool,
    ) -> Option<(EntityId, Vec2)> {
        let max_sq = max_dist * max_dist;
        let mut best: Option<(f32, EntityId, Vec2)> = None;
        for &id in &self.enemies {
            if skip(id) {
                continue;
            }
            let Some(pos) = self.position(id) else {
                continue;
            };
            let d = pos.distance_squared(from);
            if d <= max_sq && best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, id, pos));
            }
        }
        best.map(|(_, id, pos)| (id, pos))
    }

    // --- Per-tick update ---

    /// Integrate transforms, tick attack timers, then run enemy AI.
    pub fn update(&mut self, dt: f32, bounds: WorldBounds, director: &mut dyn AiDirector) {
        for (_entity, (record, transform)) in
            self.world.query_mut::<(&EntityRecord, &mut Transform)>()
        {
            if record.active {
                transform.position = bounds.clamp(transform.position + transform.velocity * dt);
            }
        }

        for (_entity, (record, attack)) in self.world.query_mut::<(&EntityRecord, &mut Attack)>() {
            if record.active {
                attack.timer = (attack.timer - dt).max(0.0);
                attack.lock_timer = (attack.lock_timer - dt).max(0.0);
            }
        }

        for id in self.enemy_ids_snapshot() {
            self.run_ai(id, dt, director);
        }
    }

    fn run_ai(&mut self, id: EntityId, dt: f32, director: &mut dyn AiDirector) {
        if !self.is_alive(id) {
            return;
        }
        let Some((policy, mut ctx)) = self.component_mut::<Ai>(id).map(|mut ai| {
            ai.cooldown_timer = (ai.cooldown_timer - dt).max(0.0);
            ai.lock_timer = (ai.lock_timer - dt).max(0.0);
            let ctx = BehaviorContext {
                behavior: ai.behavior,
                position: Vec2::ZERO,
                target: None,
                speed: 0.0,
                move_speed: ai.move_speed,
                aggro_radius: ai.aggro_radius,
                attack_radius: ai.attack_radius,
                ideal_min: ai.ideal_min,
                ideal_max: ai.ideal_max,
                attack_ready: ai.cooldown_timer <= 0.0,
                locked: ai.lock_timer > 0.0,
            };
            (ai.target, ctx)
        }) else {
            return;
        };
        let Some(transform) = self.component::<Transform>(id).map(|t| *t) else {
            return;
        };
        ctx.position = transform.position;
        ctx.speed = transform.speed;
        ctx.attack_ready = ctx.attack_ready
            && !ctx.locked
            && self.component::<Attack>(id).is_some_and(|a| a.ready());
        ctx.target = director.resolve_target(self, id, policy);
        let update = evaluate(&ctx);

        if let Some(mut t) = self.component_mut::<Transform>(id) {
            t.velocity = update.velocity;
            if let Some(facing) = update.facing {
                t.facing = facing;
            }
        }

        let Some(direction) = update.attack else {
            return;
        };
        if let Some(mut attack) = self.component_mut::<Attack>(id) {
            attack.timer = attack.cooldown;
            attack.lock_timer = attack.lock;
        }
        let style = match self.component_mut::<Ai>(id) {
            Some(mut ai) => {
                ai.cooldown_timer = ai.cooldown;
                ai.lock_timer = ai.lock;
                ai.style.clone()
            }
            None => return,
        };
        director.trigger_attack(id, direction, &style);
    }
}
