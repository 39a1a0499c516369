//! Combat system: damage resolution, status effects and death handling.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use holdout_core::commands::DebugFlags;
use holdout_core::components::{EnemyInfo, EntityRecord, Health, Transform};
use holdout_core::enums::{EntityKind, PickupKind, StatusSpec};
use holdout_core::events::SimEvent;
use holdout_core::types::EntityId;

use crate::entities::EntityStore;
use crate::hooks::SimEvents;
use crate::status::StatusBundle;
use crate::systems::pickups;

/// External damage scaling (resistance, difficulty). Receives the target,
/// the incoming amount and the source; returns the amount to apply.
pub type DamageModifier = Box<dyn FnMut(EntityId, f32, Option<EntityId>) -> f32>;

/// Resolves damage and owns the per-entity status bundles.
#[derive(Default)]
pub struct CombatSystem {
    statuses: BTreeMap<EntityId, StatusBundle>,
    kill_count: u32,
    debug: DebugFlags,
    damage_modifier: Option<DamageModifier>,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kill_count(&self) -> u32 {
        self.kill_count
    }

    pub fn debug_flags(&self) -> DebugFlags {
        self.debug
    }

    pub fn set_debug_flags(&mut self, flags: DebugFlags) {
        self.debug = flags;
    }

    pub fn set_damage_modifier(&mut self, modifier: DamageModifier) {
        self.damage_modifier = Some(modifier);
    }

    pub fn clear_damage_modifier(&mut self) {
        self.damage_modifier = None;
    }

    pub fn status(&self, id: EntityId) -> Option<&StatusBundle> {
        self.statuses.get(&id)
    }

    pub fn is_stunned(&self, id: EntityId) -> bool {
        self.statuses.get(&id).is_some_and(StatusBundle::stunned)
    }

    pub fn tracked_statuses(&self) -> usize {
        self.statuses.len()
    }

    /// Apply damage to `target`. Returns false, changing nothing, when the
    /// target has no Health, is the player under infinite health, or is
    /// invulnerable.
    pub fn apply_damage(
        &mut self,
        store: &mut EntityStore,
        events: &mut SimEvents,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
    ) -> bool {
        let Some(kind) = store.record(target).filter(|r| r.active).map(|r| r.kind) else {
            return false;
        };
        let Some(health) = store.component::<Health>(target).map(|h| *h) else {
            return false;
        };
        if kind == EntityKind::Player && self.debug.infinite_player_health {
            return false;
        }
        if health.is_invulnerable() {
            return false;
        }

        let mut amount = match self.damage_modifier.as_mut() {
            Some(modifier) => modifier(target, amount, source),
            None => amount,
        };
        if self.debug.one_hit_kill && kind == EntityKind::Enemy {
            amount = amount.max(health.current);
        }
        let dealt = amount.max(0.0);
        let remaining = (health.current - dealt).clamp(0.0, health.max);

        if let Some(mut h) = store.component_mut::<Health>(target) {
            h.current = remaining;
            if dealt > 0.0 && h.invulnerability_on_hit > 0.0 {
                h.invulnerable_secs = h.invulnerability_on_hit;
            }
        }

        if self.debug.log_damage {
            debug!(%target, dealt, remaining, source = ?source, "damage applied");
        } else {
            trace!(%target, dealt, remaining, "damage applied");
        }
        events.emit(SimEvent::DamageApplied {
            target,
            amount: dealt,
            remaining,
        });

        if remaining <= 0.0 {
            self.handle_death(store, events, target, kind, source);
        }
        true
    }

    /// Start a status effect on `target`, recording its base speed the
    /// first time. The new live speed takes effect immediately.
    pub fn apply_status(
        &mut self,
        store: &mut EntityStore,
        target: EntityId,
        spec: StatusSpec,
        source: Option<EntityId>,
    ) -> bool {
        if !store.is_alive(target) || spec.duration <= 0.0 {
            return false;
        }
        let base = store.component::<Transform>(target).map_or(0.0, |t| t.speed);
        let bundle = self
            .statuses
            .entry(target)
            .or_insert_with(|| StatusBundle::new(base));
        bundle.push(spec, source);

        let speed = bundle.live_speed();
        if let Some(mut t) = store.component_mut::<Transform>(target) {
            t.speed = speed;
            if speed <= 0.0 {
                t.velocity = glam::Vec2::ZERO;
            }
        }
        true
    }

    /// Drop an entity's statuses, restoring its base speed.
    pub fn clear_status(&mut self, store: &mut EntityStore, target: EntityId) {
        if let Some(bundle) = self.statuses.remove(&target) {
            if let Some(mut t) = store.component_mut::<Transform>(target) {
                t.speed = bundle.base_speed;
            }
        }
    }

    /// Tick invulnerability timers, then advance status effects.
    pub fn update(&mut self, dt: f32, store: &mut EntityStore, events: &mut SimEvents) {
        for (_entity, (record, health)) in store
            .world_mut()
            .query_mut::<(&EntityRecord, &mut Health)>()
        {
            if record.active {
                health.invulnerable_secs = (health.invulnerable_secs - dt).max(0.0);
            }
        }

        let ids: Vec<EntityId> = self.statuses.keys().copied().collect();
        for id in ids {
            let Some(mut bundle) = self.statuses.remove(&id) else {
                continue;
            };
            if !store.is_alive(id) {
                continue;
            }

            for tick in bundle.advance(dt) {
                self.apply_dot(store, events, id, tick.amount, tick.source);
                if !store.is_alive(id) {
                    break;
                }
            }
            if !store.is_alive(id) {
                continue;
            }

            let speed = if bundle.is_empty() {
                bundle.base_speed
            } else {
                bundle.live_speed()
            };
            if let Some(mut t) = store.component_mut::<Transform>(id) {
                t.speed = speed;
            }
            if !bundle.is_empty() {
                self.statuses.insert(id, bundle);
            }
        }
    }

    /// Damage-over-time ignores incidental i-frames and never grants new ones.
    fn apply_dot(
        &mut self,
        store: &mut EntityStore,
        events: &mut SimEvents,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
    ) {
        let saved = store.component_mut::<Health>(target).map(|mut h| {
            let saved = h.invulnerable_secs;
            h.invulnerable_secs = 0.0;
            saved
        });
        self.apply_damage(store, events, target, amount, source);
        if let (Some(saved), Some(mut h)) = (saved, store.component_mut::<Health>(target)) {
            h.invulnerable_secs = saved;
        }
    }

    fn handle_death(
        &mut self,
        store: &mut EntityStore,
        events: &mut SimEvents,
        target: EntityId,
        kind: EntityKind,
        source: Option<EntityId>,
    ) {
        if kind == EntityKind::Enemy {
            self.kill_count += 1;
            let drop = store
                .position(target)
                .zip(store.component::<EnemyInfo>(target).map(|i| i.xp_reward));
            if let Some((pos, xp)) = drop.filter(|(_, xp)| *xp > 0) {
                pickups::spawn_pickup(store, pos, PickupKind::Xp, xp);
            }
        }
        self.statuses.remove(&target);
        debug!(%target, ?kind, source = ?source, "entity killed");
        events.emit(SimEvent::EntityKilled {
            target,
            kind,
            source,
        });
        store.remove_entity(target);
    }
}
