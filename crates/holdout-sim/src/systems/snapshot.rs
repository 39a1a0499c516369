//! Snapshot system: reads the store and subsystems into a `SimSnapshot`.
//!
//! Read-only; never modifies simulation state.

use holdout_core::components::{EnemyInfo, Health, Pickup, Transform};
use holdout_core::events::SimEvent;
use holdout_core::state::*;
use holdout_core::types::{EntityId, SimTime, TileCoord};

use crate::combat::CombatSystem;
use crate::entities::EntityStore;
use crate::projectiles::{ProjectileManager, ProjectileOrigin};

/// Everything the snapshot needs besides the store.
pub struct SnapshotInputs<'a> {
    pub combat: &'a CombatSystem,
    pub projectiles: &'a ProjectileManager,
    pub time: SimTime,
    pub wave: WaveSnapshot,
    pub dirty_tiles: Vec<TileCoord>,
    pub events: Vec<SimEvent>,
}

pub fn build_snapshot(store: &EntityStore, inputs: SnapshotInputs<'_>) -> SimSnapshot {
    let combat = inputs.combat;
    SimSnapshot {
        time: inputs.time,
        wave: inputs.wave,
        player: store
            .player()
            .and_then(|id| build_actor(store, combat, id, "Player")),
        enemies: store
            .enemies()
            .iter()
            .filter_map(|&id| {
                let type_key = store
                    .component::<EnemyInfo>(id)
                    .map(|info| info.type_key.clone())
                    .unwrap_or_default();
                build_actor(store, combat, id, &type_key)
            })
            .collect(),
        pickups: store
            .pickups()
            .iter()
            .filter_map(|&id| {
                let position = store.position(id)?;
                let pickup = *store.component::<Pickup>(id)?;
                Some(PickupView {
                    id,
                    position,
                    kind: pickup.kind,
                    value: pickup.value,
                })
            })
            .collect(),
        projectiles: inputs
            .projectiles
            .iter_active()
            .map(|p| ProjectileView {
                id: p.id,
                position: p.position,
                size: p.size,
                color: p.color,
                from_player: p.origin == ProjectileOrigin::Player,
            })
            .collect(),
        kill_count: combat.kill_count(),
        dirty_tiles: inputs.dirty_tiles,
        events: inputs.events,
    }
}

fn build_actor(
    store: &EntityStore,
    combat: &CombatSystem,
    id: EntityId,
    type_key: &str,
) -> Option<ActorView> {
    if !store.is_alive(id) {
        return None;
    }
    let transform = *store.component::<Transform>(id)?;
    let (health, max_health) = store
        .component::<Health>(id)
        .map_or((0.0, 0.0), |h| (h.current, h.max));
    Some(ActorView {
        id,
        position: transform.position,
        facing: transform.facing,
        size: transform.size,
        health,
        max_health,
        type_key: type_key.to_string(),
        stunned: combat.is_stunned(id),
    })
}
