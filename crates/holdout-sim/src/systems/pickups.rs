//! Pickup drops and collection.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use holdout_core::components::{Collision, Pickup, Transform};
use holdout_core::constants::*;
use holdout_core::enums::{EntityKind, PickupKind};
use holdout_core::events::SimEvent;
use holdout_core::types::EntityId;

use crate::entities::EntityStore;
use crate::hooks::SimEvents;

/// Drop a pickup at `pos`.
pub fn spawn_pickup(store: &mut EntityStore, pos: Vec2, kind: PickupKind, value: u32) -> EntityId {
    let id = store.create_entity(EntityKind::Pickup);
    store.insert(id, Transform::at(pos, PICKUP_RADIUS * 2.0, 0.0));
    store.insert(id, Collision { radius: PICKUP_RADIUS });
    store.insert(id, Pickup { kind, value });
    id
}

/// Roll the ore drop for a wall the player destroyed.
pub fn roll_ore(rng: &mut ChaCha8Rng) -> Option<(PickupKind, u32)> {
    if !rng.gen_bool(ORE_DROP_CHANCE) {
        return None;
    }
    if rng.gen_bool(ORE_RARE_CHANCE) {
        Some((PickupKind::OreRare, ORE_RARE_VALUE))
    } else {
        Some((PickupKind::OreCommon, ORE_COMMON_VALUE))
    }
}

/// Collect every pickup within reach of the player. Returns how many.
pub fn collect(store: &mut EntityStore, events: &mut SimEvents, radius: f32) -> u32 {
    let Some(player_pos) = store.player().and_then(|id| store.position(id)) else {
        return 0;
    };
    let reach_sq = radius * radius;

    let collected: Vec<(EntityId, Pickup)> = store
        .pickups()
        .iter()
        .filter_map(|&id| {
            let pos = store.position(id)?;
            let pickup = *store.component::<Pickup>(id)?;
            (pos.distance_squared(player_pos) <= reach_sq).then_some((id, pickup))
        })
        .collect();

    for (id, pickup) in &collected {
        events.emit(SimEvent::PickupCollected {
            kind: pickup.kind,
            value: pickup.value,
        });
        store.remove_entity(*id);
    }
    collected.len() as u32
}
