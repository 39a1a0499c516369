//! Per-step event buffer and optional synchronous callbacks.

use glam::Vec2;

use holdout_core::events::SimEvent;
use holdout_core::types::EntityId;

/// Called when an enemy triggers an attack, with the normalised direction.
pub type AttackHook = Box<dyn FnMut(EntityId, Vec2)>;
/// Called on every death with the killer, if known.
pub type KilledHook = Box<dyn FnMut(EntityId, Option<EntityId>)>;
/// Called after damage lands, with the amount actually subtracted.
pub type DamageHook = Box<dyn FnMut(EntityId, f32)>;
/// Called when a wave's duration elapses, with the 1-based wave number.
pub type WaveCompleteHook = Box<dyn FnMut(u32)>;

/// Notification callbacks registered by external layers.
#[derive(Default)]
pub struct SimHooks {
    pub on_enemy_attack: Option<AttackHook>,
    pub on_entity_killed: Option<KilledHook>,
    pub on_damage_applied: Option<DamageHook>,
    pub on_wave_complete: Option<WaveCompleteHook>,
}

impl SimHooks {
    fn dispatch(&mut self, event: &SimEvent) {
        match event {
            SimEvent::EnemyAttack { enemy, dx, dy } => {
                if let Some(hook) = self.on_enemy_attack.as_mut() {
                    hook(*enemy, Vec2::new(*dx, *dy));
                }
            }
            SimEvent::EntityKilled { target, source, .. } => {
                if let Some(hook) = self.on_entity_killed.as_mut() {
                    hook(*target, *source);
                }
            }
            SimEvent::DamageApplied { target, amount, .. } => {
                if let Some(hook) = self.on_damage_applied.as_mut() {
                    hook(*target, *amount);
                }
            }
            SimEvent::WaveCompleted { wave } => {
                if let Some(hook) = self.on_wave_complete.as_mut() {
                    hook(*wave);
                }
            }
            _ => {}
        }
    }
}

/// Collects the step's events and forwards each to its hook as it happens.
#[derive(Default)]
pub struct SimEvents {
    events: Vec<SimEvent>,
    pub hooks: SimHooks,
}

impl SimEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.hooks.dispatch(&event);
        self.events.push(event);
    }

    /// Events emitted since the last drain.
    pub fn pending(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
