//! Status-effect bundles tracked per entity by the combat system.

use holdout_core::enums::{StatusKind, StatusSpec};
use holdout_core::types::EntityId;

/// One running effect.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Seconds left.
    pub remaining: f32,
    pub source: Option<EntityId>,
}

/// Damage-over-time due this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotTick {
    pub amount: f32,
    pub source: Option<EntityId>,
}

/// All effects on one entity plus the move speed it had before the first.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBundle {
    pub base_speed: f32,
    pub effects: Vec<StatusEffect>,
}

impl StatusBundle {
    pub fn new(base_speed: f32) -> Self {
        Self {
            base_speed,
            effects: Vec::new(),
        }
    }

    pub fn push(&mut self, spec: StatusSpec, source: Option<EntityId>) {
        self.effects.push(StatusEffect {
            kind: spec.kind,
            remaining: spec.duration,
            source,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Freeze or stun present.
    pub fn stunned(&self) -> bool {
        self.effects.iter().any(|e| e.kind.immobilises())
    }

    /// Strongest slow among the running effects, as a speed multiplier.
    pub fn multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                StatusKind::Slow { percent } => Some((1.0 - percent).clamp(0.0, 1.0)),
                _ => None,
            })
            .fold(1.0, f32::min)
    }

    /// `base_speed * (stunned ? 0 : multiplier)`, or the base once empty.
    pub fn live_speed(&self) -> f32 {
        if self.stunned() {
            0.0
        } else {
            self.base_speed * self.multiplier()
        }
    }

    /// Advance every effect by `dt`, prune the expired ones and return the
    /// damage-over-time owed. A DoT's final tick only covers the time it had
    /// left, so the total dealt is exactly `dps * duration`.
    pub fn advance(&mut self, dt: f32) -> Vec<DotTick> {
        let mut ticks = Vec::new();
        for effect in &mut self.effects {
            let covered = dt.min(effect.remaining.max(0.0));
            effect.remaining -= dt;
            let dps = effect.kind.dps();
            if dps > 0.0 && covered > 0.0 {
                ticks.push(DotTick {
                    amount: dps * covered,
                    source: effect.source,
                });
            }
        }
        self.effects.retain(|e| e.remaining > 0.0);
        ticks
    }
}
