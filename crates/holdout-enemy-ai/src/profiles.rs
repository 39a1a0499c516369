//! Behaviour profiles and the per-type tuning table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use holdout_core::constants::{BRUTE_CHARGE_RANGE_FACTOR, BRUTE_CHARGE_SPEED_FACTOR};
use holdout_core::enums::{AiBehavior, AttackStyle};

/// Fixed steering traits of a behaviour variant.
pub struct BehaviorProfile {
    /// Backs away inside `ideal_min` and holds inside the ideal band.
    pub kites: bool,
    /// Charges when within `attack_radius * factor`, None if it never charges.
    pub charge_range_factor: Option<f32>,
    pub charge_speed_factor: f32,
}

/// Get the steering profile for a behaviour variant.
pub fn get_profile(behavior: AiBehavior) -> BehaviorProfile {
    match behavior {
        AiBehavior::Chaser => BehaviorProfile {
            kites: false,
            charge_range_factor: None,
            charge_speed_factor: 1.0,
        },
        AiBehavior::Brute => BehaviorProfile {
            kites: false,
            charge_range_factor: Some(BRUTE_CHARGE_RANGE_FACTOR),
            charge_speed_factor: BRUTE_CHARGE_SPEED_FACTOR,
        },
        AiBehavior::Spitter => BehaviorProfile {
            kites: true,
            charge_range_factor: None,
            charge_speed_factor: 1.0,
        },
    }
}

/// AI tuning for one enemy type, copied into the `Ai` component at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub behavior: AiBehavior,
    pub move_speed: f32,
    pub aggro_radius: f32,
    pub attack_radius: f32,
    pub ideal_min: f32,
    pub ideal_max: f32,
    pub cooldown: f32,
    pub lock: f32,
    pub style: AttackStyle,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            behavior: AiBehavior::Chaser,
            move_speed: 1.0,
            aggro_radius: 2_000.0,
            attack_radius: 28.0,
            ideal_min: 0.0,
            ideal_max: 0.0,
            cooldown: 1.0,
            lock: 0.2,
            style: AttackStyle::Melee,
        }
    }
}

/// Type key -> AI tuning. Unknown keys fall back to the default chaser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorTable {
    entries: BTreeMap<String, AiTuning>,
}

impl BehaviorTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, type_key: impl Into<String>, tuning: AiTuning) {
        self.entries.insert(type_key.into(), tuning);
    }

    pub fn get(&self, type_key: &str) -> Option<&AiTuning> {
        self.entries.get(type_key)
    }

    /// Tuning for `type_key`, or the default chaser tuning.
    pub fn tuning_for(&self, type_key: &str) -> AiTuning {
        self.entries.get(type_key).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BehaviorTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("SmallChaser", AiTuning::default());
        table.insert(
            "Brute",
            AiTuning {
                behavior: AiBehavior::Brute,
                move_speed: 0.9,
                attack_radius: 36.0,
                cooldown: 1.6,
                lock: 0.45,
                ..AiTuning::default()
            },
        );
        table.insert(
            "Spitter",
            AiTuning {
                behavior: AiBehavior::Spitter,
                attack_radius: 360.0,
                ideal_min: 180.0,
                ideal_max: 300.0,
                cooldown: 2.0,
                lock: 0.3,
                style: AttackStyle::Ranged {
                    projectile: "SpitterGlob".to_string(),
                },
                ..AiTuning::default()
            },
        );
        table.insert(
            "Tank",
            AiTuning {
                behavior: AiBehavior::Brute,
                move_speed: 0.6,
                attack_radius: 44.0,
                cooldown: 2.4,
                lock: 0.6,
                ..AiTuning::default()
            },
        );
        table
    }
}
