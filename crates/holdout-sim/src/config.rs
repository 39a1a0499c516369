//! Simulation configuration: type registries, wave scripts and limits.
//!
//! Everything here is plain serde data with stock `Default` content, so a
//! `SimConfig` can be built in code or loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use holdout_core::constants::*;
use holdout_core::enums::{AttackStyle, SpawnPlacement, StatusKind, StatusSpec};
use holdout_enemy_ai::BehaviorTable;
use holdout_procgen::GenerationConfig;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown enemy type `{0}`")]
    UnknownEnemyType(String),
    #[error("unknown projectile type `{0}`")]
    UnknownProjectileType(String),
    #[error("wave {index} is invalid: {reason}")]
    InvalidWave { index: usize, reason: String },
}

/// Registry entry for one enemy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeDef {
    pub key: String,
    /// Base diameter (world units).
    pub size: f32,
    /// Spawned size varies uniformly by up to this much either way.
    #[serde(default)]
    pub size_variance: f32,
    /// Weight in `spawn_batch` rolls.
    pub spawn_weight: f32,
    pub health: f32,
    pub damage: f32,
    pub speed: f32,
    pub xp_reward: u32,
}

impl EnemyTypeDef {
    fn stock(
        key: &str,
        size: f32,
        size_variance: f32,
        spawn_weight: f32,
        (health, damage, speed): (f32, f32, f32),
        xp_reward: u32,
    ) -> Self {
        Self {
            key: key.to_string(),
            size,
            size_variance,
            spawn_weight,
            health,
            damage,
            speed,
            xp_reward,
        }
    }

    /// The stock roster: SmallChaser, Brute, Spitter, Tank.
    pub fn stock_roster() -> Vec<Self> {
        vec![
            Self::stock("SmallChaser", 20.0, 4.0, 6.0, (20.0, 5.0, 110.0), 1),
            Self::stock("Brute", 34.0, 4.0, 2.0, (80.0, 15.0, 80.0), 4),
            Self::stock("Spitter", 24.0, 2.0, 2.0, (30.0, 8.0, 95.0), 3),
            Self::stock("Tank", 48.0, 2.0, 0.5, (300.0, 25.0, 55.0), 12),
        ]
    }
}

/// Registry entry for one projectile type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTypeDef {
    pub key: String,
    pub speed: f32,
    pub damage: f32,
    /// Seconds before the projectile expires.
    pub lifetime: f32,
    /// Visual size (world units).
    pub size: f32,
    /// Collision radius (world units).
    pub radius: f32,
    pub pierce: u32,
    pub chains: u32,
    pub chain_range: f32,
    pub statuses: Vec<StatusSpec>,
    /// 0xRRGGBB render tint.
    pub color: u32,
    /// Damage dealt to destructible walls by player-owned projectiles.
    pub wall_damage: i32,
}

impl Default for ProjectileTypeDef {
    fn default() -> Self {
        Self {
            key: String::new(),
            speed: 600.0,
            damage: 10.0,
            lifetime: 1.5,
            size: 8.0,
            radius: 5.0,
            pierce: 0,
            chains: 0,
            chain_range: 160.0,
            statuses: Vec::new(),
            color: 0xFF_E0_66,
            wall_damage: 1,
        }
    }
}

impl ProjectileTypeDef {
    /// The stock projectiles: PlayerBolt and SpitterGlob.
    pub fn stock_types() -> Vec<Self> {
        vec![
            Self {
                key: "PlayerBolt".to_string(),
                ..Self::default()
            },
            Self {
                key: "SpitterGlob".to_string(),
                speed: 260.0,
                damage: 8.0,
                lifetime: 3.0,
                size: 12.0,
                radius: 7.0,
                statuses: vec![StatusSpec::new(StatusKind::Slow { percent: 0.3 }, 1.5)],
                color: 0x7C_FC_00,
                wall_damage: 0,
                ..Self::default()
            },
        ]
    }
}

/// A type key with a roll weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedType {
    pub type_key: String,
    pub weight: f32,
}

impl WeightedType {
    pub fn new(type_key: &str, weight: f32) -> Self {
        Self {
            type_key: type_key.to_string(),
            weight,
        }
    }
}

/// An explicit number of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub type_key: String,
    pub count: u32,
}

impl SpawnGroup {
    pub fn new(type_key: &str, count: u32) -> Self {
        Self {
            type_key: type_key.to_string(),
            count,
        }
    }
}

/// What a timed wave event spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WaveEventKind {
    Burst { groups: Vec<SpawnGroup> },
    Elite { type_key: String, count: u32 },
    MixedGroup { groups: Vec<SpawnGroup> },
    /// `count` spawns, each type rolled from `weights`.
    WeightedBurst { count: u32, weights: Vec<WeightedType> },
}

impl WaveEventKind {
    /// Every type key this event can spawn.
    pub fn type_keys(&self) -> Vec<&str> {
        match self {
            WaveEventKind::Burst { groups } | WaveEventKind::MixedGroup { groups } => {
                groups.iter().map(|g| g.type_key.as_str()).collect()
            }
            WaveEventKind::Elite { type_key, .. } => vec![type_key.as_str()],
            WaveEventKind::WeightedBurst { weights, .. } => {
                weights.iter().map(|w| w.type_key.as_str()).collect()
            }
        }
    }
}

/// One-shot event fired once elapsed wave time passes `at_secs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveEvent {
    pub at_secs: f32,
    pub label: String,
    pub kind: WaveEventKind,
}

/// Script for one wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    pub duration_secs: f32,
    pub budget_per_second: f32,
    /// Budget cost per enemy type.
    #[serde(default)]
    pub costs: BTreeMap<String, f32>,
    /// Weighted continuous-spawn mix.
    #[serde(default)]
    pub spawn_mix: Vec<WeightedType>,
    #[serde(default)]
    pub events: Vec<WaveEvent>,
}

impl WaveDefinition {
    /// Cheapest strictly positive cost in the cost table.
    pub fn cheapest_cost(&self) -> Option<f32> {
        self.costs
            .values()
            .copied()
            .filter(|c| *c > 0.0)
            .reduce(f32::min)
    }

    /// Check durations, rates and type references against the registry.
    pub fn validate(&self, index: usize, enemy_types: &[EnemyTypeDef]) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidWave {
            index,
            reason: reason.to_string(),
        };
        if self.duration_secs.is_nan() || self.duration_secs <= 0.0 {
            return Err(invalid("duration must be positive"));
        }
        if self.budget_per_second.is_nan() || self.budget_per_second < 0.0 {
            return Err(invalid("budget rate must not be negative"));
        }
        if self.spawn_mix.iter().any(|w| w.weight < 0.0) {
            return Err(invalid("spawn weights must not be negative"));
        }

        let known = |key: &str| enemy_types.iter().any(|t| t.key == key);
        let referenced = self
            .costs
            .keys()
            .map(String::as_str)
            .chain(self.spawn_mix.iter().map(|w| w.type_key.as_str()))
            .chain(self.events.iter().flat_map(|e| e.kind.type_keys()));
        for key in referenced {
            if !known(key) {
                return Err(ConfigError::UnknownEnemyType(key.to_string()));
            }
        }
        Ok(())
    }

    fn stock(
        duration_secs: f32,
        budget_per_second: f32,
        costs: &[(&str, f32)],
        mix: &[(&str, f32)],
        events: Vec<WaveEvent>,
    ) -> Self {
        Self {
            duration_secs,
            budget_per_second,
            costs: costs.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            spawn_mix: mix.iter().map(|(k, w)| WeightedType::new(k, *w)).collect(),
            events,
        }
    }

    /// Three escalating stock waves.
    pub fn stock_waves() -> Vec<Self> {
        vec![
            Self::stock(
                30.0,
                2.0,
                &[("SmallChaser", 1.0)],
                &[("SmallChaser", 1.0)],
                vec![WaveEvent {
                    at_secs: 15.0,
                    label: "Opening swarm".to_string(),
                    kind: WaveEventKind::Burst {
                        groups: vec![SpawnGroup::new("SmallChaser", 6)],
                    },
                }],
            ),
            Self::stock(
                45.0,
                3.5,
                &[("SmallChaser", 1.0), ("Spitter", 3.0), ("Brute", 4.0)],
                &[("SmallChaser", 6.0), ("Spitter", 2.0), ("Brute", 1.0)],
                vec![
                    WaveEvent {
                        at_secs: 20.0,
                        label: "Brute pair".to_string(),
                        kind: WaveEventKind::Elite {
                            type_key: "Brute".to_string(),
                            count: 2,
                        },
                    },
                    WaveEvent {
                        at_secs: 35.0,
                        label: "Flankers".to_string(),
                        kind: WaveEventKind::MixedGroup {
                            groups: vec![
                                SpawnGroup::new("SmallChaser", 4),
                                SpawnGroup::new("Spitter", 2),
                            ],
                        },
                    },
                ],
            ),
            Self::stock(
                60.0,
                5.0,
                &[
                    ("SmallChaser", 1.0),
                    ("Spitter", 3.0),
                    ("Brute", 4.0),
                    ("Tank", 10.0),
                ],
                &[
                    ("SmallChaser", 5.0),
                    ("Spitter", 3.0),
                    ("Brute", 2.0),
                    ("Tank", 0.5),
                ],
                vec![
                    WaveEvent {
                        at_secs: 30.0,
                        label: "Horde".to_string(),
                        kind: WaveEventKind::WeightedBurst {
                            count: 12,
                            weights: vec![
                                WeightedType::new("SmallChaser", 3.0),
                                WeightedType::new("Spitter", 1.0),
                                WeightedType::new("Brute", 1.0),
                            ],
                        },
                    },
                    WaveEvent {
                        at_secs: 50.0,
                        label: "Tank".to_string(),
                        kind: WaveEventKind::Elite {
                            type_key: "Tank".to_string(),
                            count: 1,
                        },
                    },
                ],
            ),
        ]
    }
}

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for spawning, rolls and drops. Same seed = same simulation.
    pub seed: u64,
    pub grid_width: u32,
    pub grid_height: u32,
    pub generation: GenerationConfig,
    pub enemy_types: Vec<EnemyTypeDef>,
    /// Type key -> AI tuning.
    pub behaviors: BehaviorTable,
    pub projectile_types: Vec<ProjectileTypeDef>,
    pub waves: Vec<WaveDefinition>,
    pub max_enemies: usize,
    pub max_projectiles: usize,
    /// At the projectile cap, recycle the oldest projectile instead of refusing.
    pub evict_oldest_projectile: bool,
    /// Loop the final wave forever.
    pub endless: bool,
    pub intermission_secs: f32,
    pub placement: SpawnPlacement,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid_width: 64,
            grid_height: 64,
            generation: GenerationConfig::default(),
            enemy_types: EnemyTypeDef::stock_roster(),
            behaviors: BehaviorTable::default(),
            projectile_types: ProjectileTypeDef::stock_types(),
            waves: WaveDefinition::stock_waves(),
            max_enemies: MAX_ENEMIES,
            max_projectiles: MAX_PROJECTILES,
            evict_oldest_projectile: true,
            endless: false,
            intermission_secs: INTERMISSION_SECS,
            placement: SpawnPlacement::default(),
        }
    }
}

impl SimConfig {
    /// Default config with both the simulation and generation seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let mut config = Self {
            seed,
            ..Self::default()
        };
        config.generation.seed = seed;
        config
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every cross-reference between waves, behaviours and registries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, wave) in self.waves.iter().enumerate() {
            wave.validate(index, &self.enemy_types)?;
        }
        for def in &self.enemy_types {
            if let AttackStyle::Ranged { projectile } = &self.behaviors.tuning_for(&def.key).style {
                if self.projectile_type(projectile).is_none() {
                    return Err(ConfigError::UnknownProjectileType(projectile.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn enemy_type(&self, key: &str) -> Option<&EnemyTypeDef> {
        self.enemy_types.iter().find(|t| t.key == key)
    }

    pub fn projectile_type(&self, key: &str) -> Option<&ProjectileTypeDef> {
        self.projectile_types.iter().find(|t| t.key == key)
    }
}
