//! Simulation engine: the step driver.
//!
//! `Simulation` owns the grid, the entity store and every subsystem, applies
//! queued commands at step boundaries, runs the subsystems in a fixed order
//! and produces a `SimSnapshot` per step. Headless and deterministic for a
//! given config.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use holdout_core::commands::PlayerCommand;
use holdout_core::components::{Attack, TargetPolicy, Transform};
use holdout_core::constants::{DEFAULT_PLAYER_PROJECTILE, DT, PICKUP_COLLECT_RADIUS};
use holdout_core::enums::{AttackStyle, StatusSpec};
use holdout_core::events::SimEvent;
use holdout_core::state::SimSnapshot;
use holdout_core::types::{EntityId, ProjectileId, SimTime, TileCoord};
use holdout_grid::WorldGrid;
use holdout_procgen::GenerationResult;

use crate::combat::CombatSystem;
use crate::config::SimConfig;
use crate::entities::{resolve_policy, AiDirector, EntityStore};
use crate::hooks::{SimEvents, SimHooks};
use crate::projectiles::{ProjectileManager, ProjectileReport, Shooter, SpawnOptions};
use crate::spawner::{SpawnController, SpawnEnv};
use crate::systems;
use crate::waves::WaveManager;
use crate::world_setup;

/// An attack an enemy's AI decided to make this step.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackRequest {
    pub enemy: EntityId,
    /// Normalised.
    pub direction: Vec2,
    pub style: AttackStyle,
}

/// Resolves targets by policy and queues attacks for the engine.
struct EngineDirector<'a> {
    requests: &'a mut Vec<AttackRequest>,
}

impl AiDirector for EngineDirector<'_> {
    fn resolve_target(
        &self,
        store: &EntityStore,
        _seeker: EntityId,
        policy: TargetPolicy,
    ) -> Option<Vec2> {
        resolve_policy(store, policy)
    }

    fn trigger_attack(&mut self, enemy: EntityId, direction: Vec2, style: &AttackStyle) {
        self.requests.push(AttackRequest {
            enemy,
            direction,
            style: style.clone(),
        });
    }
}

/// Running totals for drivers and summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub projectiles_fired: u32,
    pub projectile_hits: u32,
    pub walls_destroyed: u32,
    pub ore_dropped: u32,
    pub pickups_collected: u32,
}

pub struct Simulation {
    config: SimConfig,
    grid: WorldGrid,
    generation: GenerationResult,
    store: EntityStore,
    spawner: SpawnController,
    waves: WaveManager,
    projectiles: ProjectileManager,
    combat: CombatSystem,
    events: SimEvents,
    rng: ChaCha8Rng,
    time: SimTime,
    command_queue: VecDeque<PlayerCommand>,
    attack_requests: Vec<AttackRequest>,
    player_heading: Vec2,
    overlay_ms_carry: f32,
    stats: RunStats,
}

impl Simulation {
    /// Generate a level from `config` and place the player at its spawn.
    pub fn new(config: SimConfig) -> Self {
        let (grid, generation) = world_setup::build_level(&config);
        Self::assemble(config, grid, generation)
    }

    /// Use a prepared grid instead of generating one; the player starts
    /// at the center of `spawn`.
    pub fn on_grid(config: SimConfig, grid: WorldGrid, spawn: TileCoord) -> Self {
        let generation = GenerationResult {
            seed_used: config.generation.seed,
            attempts: 0,
            accepted: true,
            spawn,
            ..GenerationResult::default()
        };
        Self::assemble(config, grid, generation)
    }

    fn assemble(config: SimConfig, grid: WorldGrid, generation: GenerationResult) -> Self {
        let mut store = EntityStore::new();
        world_setup::spawn_player(&mut store, grid.tile_center(generation.spawn));

        Self {
            spawner: SpawnController::from_config(&config),
            waves: WaveManager::new(config.waves.clone(), config.endless, config.intermission_secs),
            projectiles: ProjectileManager::from_config(&config),
            combat: CombatSystem::new(),
            events: SimEvents::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time: SimTime::default(),
            command_queue: VecDeque::new(),
            attack_requests: Vec::new(),
            player_heading: Vec2::ZERO,
            overlay_ms_carry: 0.0,
            stats: RunStats::default(),
            config,
            grid,
            generation,
            store,
        }
    }

    /// Queue a command for processing at the next step boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance one fixed tick.
    pub fn tick(&mut self) -> SimSnapshot {
        self.step(DT)
    }

    /// Advance by `dt` seconds and return the resulting snapshot.
    pub fn step(&mut self, dt: f32) -> SimSnapshot {
        self.process_commands();
        self.run_systems(dt);
        self.time.advance(dt);
        self.build_snapshot()
    }

    // --- Accessors ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut WorldGrid {
        &mut self.grid
    }

    pub fn generation(&self) -> &GenerationResult {
        &self.generation
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatSystem {
        &mut self.combat
    }

    pub fn projectiles(&self) -> &ProjectileManager {
        &self.projectiles
    }

    pub fn waves(&self) -> &WaveManager {
        &self.waves
    }

    pub fn spawner(&self) -> &SpawnController {
        &self.spawner
    }

    pub fn spawner_mut(&mut self) -> &mut SpawnController {
        &mut self.spawner
    }

    pub fn hooks_mut(&mut self) -> &mut SimHooks {
        &mut self.events.hooks
    }

    /// Events emitted since the last snapshot.
    pub fn pending_events(&self) -> &[SimEvent] {
        self.events.pending()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.store.player()
    }

    pub fn kill_count(&self) -> u32 {
        self.combat.kill_count()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    // --- Direct operations (debug/test surface) ---

    pub fn spawn_enemy_type(&mut self, type_key: &str, count: u32) -> u32 {
        let mut env = SpawnEnv {
            store: &mut self.store,
            grid: &self.grid,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        self.spawner.spawn_enemy_type(&mut env, type_key, count)
    }

    pub fn spawn_batch(&mut self, count: u32) -> u32 {
        let mut env = SpawnEnv {
            store: &mut self.store,
            grid: &self.grid,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        self.spawner.spawn_batch(&mut env, count)
    }

    /// Remove every enemy without kills or drops.
    pub fn clear_enemies(&mut self) -> usize {
        for id in self.store.enemy_ids_snapshot() {
            self.combat.clear_status(&mut self.store, id);
        }
        self.store.clear_enemies()
    }

    pub fn skip_wave(&mut self) -> bool {
        self.waves.skip_to_next_wave(&mut self.events)
    }

    pub fn apply_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> bool {
        self.combat
            .apply_damage(&mut self.store, &mut self.events, target, amount, source)
    }

    pub fn apply_status(
        &mut self,
        target: EntityId,
        spec: StatusSpec,
        source: Option<EntityId>,
    ) -> bool {
        self.combat.apply_status(&mut self.store, target, spec, source)
    }

    pub fn spawn_projectile(
        &mut self,
        type_key: &str,
        position: Vec2,
        direction: Vec2,
        shooter: Shooter,
        options: SpawnOptions,
    ) -> Option<ProjectileId> {
        let id = self
            .projectiles
            .spawn(type_key, position, direction, shooter, options);
        if id.is_some() {
            self.stats.projectiles_fired += 1;
        }
        id
    }

    /// Fire from the player toward `direction`.
    pub fn fire(&mut self, direction: Vec2, type_key: &str) -> Option<ProjectileId> {
        let player = self.store.player()?;
        let from = self.store.position(player)?;
        self.spawn_projectile(
            type_key,
            from,
            direction,
            Shooter::player(Some(player)),
            SpawnOptions::default(),
        )
    }

    // --- Step internals ---

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::MovePlayer { x, y } => {
                self.player_heading = Vec2::new(x, y).normalize_or_zero();
            }
            PlayerCommand::Fire { x, y, projectile } => {
                let type_key = projectile.as_deref().unwrap_or(DEFAULT_PLAYER_PROJECTILE);
                self.fire(Vec2::new(x, y), type_key);
            }
            PlayerCommand::SkipWave => {
                self.skip_wave();
            }
            PlayerCommand::SpawnBatch { count } => {
                self.spawn_batch(count);
            }
            PlayerCommand::ClearEnemies => {
                self.clear_enemies();
            }
            PlayerCommand::SetDebugFlags { flags } => {
                self.combat.set_debug_flags(flags);
            }
        }
    }

    /// Run every subsystem in order.
    fn run_systems(&mut self, dt: f32) {
        // 1. Wave pacing drives the spawner
        {
            let mut env = SpawnEnv {
                store: &mut self.store,
                grid: &self.grid,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            self.waves.update(dt, &mut self.spawner, &mut env);
        }
        // 2. Player steering from the held heading
        self.steer_player();
        // 3. Kinematics, attack timers, enemy AI
        let mut director = EngineDirector {
            requests: &mut self.attack_requests,
        };
        self.store.update(dt, self.grid.bounds(), &mut director);
        systems::occupancy::run(&mut self.grid, &self.store);
        // 4. AI-triggered attacks
        self.resolve_attacks();
        // 5. Invulnerability and status effects
        self.combat.update(dt, &mut self.store, &mut self.events);
        // 6. Projectiles (feeds damage back into combat)
        let report = self.projectiles.update(
            dt,
            &mut self.grid,
            &mut self.store,
            &mut self.combat,
            &mut self.events,
        );
        self.apply_projectile_report(&report);
        // 7. Pickup collection
        self.stats.pickups_collected +=
            systems::pickups::collect(&mut self.store, &mut self.events, PICKUP_COLLECT_RADIUS);
        // 8. Deferred removals
        self.store.reap_inactive();
        // 9. Tile overlays
        self.tick_overlays(dt);
    }

    fn steer_player(&mut self) {
        let Some(player) = self.store.player() else {
            return;
        };
        let heading = self.player_heading;
        if let Some(mut t) = self.store.component_mut::<Transform>(player) {
            t.velocity = heading * t.speed;
            if heading != Vec2::ZERO {
                t.facing = heading;
            }
        }
    }

    fn resolve_attacks(&mut self) {
        let mut requests = std::mem::take(&mut self.attack_requests);
        for request in requests.drain(..) {
            if !self.store.is_alive(request.enemy) {
                continue;
            }
            self.events.emit(SimEvent::EnemyAttack {
                enemy: request.enemy,
                dx: request.direction.x,
                dy: request.direction.y,
            });
            let Some(attack) = self.store.component::<Attack>(request.enemy).map(|a| *a) else {
                continue;
            };
            let Some(from) = self.store.position(request.enemy) else {
                continue;
            };

            match request.style {
                AttackStyle::Melee => {
                    let Some(player) = self.store.player() else {
                        continue;
                    };
                    let Some(target) = self.store.position(player) else {
                        continue;
                    };
                    let reach = attack.range + self.store.collision_radius(player);
                    if target.distance_squared(from) <= reach * reach {
                        self.combat.apply_damage(
                            &mut self.store,
                            &mut self.events,
                            player,
                            attack.damage,
                            Some(request.enemy),
                        );
                    }
                }
                AttackStyle::Ranged { projectile } => {
                    self.spawn_projectile(
                        &projectile,
                        from,
                        request.direction,
                        Shooter::enemy(Some(request.enemy)),
                        SpawnOptions {
                            damage: Some(attack.damage),
                            ..SpawnOptions::default()
                        },
                    );
                }
            }
        }
        self.attack_requests = requests;
    }

    fn apply_projectile_report(&mut self, report: &ProjectileReport) {
        self.stats.projectile_hits += report.hits;
        self.stats.projectiles_fired += report.chains_spawned;
        for &tile in &report.walls_destroyed {
            self.stats.walls_destroyed += 1;
            if let Some((kind, value)) = systems::pickups::roll_ore(&mut self.rng) {
                let pos = self.grid.tile_center(tile);
                systems::pickups::spawn_pickup(&mut self.store, pos, kind, value);
                self.stats.ore_dropped += 1;
            }
        }
    }

    fn tick_overlays(&mut self, dt: f32) {
        let total = dt * 1000.0 + self.overlay_ms_carry;
        let whole = total.floor().max(0.0);
        self.overlay_ms_carry = total - whole;
        self.grid.tick(whole as u32);
    }

    fn build_snapshot(&mut self) -> SimSnapshot {
        systems::snapshot::build_snapshot(
            &self.store,
            systems::snapshot::SnapshotInputs {
                combat: &self.combat,
                projectiles: &self.projectiles,
                time: self.time,
                wave: self.waves.snapshot(),
                dirty_tiles: self.grid.drain_dirty(),
                events: self.events.drain(),
            },
        )
    }
}
