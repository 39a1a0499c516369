//! Wave manager: paces the spawn controller with a time/budget economy
//! and one-shot scripted events.

use tracing::debug;

use holdout_core::constants::WAVE_SPAWN_ATTEMPTS_PER_STEP;
use holdout_core::events::SimEvent;
use holdout_core::state::{EventPreview, WaveSnapshot};

use crate::config::{WaveDefinition, WaveEventKind};
use crate::hooks::SimEvents;
use crate::spawner::{weighted_pick, SpawnController, SpawnEnv};

/// Where the manager is in its wave cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WavePhase {
    /// First wave starts on the next update.
    Pending,
    Active,
    Intermission { remaining: f32 },
    Finished,
}

pub struct WaveManager {
    waves: Vec<WaveDefinition>,
    endless: bool,
    intermission_secs: f32,
    phase: WavePhase,
    index: usize,
    next_index: usize,
    /// 1-based count of waves started, including endless repeats.
    wave_number: u32,
    elapsed: f32,
    budget: f32,
    fired: Vec<bool>,
}

impl WaveManager {
    pub fn new(waves: Vec<WaveDefinition>, endless: bool, intermission_secs: f32) -> Self {
        Self {
            waves,
            endless,
            intermission_secs: intermission_secs.max(0.0),
            phase: WavePhase::Pending,
            index: 0,
            next_index: 0,
            wave_number: 0,
            elapsed: 0.0,
            budget: 0.0,
            fired: Vec::new(),
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn wave_number(&self) -> u32 {
        self.wave_number
    }

    pub fn budget(&self) -> f32 {
        self.budget
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.phase == WavePhase::Finished
    }

    pub fn endless(&self) -> bool {
        self.endless
    }

    pub fn set_endless(&mut self, endless: bool) {
        self.endless = endless;
    }

    pub fn waves(&self) -> &[WaveDefinition] {
        &self.waves
    }

    /// Advance the active wave by `dt`: accrue budget, spawn continuously,
    /// fire due events and complete the wave once its duration elapses.
    pub fn update(&mut self, dt: f32, spawner: &mut SpawnController, env: &mut SpawnEnv<'_>) {
        match self.phase {
            WavePhase::Finished => return,
            WavePhase::Pending => {
                if self.waves.is_empty() {
                    self.phase = WavePhase::Finished;
                    env.events.emit(SimEvent::WavesFinished);
                    return;
                }
                self.start_wave(0, env.events);
            }
            WavePhase::Intermission { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = WavePhase::Intermission { remaining };
                } else {
                    self.start_wave(self.next_index, env.events);
                }
                return;
            }
            WavePhase::Active => {}
        }

        let wave = &self.waves[self.index];
        self.elapsed += dt;
        self.budget += wave.budget_per_second * dt;

        self.spawn_continuous(spawner, env);
        self.fire_due_events(spawner, env);

        if self.elapsed >= self.waves[self.index].duration_secs {
            self.complete_wave(env.events);
        }
    }

    /// Spend budget on rolls from the spawn mix.
    ///
    /// The loop runs while the budget covers the cheapest cost, but the
    /// rolled type's own cost is deducted unchecked, so one spawn per step
    /// can take the budget below zero.
    fn spawn_continuous(&mut self, spawner: &mut SpawnController, env: &mut SpawnEnv<'_>) {
        let wave = &self.waves[self.index];
        let Some(min_cost) = wave.cheapest_cost() else {
            return;
        };

        let mut attempts = 0;
        while self.budget >= min_cost && attempts < WAVE_SPAWN_ATTEMPTS_PER_STEP {
            attempts += 1;
            let Some(pick) = weighted_pick(&wave.spawn_mix, |w| w.weight, env.rng) else {
                break;
            };
            // Types without a positive cost never spawn from the economy.
            let Some(&cost) = wave.costs.get(&pick.type_key).filter(|c| **c > 0.0) else {
                continue;
            };
            if !spawner.is_spawnable(env.store, &pick.type_key) {
                continue;
            }
            if spawner.spawn_enemy_type(env, &pick.type_key, 1) > 0 {
                self.budget -= cost;
            }
        }
    }

    fn fire_due_events(&mut self, spawner: &mut SpawnController, env: &mut SpawnEnv<'_>) {
        let wave = &self.waves[self.index];
        for (i, event) in wave.events.iter().enumerate() {
            if self.fired[i] || self.elapsed < event.at_secs {
                continue;
            }
            self.fired[i] = true;

            let spawned = match &event.kind {
                WaveEventKind::Burst { groups } | WaveEventKind::MixedGroup { groups } => groups
                    .iter()
                    .map(|g| spawner.spawn_enemy_type(env, &g.type_key, g.count))
                    .sum::<u32>(),
                WaveEventKind::Elite { type_key, count } => {
                    spawner.spawn_enemy_type(env, type_key, *count)
                }
                WaveEventKind::WeightedBurst { count, weights } => {
                    let mut spawned = 0;
                    for _ in 0..*count {
                        if let Some(pick) = weighted_pick(weights, |w| w.weight, env.rng) {
                            spawned += spawner.spawn_enemy_type(env, &pick.type_key, 1);
                        }
                    }
                    spawned
                }
            };

            debug!(wave = self.wave_number, label = %event.label, spawned, "wave event fired");
            env.events.emit(SimEvent::WaveEventFired {
                wave: self.wave_number,
                label: event.label.clone(),
                spawned,
            });
        }
    }

    fn start_wave(&mut self, index: usize, events: &mut SimEvents) {
        self.index = index;
        self.elapsed = 0.0;
        self.budget = 0.0;
        self.fired = vec![false; self.waves[index].events.len()];
        self.wave_number += 1;
        self.phase = WavePhase::Active;
        debug!(wave = self.wave_number, index, "wave started");
        events.emit(SimEvent::WaveStarted {
            wave: self.wave_number,
        });
    }

    fn complete_wave(&mut self, events: &mut SimEvents) {
        let wave = self.wave_number;
        debug!(wave, "wave completed");
        events.emit(SimEvent::WaveCompleted { wave });

        let last = self.index + 1 >= self.waves.len();
        if last && !self.endless {
            self.phase = WavePhase::Finished;
            debug!("all waves finished");
            events.emit(SimEvent::WavesFinished);
            return;
        }

        self.next_index = if last { self.index } else { self.index + 1 };
        if self.intermission_secs > 0.0 {
            self.phase = WavePhase::Intermission {
                remaining: self.intermission_secs,
            };
        } else {
            self.start_wave(self.next_index, events);
        }
    }

    /// Force-complete the active wave now. During an intermission, start the
    /// next wave instead. Returns false when there is nothing to skip.
    pub fn skip_to_next_wave(&mut self, events: &mut SimEvents) -> bool {
        match self.phase {
            WavePhase::Finished => false,
            WavePhase::Pending => {
                if self.waves.is_empty() {
                    return false;
                }
                self.start_wave(0, events);
                self.complete_wave(events);
                true
            }
            WavePhase::Active => {
                self.complete_wave(events);
                true
            }
            WavePhase::Intermission { .. } => {
                self.start_wave(self.next_index, events);
                true
            }
        }
    }

    /// Read-only view for HUD display.
    pub fn snapshot(&self) -> WaveSnapshot {
        let (in_intermission, intermission_remaining) = match self.phase {
            WavePhase::Intermission { remaining } => (true, remaining.max(0.0)),
            _ => (false, 0.0),
        };
        let shown = if in_intermission {
            self.waves.get(self.next_index)
        } else {
            self.waves.get(self.index)
        };

        let time_remaining = match (self.phase, shown) {
            (WavePhase::Active, Some(wave)) => (wave.duration_secs - self.elapsed).max(0.0),
            _ => 0.0,
        };

        let next_event = match (self.phase, shown) {
            (WavePhase::Active, Some(wave)) => wave
                .events
                .iter()
                .enumerate()
                .filter(|(i, _)| !self.fired.get(*i).copied().unwrap_or(false))
                .min_by(|(_, a), (_, b)| a.at_secs.total_cmp(&b.at_secs))
                .map(|(_, e)| EventPreview {
                    label: e.label.clone(),
                    in_secs: (e.at_secs - self.elapsed).max(0.0),
                }),
            (WavePhase::Intermission { .. }, Some(wave)) => wave
                .events
                .iter()
                .min_by(|a, b| a.at_secs.total_cmp(&b.at_secs))
                .map(|e| EventPreview {
                    label: e.label.clone(),
                    in_secs: intermission_remaining + e.at_secs,
                }),
            _ => None,
        };

        WaveSnapshot {
            wave_number: self.wave_number,
            elapsed_secs: self.elapsed,
            time_remaining_secs: time_remaining,
            budget: self.budget,
            budget_per_second: shown.map_or(0.0, |w| w.budget_per_second),
            in_intermission,
            intermission_remaining_secs: intermission_remaining,
            endless: self.endless,
            finished: self.is_finished(),
            next_event,
        }
    }
}
