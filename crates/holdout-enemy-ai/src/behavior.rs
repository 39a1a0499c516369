//! Enemy steering state machine.
//!
//! Pure functions that compute velocity, facing and attack intent for one
//! enemy from its behaviour, timers and the resolved target. No ECS
//! dependency; operates on plain data.

use glam::Vec2;

use holdout_core::constants::AI_MIN_DISTANCE;
use holdout_core::enums::AiBehavior;

use crate::profiles::{get_profile, BehaviorProfile};

/// Input to the behaviour evaluation for a single enemy.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext {
    pub behavior: AiBehavior,
    pub position: Vec2,
    /// Resolved target position, `None` when there is nothing to chase.
    pub target: Option<Vec2>,
    /// Live `Transform::speed` (already scaled by status effects).
    pub speed: f32,
    /// `Ai::move_speed` multiplier.
    pub move_speed: f32,
    pub aggro_radius: f32,
    pub attack_radius: f32,
    pub ideal_min: f32,
    pub ideal_max: f32,
    /// AI cooldown, AI lock and Attack timers have all elapsed.
    pub attack_ready: bool,
    /// Post-attack lock is still running.
    pub locked: bool,
}

/// How the enemy is moving this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringMode {
    /// No target or outside aggression radius.
    Idle,
    Approach,
    Charge,
    /// Spitter backing away to its ideal band.
    Retreat,
    /// Inside the ideal band, or locked after an attack.
    Hold,
}

/// Output of the behaviour evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorUpdate {
    pub velocity: Vec2,
    /// New facing, if the target gave a usable direction.
    pub facing: Option<Vec2>,
    /// Normalised attack direction when the enemy attacks this tick.
    pub attack: Option<Vec2>,
    pub mode: SteeringMode,
}

impl BehaviorUpdate {
    fn idle() -> Self {
        Self {
            velocity: Vec2::ZERO,
            facing: None,
            attack: None,
            mode: SteeringMode::Idle,
        }
    }
}

/// Evaluate one enemy for this tick.
pub fn evaluate(ctx: &BehaviorContext) -> BehaviorUpdate {
    let Some(target) = ctx.target else {
        return BehaviorUpdate::idle();
    };

    let offset = target - ctx.position;
    let distance = offset.length();
    if distance > ctx.aggro_radius {
        return BehaviorUpdate::idle();
    }

    let dir = if distance > AI_MIN_DISTANCE {
        offset / distance
    } else {
        Vec2::ZERO
    };
    let facing = (dir != Vec2::ZERO).then_some(dir);

    // No attack without a usable direction; the cooldown stays unspent.
    let attack = facing.filter(|_| ctx.attack_ready && distance <= ctx.attack_radius);

    if ctx.locked {
        return BehaviorUpdate {
            velocity: Vec2::ZERO,
            facing,
            attack,
            mode: SteeringMode::Hold,
        };
    }

    let profile = get_profile(ctx.behavior);
    let (heading, mode, factor) = steer(ctx, &profile, dir, distance);
    BehaviorUpdate {
        velocity: heading * ctx.speed * ctx.move_speed * factor,
        facing,
        attack,
        mode,
    }
}

fn steer(
    ctx: &BehaviorContext,
    profile: &BehaviorProfile,
    dir: Vec2,
    distance: f32,
) -> (Vec2, SteeringMode, f32) {
    if profile.kites {
        if distance < ctx.ideal_min {
            return (-dir, SteeringMode::Retreat, 1.0);
        }
        if distance <= ctx.ideal_max {
            return (Vec2::ZERO, SteeringMode::Hold, 0.0);
        }
        return (dir, SteeringMode::Approach, 1.0);
    }

    if let Some(charge) = profile.charge_range_factor {
        if distance <= ctx.attack_radius * charge {
            return (dir, SteeringMode::Charge, profile.charge_speed_factor);
        }
    }

    (dir, SteeringMode::Approach, 1.0)
}
