use glam::Vec2;

use holdout_core::constants::BRUTE_CHARGE_SPEED_FACTOR;
use holdout_core::enums::{AiBehavior, AttackStyle};

use crate::behavior::{evaluate, BehaviorContext, SteeringMode};
use crate::profiles::{AiTuning, BehaviorTable};

fn make_context(behavior: AiBehavior, distance: f32) -> BehaviorContext {
    let tuning = BehaviorTable::default().tuning_for(match behavior {
        AiBehavior::Chaser => "SmallChaser",
        AiBehavior::Brute => "Brute",
        AiBehavior::Spitter => "Spitter",
    });
    BehaviorContext {
        behavior,
        position: Vec2::ZERO,
        target: Some(Vec2::new(distance, 0.0)),
        speed: 100.0,
        move_speed: 1.0,
        aggro_radius: tuning.aggro_radius,
        attack_radius: tuning.attack_radius,
        ideal_min: tuning.ideal_min,
        ideal_max: tuning.ideal_max,
        attack_ready: true,
        locked: false,
    }
}

#[test]
fn test_chaser_approaches_target() {
    let update = evaluate(&make_context(AiBehavior::Chaser, 500.0));
    assert_eq!(update.mode, SteeringMode::Approach);
    assert_eq!(update.velocity, Vec2::new(100.0, 0.0));
    assert_eq!(update.facing, Some(Vec2::X));
    assert!(update.attack.is_none());
}

#[test]
fn test_no_target_is_idle() {
    let mut ctx = make_context(AiBehavior::Chaser, 10.0);
    ctx.target = None;
    let update = evaluate(&ctx);
    assert_eq!(update.mode, SteeringMode::Idle);
    assert_eq!(update.velocity, Vec2::ZERO);
    assert!(update.attack.is_none());
}

#[test]
fn test_outside_aggro_halts() {
    let mut ctx = make_context(AiBehavior::Chaser, 600.0);
    ctx.aggro_radius = 500.0;
    let update = evaluate(&ctx);
    assert_eq!(update.mode, SteeringMode::Idle);
    assert_eq!(update.velocity, Vec2::ZERO);
}

#[test]
fn test_attack_in_range_when_ready() {
    let update = evaluate(&make_context(AiBehavior::Chaser, 20.0));
    assert_eq!(update.attack, Some(Vec2::X));
}

#[test]
fn test_no_attack_while_cooling_down() {
    let mut ctx = make_context(AiBehavior::Chaser, 20.0);
    ctx.attack_ready = false;
    assert!(evaluate(&ctx).attack.is_none());
}

#[test]
fn test_locked_enemy_holds_still() {
    let mut ctx = make_context(AiBehavior::Chaser, 200.0);
    ctx.locked = true;
    let update = evaluate(&ctx);
    assert_eq!(update.mode, SteeringMode::Hold);
    assert_eq!(update.velocity, Vec2::ZERO);
}

#[test]
fn test_brute_charges_when_close() {
    let far = evaluate(&make_context(AiBehavior::Brute, 400.0));
    assert_eq!(far.mode, SteeringMode::Approach);

    let near = evaluate(&make_context(AiBehavior::Brute, 80.0));
    assert_eq!(near.mode, SteeringMode::Charge);
    assert!((near.velocity.x - 100.0 * BRUTE_CHARGE_SPEED_FACTOR).abs() < 1e-3);
}

#[test]
fn test_spitter_kites() {
    let close = evaluate(&make_context(AiBehavior::Spitter, 100.0));
    assert_eq!(close.mode, SteeringMode::Retreat);
    assert!(close.velocity.x < 0.0);
    // Still faces and shoots at the target while backing off.
    assert_eq!(close.facing, Some(Vec2::X));
    assert!(close.attack.is_some());

    let band = evaluate(&make_context(AiBehavior::Spitter, 240.0));
    assert_eq!(band.mode, SteeringMode::Hold);
    assert_eq!(band.velocity, Vec2::ZERO);

    let far = evaluate(&make_context(AiBehavior::Spitter, 800.0));
    assert_eq!(far.mode, SteeringMode::Approach);
    assert!(far.velocity.x > 0.0);
    assert!(far.attack.is_none());
}

#[test]
fn test_on_top_of_target_has_no_facing() {
    let update = evaluate(&make_context(AiBehavior::Chaser, 0.0));
    assert_eq!(update.facing, None);
    assert_eq!(update.velocity, Vec2::ZERO);
}

#[test]
fn test_on_top_of_target_holds_attack() {
    for behavior in [AiBehavior::Chaser, AiBehavior::Spitter] {
        let ctx = make_context(behavior, 0.0);
        assert!(ctx.attack_ready);
        assert!(evaluate(&ctx).attack.is_none());
    }
}

#[test]
fn test_move_speed_scales_velocity() {
    let mut ctx = make_context(AiBehavior::Chaser, 500.0);
    ctx.move_speed = 0.5;
    assert_eq!(evaluate(&ctx).velocity, Vec2::new(50.0, 0.0));
}

#[test]
fn test_unknown_type_falls_back_to_chaser() {
    let table = BehaviorTable::default();
    assert_eq!(table.tuning_for("Nope"), AiTuning::default());
    assert_eq!(table.len(), 4);
    assert!(matches!(
        table.tuning_for("Spitter").style,
        AttackStyle::Ranged { ref projectile } if projectile == "SpitterGlob"
    ));
}

#[test]
fn test_table_json_is_a_plain_map() {
    let json = r#"{"Bat": {"behavior": "Spitter", "ideal_min": 50.0}}"#;
    let table: BehaviorTable = serde_json::from_str(json).unwrap();
    let bat = table.tuning_for("Bat");
    assert_eq!(bat.behavior, AiBehavior::Spitter);
    assert_eq!(bat.ideal_min, 50.0);
    assert_eq!(bat.move_speed, 1.0);
}
