//! Combat integration tests: ranged strikes end-to-end
//!
//! Headless App, ManualDuration 1/60s, реальные plugins:
//! - caster кастует bolt, игрок теряет ровно ranged.damage один раз
//! - obstacle на линии огня поглощает снаряд без урона
//! - lifetime истёк → снаряд удалён
//! - homing доводит снаряд до цели

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use warden_simulation::combat::{Projectile, RangedStrike};
use warden_simulation::spatial::{Body, Layers};
use warden_simulation::*;

#[derive(Resource, Default)]
struct DamageLog(Vec<DamageDealt>);

fn record_damage(mut log: ResMut<DamageLog>, mut dealt: EventReader<DamageDealt>) {
    log.0.extend(dealt.read().cloned());
}

fn create_test_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)))
        .init_resource::<DamageLog>()
        .add_systems(FixedUpdate, record_damage.after(SimulationSet::Resolve));
    app
}

fn run(app: &mut App, updates: usize) {
    for _ in 0..updates {
        app.update();
    }
}

fn live_projectiles(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&Projectile>().iter(world).count()
}

/// Bolt из (0, 1.5, 0), по умолчанию летит в -Z
fn bolt(direction: Vec3, lifetime: f32, homing: Option<Entity>) -> RangedStrike {
    RangedStrike {
        origin: Vec3::new(0.0, 1.5, 0.0),
        direction,
        speed: 12.0,
        damage: 10.0,
        damage_type: DamageType::Magic,
        lifetime,
        homing,
        aim_height: 1.5,
        hit_mask: Layers::PROJECTILE_TARGETS,
    }
}

fn fire(app: &mut App, strike: RangedStrike) -> Entity {
    let owner = app.world_mut().spawn_empty().id();
    app.world_mut()
        .spawn((
            Transform::from_translation(strike.origin),
            Projectile::launch(owner, &strike, 0.0),
        ))
        .id()
}

#[test]
fn test_caster_bolt_hits_player_once() {
    let mut app = create_test_app(5);
    let player = app.world_mut().spawn(PlayerBundle::new(Vec3::new(0.0, 0.0, -6.0))).id();

    let archetype = app.world_mut().resource_mut::<ArchetypeRegistry>().resolve("caster");
    let ranged_damage = archetype.ranged.damage;
    let caster = app
        .world_mut()
        .spawn(AgentBundle::new(archetype, Vec3::ZERO, 17))
        .id();

    // Cooldown 2s: за 100 тиков (≈1.67s) ровно один bolt
    let mut saw_projectile = false;
    for _ in 0..100 {
        app.update();
        saw_projectile |= live_projectiles(&mut app) > 0;
    }

    assert!(saw_projectile, "caster never cast");
    assert_eq!(live_projectiles(&mut app), 0);

    let health = app.world().get::<Health>(player).copied().unwrap();
    assert_eq!(health.current, health.max - ranged_damage);

    let log = &app.world().resource::<DamageLog>().0;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].attacker, caster);
    assert_eq!(log[0].target, player);
    assert_eq!(log[0].damage_type, DamageType::Magic);
}

#[test]
fn test_obstacle_absorbs_projectile() {
    let mut app = create_test_app(6);
    let player = app.world_mut().spawn(PlayerBundle::new(Vec3::new(0.0, 0.0, -6.0))).id();
    app.world_mut().spawn((
        Transform::from_xyz(0.0, 1.5, -3.0),
        Body::cuboid(Vec3::splat(0.5), Layers::OBSTACLE),
    ));
    let projectile = fire(&mut app, bolt(Vec3::NEG_Z, 5.0, None));

    run(&mut app, 60);

    assert!(app.world().get_entity(projectile).is_err());
    assert_eq!(live_projectiles(&mut app), 0);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 100.0);
    assert!(app.world().resource::<DamageLog>().0.is_empty());
}

#[test]
fn test_projectile_expires_after_lifetime() {
    let mut app = create_test_app(7);
    fire(&mut app, bolt(Vec3::X, 0.5, None));

    run(&mut app, 15);
    assert_eq!(live_projectiles(&mut app), 1);

    // Летел в пустоту, но не дальше lifetime
    let position = {
        let world = app.world_mut();
        world
            .query_filtered::<&Transform, With<Projectile>>()
            .iter(world)
            .next()
            .map(|transform| transform.translation)
            .unwrap()
    };
    assert!(position.x > 2.0);

    run(&mut app, 30);
    assert_eq!(live_projectiles(&mut app), 0);
}

#[test]
fn test_homing_turns_toward_target() {
    // Без homing снаряд уходит в +X и промахивается
    let mut app = create_test_app(8);
    let player = app.world_mut().spawn(PlayerBundle::new(Vec3::new(0.0, 0.0, -6.0))).id();
    fire(&mut app, bolt(Vec3::X, 2.0, None));
    run(&mut app, 90);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 100.0);

    let mut app = create_test_app(8);
    let player = app.world_mut().spawn(PlayerBundle::new(Vec3::new(0.0, 0.0, -6.0))).id();
    fire(&mut app, bolt(Vec3::X, 2.0, Some(player)));
    run(&mut app, 90);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 90.0);
    assert_eq!(live_projectiles(&mut app), 0);
}
