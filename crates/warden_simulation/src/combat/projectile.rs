//! Ranged projectiles: constant speed, swept ray per tick, removed on first contact.

use bevy::prelude::*;

use super::{DamageHit, DamageRequest, DamageType};
use crate::components::Health;
use crate::spatial::{Layers, SpatialIndex, SpatialQuery};

/// Resolved ranged strike (output of the ranged attack strategy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedStrike {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub lifetime: f32,
    /// Re-aimed every tick toward this entity's torso
    pub homing: Option<Entity>,
    pub aim_height: f32,
    pub hit_mask: Layers,
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner: Entity,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub homing: Option<Entity>,
    pub aim_height: f32,
    pub hit_mask: Layers,
    pub expires_at: f32,
}

impl Projectile {
    pub fn launch(owner: Entity, strike: &RangedStrike, now: f32) -> Self {
        Self {
            owner,
            direction: strike.direction,
            speed: strike.speed,
            damage: strike.damage,
            damage_type: strike.damage_type,
            homing: strike.homing,
            aim_height: strike.aim_height,
            hit_mask: strike.hit_mask,
            expires_at: now + strike.lifetime,
        }
    }

    /// Light re-aim toward the tracked point.
    pub fn steer_towards(&mut self, position: Vec3, aim_point: Vec3) {
        if let Some(direction) = (aim_point - position).try_normalize() {
            self.direction = direction;
        }
    }

    /// First contact along this tick's travel segment (owner excluded).
    pub fn first_contact<S: SpatialQuery + ?Sized>(
        &self,
        spatial: &S,
        position: Vec3,
        travel: f32,
    ) -> Option<Entity> {
        spatial
            .raycast_hits(position, self.direction, travel, self.hit_mask)
            .into_iter()
            .map(|hit| hit.entity)
            .find(|entity| *entity != self.owner)
    }
}

/// System: fly projectiles, damage on first contact, expire on lifetime.
pub fn advance_projectiles(
    time: Res<Time<Fixed>>,
    index: Res<SpatialIndex>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
    anchors: Query<&Transform, Without<Projectile>>,
    vitals: Query<&Health>,
    mut damage: EventWriter<DamageRequest>,
) {
    let now = time.elapsed_secs();
    let delta = time.delta_secs();

    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        if now >= projectile.expires_at {
            commands.entity(entity).despawn();
            continue;
        }

        if let Some(tracked) = projectile.homing {
            if let Ok(anchor) = anchors.get(tracked) {
                let aim = anchor.translation + Vec3::Y * projectile.aim_height;
                projectile.steer_towards(transform.translation, aim);
            }
        }

        let travel = projectile.speed * delta;
        if let Some(contact) = projectile.first_contact(&*index, transform.translation, travel) {
            // Снаряд исчезает при любом первом контакте, урон только по живым Damageable
            if vitals.get(contact).is_ok_and(|health| health.is_alive()) {
                damage.write(DamageRequest {
                    target: contact,
                    hit: DamageHit {
                        amount: projectile.damage,
                        damage_type: projectile.damage_type,
                        hit_point: transform.translation,
                        source: projectile.owner,
                    },
                });
            }
            crate::log(&format!(
                "🎯 Projectile from {:?} struck {:?}",
                projectile.owner, contact
            ));
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation += projectile.direction * travel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Body;

    fn strike() -> RangedStrike {
        RangedStrike {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            speed: 12.0,
            damage: 10.0,
            damage_type: DamageType::Magic,
            lifetime: 5.0,
            homing: None,
            aim_height: 1.5,
            hit_mask: Layers::PROJECTILE_TARGETS | Layers::ENEMY,
        }
    }

    #[test]
    fn test_owner_never_contacted() {
        let owner = Entity::from_raw(1);
        let target = Entity::from_raw(2);
        let mut index = SpatialIndex::default();
        index.insert(owner, Vec3::new(0.0, 0.0, -0.5), &Body::sphere(0.3, Layers::ENEMY));
        index.insert(target, Vec3::new(0.0, 0.0, -3.0), &Body::sphere(0.3, Layers::PLAYER));

        let projectile = Projectile::launch(owner, &strike(), 0.0);
        assert_eq!(projectile.first_contact(&index, Vec3::ZERO, 5.0), Some(target));
    }

    #[test]
    fn test_obstacle_is_first_contact() {
        let wall = Entity::from_raw(1);
        let target = Entity::from_raw(2);
        let mut index = SpatialIndex::default();
        index.insert(wall, Vec3::new(0.0, 0.0, -2.0), &Body::cuboid(Vec3::splat(0.5), Layers::OBSTACLE));
        index.insert(target, Vec3::new(0.0, 0.0, -4.0), &Body::sphere(0.3, Layers::PLAYER));

        let projectile = Projectile::launch(Entity::PLACEHOLDER, &strike(), 0.0);
        assert_eq!(projectile.first_contact(&index, Vec3::ZERO, 10.0), Some(wall));
        assert_eq!(projectile.first_contact(&index, Vec3::ZERO, 1.0), None);
    }

    #[test]
    fn test_launch_lifetime_and_steer() {
        let mut projectile = Projectile::launch(Entity::PLACEHOLDER, &strike(), 2.0);
        assert_eq!(projectile.expires_at, 7.0);

        projectile.steer_towards(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        assert!((projectile.direction - Vec3::X).length() < 1e-5);

        projectile.steer_towards(Vec3::ZERO, Vec3::ZERO);
        assert!((projectile.direction - Vec3::X).length() < 1e-5);
    }
}
