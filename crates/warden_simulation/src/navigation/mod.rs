//! Navigation: `Navigator` capability + kinematic steering implementation.
//!
//! AI никогда не считает путь сам - только просит Navigator
//! (destination, speed, halt/resume) и спрашивает "дошёл?".

use bevy::prelude::*;
use rand::{Rng, RngCore};

pub mod systems;

#[cfg(test)]
pub mod mock;

pub use systems::steer_navigators;

/// Extra slack added to stopping distance for arrival checks.
pub const ARRIVAL_EPSILON: f32 = 0.05;

/// Path-following capability consumed by the agent state machine.
pub trait Navigator {
    /// `false` when the point is not on the navigable surface.
    fn set_destination(&mut self, point: Vec3) -> bool;
    fn has_arrived(&self) -> bool;
    fn halt(&mut self);
    fn resume(&mut self);
    fn set_speed(&mut self, speed: f32);
    fn try_sample_navigable_point(
        &self,
        center: Vec3,
        radius: f32,
        max_attempts: u32,
        rng: &mut dyn RngCore,
    ) -> Option<Vec3>;
}

/// Distance on the ground plane.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Yaw (radians around +Y) that makes `-Z` point along `direction`.
pub fn yaw_towards(direction: Vec3) -> Option<f32> {
    let flat = Vec2::new(direction.x, direction.z);
    if flat.length_squared() < 1e-8 {
        return None;
    }
    Some(f32::atan2(-flat.x, -flat.y))
}

pub fn yaw_of(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::YXZ).0
}

/// Uniform point in a horizontal disc.
pub fn random_point_in_disc(center: Vec3, radius: f32, rng: &mut dyn RngCore) -> Vec3 {
    if radius <= 0.0 {
        return center;
    }
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = rng.gen::<f32>().sqrt() * radius;
    center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}

/// Rectangular walkable area on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl NavBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.z >= self.min.y && point.z <= self.max.y
    }
}

/// Straight-line navigator steering its own `Transform`.
#[derive(Component, Debug, Clone)]
pub struct KinematicNavigator {
    pub position: Vec3,
    destination: Option<Vec3>,
    halted: bool,
    desired_speed: f32,
    pub current_speed: f32,
    pub acceleration: f32,
    /// Degrees per second
    pub angular_speed: f32,
    pub stopping_distance: f32,
    pub bounds: Option<NavBounds>,
}

impl KinematicNavigator {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            destination: None,
            halted: false,
            desired_speed: 0.0,
            current_speed: 0.0,
            acceleration: 8.0,
            angular_speed: 120.0,
            stopping_distance: 1.2,
            bounds: None,
        }
    }

    pub fn from_config(position: Vec3, config: &crate::config::CombatantConfig) -> Self {
        Self {
            acceleration: config.movement.acceleration,
            angular_speed: config.movement.angular_speed,
            stopping_distance: config.clamped_stopping_distance(),
            desired_speed: config.movement.patrol_speed,
            ..Self::new(position)
        }
    }

    pub fn with_bounds(mut self, bounds: NavBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn sync_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn speed(&self) -> f32 {
        self.desired_speed
    }

    fn is_navigable(&self, point: Vec3) -> bool {
        self.bounds.map_or(true, |bounds| bounds.contains(point))
    }

    /// Velocity for this tick (Vec3::ZERO when parked).
    pub fn step(&mut self, delta: f32) -> Vec3 {
        let target_speed = match self.destination {
            Some(_) if !self.halted && !self.has_arrived() => self.desired_speed,
            _ => 0.0,
        };

        if self.current_speed < target_speed {
            self.current_speed = (self.current_speed + self.acceleration * delta).min(target_speed);
        } else {
            self.current_speed = (self.current_speed - self.acceleration * delta).max(target_speed);
        }

        let Some(destination) = self.destination else {
            return Vec3::ZERO;
        };
        if self.halted || self.current_speed <= 0.0 {
            return Vec3::ZERO;
        }

        let to_goal = Vec3::new(destination.x - self.position.x, 0.0, destination.z - self.position.z);
        let remaining = to_goal.length() - self.stopping_distance;
        if remaining <= 0.0 {
            return Vec3::ZERO;
        }

        let travel = (self.current_speed * delta).min(remaining);
        to_goal.normalize_or_zero() * (travel / delta.max(f32::EPSILON))
    }
}

impl Navigator for KinematicNavigator {
    fn set_destination(&mut self, point: Vec3) -> bool {
        if !self.is_navigable(point) {
            return false;
        }
        self.destination = Some(point);
        true
    }

    fn has_arrived(&self) -> bool {
        self.destination.map_or(true, |goal| {
            planar_distance(self.position, goal) <= self.stopping_distance + ARRIVAL_EPSILON
        })
    }

    fn halt(&mut self) {
        self.halted = true;
        self.current_speed = 0.0;
    }

    fn resume(&mut self) {
        self.halted = false;
    }

    fn set_speed(&mut self, speed: f32) {
        self.desired_speed = speed.max(0.0);
    }

    fn try_sample_navigable_point(
        &self,
        center: Vec3,
        radius: f32,
        max_attempts: u32,
        rng: &mut dyn RngCore,
    ) -> Option<Vec3> {
        if self.is_navigable(center) {
            return Some(center);
        }
        (0..max_attempts)
            .map(|_| random_point_in_disc(center, radius, &mut *rng))
            .find(|point| self.is_navigable(*point))
    }
}

/// Plugin: steering after combat resolution (Move set).
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            steer_navigators.in_set(crate::SimulationSet::Move),
        );
    }
}
