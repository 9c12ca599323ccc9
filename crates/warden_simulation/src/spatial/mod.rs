//! Spatial queries (sphere overlap, ray first-hit).
//!
//! Architecture:
//! - `SpatialQuery` - narrow trait, всё что AI/combat знают о физике
//! - `SpatialIndex` - in-crate provider, rebuilt from `Body` components каждый тик
//! - `Layers` - collision layer bitmask (membership + query mask)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod index;

pub use index::{rebuild_spatial_index, SpatialIndex};

bitflags::bitflags! {
    /// Collision layers. A body's `layers` is its membership, queries pass a mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Layers: u32 {
        const PLAYER = 1 << 0;
        const ENEMY = 1 << 1;
        const OBSTACLE = 1 << 2;
        const PROP = 1 << 3;
        /// Receives noise broadcasts
        const LISTENER = 1 << 4;

        /// Everything that blocks a ray
        const SOLID = Self::PLAYER.bits() | Self::ENEMY.bits() | Self::OBSTACLE.bits() | Self::PROP.bits();
        /// Default melee hit mask
        const DAMAGEABLE = Self::PLAYER.bits() | Self::PROP.bits();
        /// Default projectile contact mask
        const PROJECTILE_TARGETS = Self::PLAYER.bits() | Self::OBSTACLE.bits() | Self::PROP.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Axis-aligned box (rotation ignored)
    Cuboid { half_extents: Vec3 },
}

/// Collision body registered in the spatial index.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub shape: Shape,
    /// Shape centre relative to `Transform::translation`
    pub offset: Vec3,
    pub layers: Layers,
}

impl Body {
    pub fn sphere(radius: f32, layers: Layers) -> Self {
        Self {
            shape: Shape::Sphere { radius },
            offset: Vec3::ZERO,
            layers,
        }
    }

    pub fn cuboid(half_extents: Vec3, layers: Layers) -> Self {
        Self {
            shape: Shape::Cuboid { half_extents },
            offset: Vec3::ZERO,
            layers,
        }
    }

    /// Humanoid box standing on its origin (0..1.8m tall).
    pub fn actor(layers: Layers) -> Self {
        Self::cuboid(Vec3::new(0.4, 0.9, 0.4), layers).with_offset(Vec3::new(0.0, 0.9, 0.0))
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
}

/// Spatial query provider consumed by perception and combat.
pub trait SpatialQuery {
    /// Entities whose body intersects the sphere and matches `mask`.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layers) -> Vec<Entity>;

    /// All hits along the ray, nearest first.
    fn raycast_hits(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Layers) -> Vec<RayHit>;

    fn raycast_first_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Layers,
    ) -> Option<Entity> {
        self.raycast_hits(origin, direction, max_distance, mask)
            .first()
            .map(|hit| hit.entity)
    }
}
