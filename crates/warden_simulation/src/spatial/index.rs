//! Brute-force spatial index over `Body` components.

use bevy::prelude::*;

use super::{Body, Layers, RayHit, Shape, SpatialQuery};
use crate::combat::Dead;

#[derive(Debug, Clone, Copy)]
struct IndexedBody {
    entity: Entity,
    center: Vec3,
    shape: Shape,
    layers: Layers,
}

impl IndexedBody {
    fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        match self.shape {
            Shape::Sphere { radius: own } => self.center.distance(center) <= own + radius,
            Shape::Cuboid { half_extents } => {
                let min = self.center - half_extents;
                let max = self.center + half_extents;
                center.clamp(min, max).distance(center) <= radius
            }
        }
    }

    fn contains(&self, point: Vec3) -> bool {
        match self.shape {
            Shape::Sphere { radius } => self.center.distance(point) <= radius,
            Shape::Cuboid { half_extents } => {
                let local = (point - self.center).abs();
                local.cmple(half_extents).all()
            }
        }
    }

    /// Entry distance along a normalized ray.
    fn ray_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match self.shape {
            Shape::Sphere { radius } => {
                let m = origin - self.center;
                let b = m.dot(direction);
                let c = m.length_squared() - radius * radius;
                if c > 0.0 && b > 0.0 {
                    return None;
                }
                let discriminant = b * b - c;
                if discriminant < 0.0 {
                    return None;
                }
                Some((-b - discriminant.sqrt()).max(0.0))
            }
            Shape::Cuboid { half_extents } => {
                let min = self.center - half_extents;
                let max = self.center + half_extents;
                let mut t_min = 0.0_f32;
                let mut t_max = f32::INFINITY;

                for axis in 0..3 {
                    let o = origin[axis];
                    let d = direction[axis];
                    if d.abs() < 1e-8 {
                        if o < min[axis] || o > max[axis] {
                            return None;
                        }
                        continue;
                    }
                    let inv = 1.0 / d;
                    let mut t1 = (min[axis] - o) * inv;
                    let mut t2 = (max[axis] - o) * inv;
                    if t1 > t2 {
                        std::mem::swap(&mut t1, &mut t2);
                    }
                    t_min = t_min.max(t1);
                    t_max = t_max.min(t2);
                    if t_min > t_max {
                        return None;
                    }
                }
                Some(t_min)
            }
        }
    }
}

/// Snapshot of every collision body for the current tick.
#[derive(Resource, Debug, Default)]
pub struct SpatialIndex {
    bodies: Vec<IndexedBody>,
}

impl SpatialIndex {
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn insert(&mut self, entity: Entity, position: Vec3, body: &Body) {
        self.bodies.push(IndexedBody {
            entity,
            center: position + body.offset,
            shape: body.shape,
            layers: body.layers,
        });
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn sort(&mut self) {
        self.bodies.sort_by_key(|body| body.entity);
    }
}

impl SpatialQuery for SpatialIndex {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layers) -> Vec<Entity> {
        self.bodies
            .iter()
            .filter(|body| body.layers.intersects(mask))
            .filter(|body| body.intersects_sphere(center, radius))
            .map(|body| body.entity)
            .collect()
    }

    fn raycast_hits(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Layers) -> Vec<RayHit> {
        let Some(direction) = direction.try_normalize() else {
            return Vec::new();
        };

        let mut hits: Vec<RayHit> = self
            .bodies
            .iter()
            .filter(|body| body.layers.intersects(mask))
            // Тело, внутри которого стартует луч (сам стрелок/наблюдатель), не считается
            .filter(|body| !body.contains(origin))
            .filter_map(|body| {
                let distance = body.ray_distance(origin, direction)?;
                (distance <= max_distance).then(|| RayHit {
                    entity: body.entity,
                    distance,
                    point: origin + direction * distance,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        hits
    }
}

/// System: rebuild the index from live bodies (first system of the tick).
pub fn rebuild_spatial_index(
    mut index: ResMut<SpatialIndex>,
    bodies: Query<(Entity, &Transform, &Body), Without<Dead>>,
) {
    index.clear();
    for (entity, transform, body) in bodies.iter() {
        index.insert(entity, transform.translation, body);
    }
    index.sort();
}
