//! Ambient threat sounds: player footsteps and knocked-over props.

use bevy::prelude::*;

use super::{NoiseCategory, NoiseEvent, NoiseRequest};
use crate::combat::Dead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gait {
    #[default]
    Walk,
    Run,
    Crouch,
}

/// Emits a threat sound at a fixed cadence while the body is moving.
#[derive(Component, Debug, Clone)]
pub struct FootstepNoise {
    pub gait: Gait,
    pub interval: f32,
    pub walk_radius: f32,
    pub run_bonus: f32,
    pub crouch_factor: f32,
    next_step_at: f32,
    last_position: Option<Vec3>,
}

impl Default for FootstepNoise {
    fn default() -> Self {
        Self {
            gait: Gait::Walk,
            interval: 0.3,
            walk_radius: 5.0,
            run_bonus: 3.0,
            crouch_factor: 0.5,
            next_step_at: 0.0,
            last_position: None,
        }
    }
}

impl FootstepNoise {
    pub fn radius(&self) -> f32 {
        match self.gait {
            Gait::Walk => self.walk_radius,
            Gait::Run => self.walk_radius + self.run_bonus,
            Gait::Crouch => self.walk_radius * self.crouch_factor,
        }
    }

    /// Tracks movement; returns a radius when a step should be heard.
    pub fn step(&mut self, position: Vec3, now: f32) -> Option<f32> {
        let moved = self
            .last_position
            .is_some_and(|last| last.distance_squared(position) > 1e-6);
        self.last_position = Some(position);

        if !moved || now < self.next_step_at {
            return None;
        }
        self.next_step_at = now + self.interval;
        Some(self.radius())
    }
}

/// Prop that makes a noise when something knocks it over.
#[derive(Component, Debug, Clone, Copy)]
pub struct Distractible {
    pub radius: f32,
}

impl Default for Distractible {
    fn default() -> Self {
        Self { radius: 7.0 }
    }
}

/// Event: something hit a distractible prop (thrown bottle, shove).
#[derive(Event, Debug, Clone, Copy)]
pub struct PropImpact {
    pub prop: Entity,
}

/// System: footstep noise for moving bodies.
pub fn emit_footsteps(
    time: Res<Time<Fixed>>,
    mut walkers: Query<(Entity, &Transform, &mut FootstepNoise), Without<Dead>>,
    mut noises: EventWriter<NoiseRequest>,
) {
    let now = time.elapsed_secs();

    for (entity, transform, mut footsteps) in walkers.iter_mut() {
        if let Some(radius) = footsteps.step(transform.translation, now) {
            noises.write(NoiseRequest {
                source: Some(entity),
                event: NoiseEvent {
                    position: transform.translation,
                    radius,
                    category: NoiseCategory::ThreatSound,
                },
            });
        }
    }
}

/// System: prop impacts → threat sound at the prop.
pub fn sound_distractions(
    mut impacts: EventReader<PropImpact>,
    props: Query<(&Transform, &Distractible)>,
    mut noises: EventWriter<NoiseRequest>,
) {
    for impact in impacts.read() {
        let Ok((transform, distractible)) = props.get(impact.prop) else {
            continue;
        };
        noises.write(NoiseRequest {
            source: Some(impact.prop),
            event: NoiseEvent {
                position: transform.translation,
                radius: distractible.radius,
                category: NoiseCategory::ThreatSound,
            },
        });
        crate::log(&format!("🍾 Prop {:?} knocked over", impact.prop));
    }
}
