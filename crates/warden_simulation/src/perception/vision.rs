//! Vision Sensor: distance → cone → line of sight.
//!
//! Sensor тикает с интервалом (не каждый кадр). Между проверками
//! `can_see_target` держит последнее значение.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AllyAlerter, NoiseCategory, NoiseEvent, NoiseRequest, PerceptionState};
use crate::combat::Dead;
use crate::components::{Health, Player};
use crate::config::{Archetype, CombatantConfig};
use crate::spatial::{SpatialIndex, SpatialQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisionMode {
    /// Distance only, walls ignored
    DistanceOnly,
    /// Distance + ray occlusion
    #[default]
    LineOfSight,
    /// Distance + field-of-view cone + ray occlusion
    Cone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub visible: bool,
    pub position: Vec3,
}

/// Evaluates whether `target` is visible from `agent`.
pub fn evaluate<S: SpatialQuery + ?Sized>(
    agent: &Transform,
    target: Entity,
    target_position: Vec3,
    config: &CombatantConfig,
    spatial: &S,
) -> Sighting {
    let hidden = Sighting {
        visible: false,
        position: target_position,
    };
    let vision = &config.vision;
    let origin = agent.translation;

    if origin.distance(target_position) > config.detection_radius {
        return hidden;
    }

    if vision.mode == VisionMode::DistanceOnly {
        return Sighting {
            visible: true,
            position: target_position,
        };
    }

    if vision.mode == VisionMode::Cone && !within_cone(agent, target_position, vision.field_of_view) {
        return hidden;
    }

    let eye = origin + Vec3::Y * vision.eye_height;
    let torso = target_position + Vec3::Y * vision.torso_height;
    let to_torso = torso - eye;
    let max_distance = config.detection_radius.max(to_torso.length());

    // Первое попадание обязано быть самой целью, любое другое тело закрывает обзор
    let first_hit = spatial.raycast_first_hit(eye, to_torso, max_distance, vision.occluder_mask);

    Sighting {
        visible: first_hit == Some(target),
        position: target_position,
    }
}

fn within_cone(agent: &Transform, target_position: Vec3, field_of_view: f32) -> bool {
    let forward = agent.forward();
    let forward = Vec2::new(forward.x, forward.z);
    let offset = target_position - agent.translation;
    let to_target = Vec2::new(offset.x, offset.z);

    if to_target.length_squared() < 1e-8 || forward.length_squared() < 1e-8 {
        return true;
    }

    let angle = forward.perp_dot(to_target).atan2(forward.dot(to_target)).abs().to_degrees();
    angle <= field_of_view * 0.5
}

/// Per-agent sensor schedule + edge state.
#[derive(Component, Debug, Clone, Default)]
pub struct VisionSensor {
    next_check_at: f32,
    was_visible: bool,
}

impl VisionSensor {
    pub fn is_due(&self, now: f32) -> bool {
        now >= self.next_check_at
    }

    pub fn schedule_next(&mut self, now: f32, interval: f32) {
        self.next_check_at = now + interval;
    }

    /// Returns `true` only on the not-visible → visible edge.
    pub fn observe(&mut self, visible: bool) -> bool {
        let regained = visible && !self.was_visible;
        self.was_visible = visible;
        regained
    }
}

/// System: vision sensors + ally calls.
///
/// Target = ближайший живой Player. Scout с `alert` конфигом на фронте
/// "увидел" отправляет AllyCall (rate-limited через AllyAlerter).
pub fn update_vision(
    time: Res<Time<Fixed>>,
    index: Res<SpatialIndex>,
    mut agents: Query<
        (
            Entity,
            &Transform,
            &Archetype,
            &mut VisionSensor,
            &mut PerceptionState,
            Option<&mut AllyAlerter>,
        ),
        Without<Dead>,
    >,
    players: Query<(Entity, &Transform, Option<&Health>), (With<Player>, Without<Dead>)>,
    mut noises: EventWriter<NoiseRequest>,
) {
    let now = time.elapsed_secs();
    let delta = time.delta_secs();

    for (entity, transform, archetype, mut sensor, mut perception, alerter) in agents.iter_mut() {
        if !perception.can_see_target {
            perception.time_since_last_seen += delta;
        }

        if !sensor.is_due(now) {
            continue;
        }
        sensor.schedule_next(now, archetype.vision.check_interval);

        let nearest = players
            .iter()
            .filter(|(_, _, health)| health.map_or(true, |h| h.is_alive()))
            .min_by(|(a_entity, a, _), (b_entity, b, _)| {
                let da = a.translation.distance_squared(transform.translation);
                let db = b.translation.distance_squared(transform.translation);
                da.total_cmp(&db).then_with(|| a_entity.cmp(b_entity))
            });

        let Some((target, target_transform, _)) = nearest else {
            if perception.target.is_some() {
                crate::log(&format!("👁️ Agent {:?} lost its target (no living players)", entity));
            }
            perception.lose_target();
            sensor.observe(false);
            continue;
        };

        let sighting = evaluate(transform, target, target_transform.translation, archetype, &*index);
        let regained = sensor.observe(sighting.visible);
        perception.record_sighting(target, sighting);

        if !regained {
            continue;
        }

        crate::log(&format!(
            "👁️ Agent {:?} spotted {:?} at {:?}",
            entity, target, sighting.position
        ));

        let (Some(tuning), Some(mut alerter)) = (archetype.alert.as_ref(), alerter) else {
            continue;
        };
        if alerter.try_alert(now, tuning.cooldown) {
            noises.write(NoiseRequest {
                source: Some(entity),
                event: NoiseEvent {
                    position: sighting.position,
                    radius: tuning.radius,
                    category: NoiseCategory::AllyCall,
                },
            });
            crate::log_info(&format!(
                "📢 Scout {:?} raised an ally call (radius {:.0})",
                entity, tuning.radius
            ));
        }
    }
}
