//! Perception module (sight + hearing + ally alerts)
//!
//! Architecture:
//! - Vision Sensor: periodic distance / cone / line-of-sight check → `PerceptionState`
//! - Noise Bus: synchronous broadcast to listeners inside radius → `Hearing`
//! - Alert Channel: scouts raise an ally call on the not-visible → visible edge
//!
//! Perception заполняется ДО тика агента; state machine читает уже готовые данные.

use bevy::prelude::*;

pub mod alert;
pub mod footsteps;
pub mod noise;
pub mod vision;

pub use alert::AllyAlerter;
pub use footsteps::{emit_footsteps, sound_distractions, Distractible, FootstepNoise, Gait, PropImpact};
pub use noise::{
    broadcast_noise, HeardNoise, Hearing, NoiseBus, NoiseCategory, NoiseEvent, NoiseListener, NoiseRequest,
};
pub use vision::{update_vision, Sighting, VisionMode, VisionSensor};

/// Per-agent memory of the tracked target.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PerceptionState {
    pub target: Option<Entity>,
    pub can_see_target: bool,
    pub last_known_target_position: Option<Vec3>,
    pub time_since_last_seen: f32,
    /// Absolute simulated time; suspicious while `now < suspicion_expiry`
    pub suspicion_expiry: f32,
}

impl PerceptionState {
    pub fn is_suspicious(&self, now: f32) -> bool {
        now < self.suspicion_expiry
    }

    /// Direct sighting: remember position and extend suspicion.
    pub fn refresh_sighting(&mut self, position: Vec3, now: f32, suspicion_duration: f32) {
        self.last_known_target_position = Some(position);
        self.time_since_last_seen = 0.0;
        self.suspicion_expiry = self.suspicion_expiry.max(now + suspicion_duration);
    }

    /// Ally call / heard noise: same memory update as a sighting, without visibility.
    pub fn alert(&mut self, position: Vec3, now: f32, suspicion_duration: f32) {
        self.last_known_target_position = Some(position);
        self.suspicion_expiry = self.suspicion_expiry.max(now + suspicion_duration);
    }

    pub fn expire_suspicion(&mut self) {
        self.suspicion_expiry = 0.0;
    }

    /// Vision evaluation result for `target`.
    pub fn record_sighting(&mut self, target: Entity, sighting: Sighting) {
        self.target = Some(target);
        self.can_see_target = sighting.visible;
        if sighting.visible {
            self.last_known_target_position = Some(sighting.position);
            self.time_since_last_seen = 0.0;
        }
    }

    pub fn lose_target(&mut self) {
        self.target = None;
        self.can_see_target = false;
    }
}

/// Perception Plugin
///
/// Порядок выполнения (Sense set):
/// 1. rebuild_spatial_index - снимок тел на этот тик
/// 2. emit_footsteps / sound_distractions - шумы игрока и предметов
/// 3. update_vision - sight checks, ally calls на фронте "увидел"
/// 4. broadcast_noise - синхронная доставка всех шумов тика
pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<crate::spatial::SpatialIndex>()
            .add_event::<NoiseRequest>()
            .add_event::<PropImpact>();

        app.add_systems(
            FixedUpdate,
            (
                crate::spatial::rebuild_spatial_index,
                emit_footsteps,
                sound_distractions,
                update_vision,
                broadcast_noise,
            )
                .chain()
                .in_set(crate::SimulationSet::Sense),
        );
    }
}
