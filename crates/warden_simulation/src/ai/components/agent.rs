//! Agent spawn bundle + per-agent deterministic RNG.

use bevy::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::brain::AgentBrain;
use crate::combat::HitWindow;
use crate::components::Health;
use crate::config::Archetype;
use crate::navigation::KinematicNavigator;
use crate::perception::{AllyAlerter, Hearing, PerceptionState, VisionSensor};
use crate::spatial::{Body, Layers};

/// Component: собственный RNG агента (patrol/jitter/look-around draws)
#[derive(Component, Debug, Clone)]
pub struct AgentRng(ChaCha8Rng);

impl AgentRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn source(&mut self) -> &mut dyn RngCore {
        &mut self.0
    }
}

/// Bundle: всё, что нужно hostile агенту для тика.
#[derive(Bundle)]
pub struct AgentBundle {
    pub transform: Transform,
    pub archetype: Archetype,
    pub brain: AgentBrain,
    pub perception: PerceptionState,
    pub vision: VisionSensor,
    pub hearing: Hearing,
    pub navigator: KinematicNavigator,
    pub hit_window: HitWindow,
    pub health: Health,
    pub body: Body,
    pub rng: AgentRng,
}

impl AgentBundle {
    pub fn new(archetype: Archetype, position: Vec3, seed: u64) -> Self {
        Self {
            transform: Transform::from_translation(position),
            brain: AgentBrain::default(),
            perception: PerceptionState::default(),
            vision: VisionSensor::default(),
            hearing: Hearing::from_tuning(&archetype.hearing),
            navigator: KinematicNavigator::from_config(position, &archetype),
            hit_window: HitWindow::default(),
            health: Health::new(archetype.max_health),
            body: Body::actor(Layers::ENEMY | Layers::LISTENER),
            rng: AgentRng::from_seed(seed),
            archetype,
        }
    }

    pub fn facing(mut self, yaw: f32) -> Self {
        self.transform.rotation = Quat::from_rotation_y(yaw);
        self
    }
}

/// Scouts (archetypes with an `alert` block) also carry an alerter.
pub fn spawn_agent(commands: &mut Commands, bundle: AgentBundle) -> Entity {
    let raises_alerts = bundle.archetype.alert.is_some();
    let mut entity = commands.spawn(bundle);
    if raises_alerts {
        entity.insert(AllyAlerter::default());
    }
    entity.id()
}
