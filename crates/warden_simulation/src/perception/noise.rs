//! Noise Bus: synchronous radius broadcast to listener-tagged bodies.
//!
//! Гарантии `emit`:
//! - все слушатели в радиусе на момент вызова уведомлены до возврата
//! - каждый слушатель получает событие ровно один раз за вызов
//! - фильтры и cooldown применяет сам слушатель

use bevy::prelude::*;

use crate::config::HearingTuning;
use crate::spatial::{Layers, SpatialIndex, SpatialQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseCategory {
    /// Footsteps, impacts, anything a hostile might make
    ThreatSound,
    /// Raised by an allied agent that sighted a threat
    AllyCall,
}

/// Transient broadcast, dropped once `emit` returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEvent {
    pub position: Vec3,
    pub radius: f32,
    pub category: NoiseCategory,
}

/// What a listener remembers about a delivered noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeardNoise {
    pub position: Vec3,
    pub category: NoiseCategory,
    pub heard_at: f32,
}

pub trait NoiseListener {
    fn on_noise_heard(&mut self, noise: HeardNoise);
}

/// Event: request a broadcast this tick (resolved by `broadcast_noise`).
#[derive(Event, Debug, Clone, Copy)]
pub struct NoiseRequest {
    /// Emitter never hears its own noise
    pub source: Option<Entity>,
    pub event: NoiseEvent,
}

pub struct NoiseBus<'a, S: SpatialQuery + ?Sized> {
    spatial: &'a S,
}

impl<'a, S: SpatialQuery + ?Sized> NoiseBus<'a, S> {
    pub fn new(spatial: &'a S) -> Self {
        Self { spatial }
    }

    /// Delivers `event` to every listener inside its radius.
    ///
    /// `deliver` is invoked once per listener entity and reports whether the
    /// entity actually carried a listener. Returns the delivered count.
    pub fn emit(
        &self,
        event: &NoiseEvent,
        source: Option<Entity>,
        mut deliver: impl FnMut(Entity, &NoiseEvent) -> bool,
    ) -> usize {
        let mut listeners = self
            .spatial
            .overlap_sphere(event.position, event.radius.max(0.0), Layers::LISTENER);
        listeners.sort();
        listeners.dedup();

        listeners
            .into_iter()
            .filter(|listener| Some(*listener) != source)
            .filter(|listener| deliver(*listener, event))
            .count()
    }
}

/// Listener component: category filters, acceptance cooldown, one pending noise.
#[derive(Component, Debug, Clone, Default)]
pub struct Hearing {
    pub hears_threats: bool,
    pub hears_allies: bool,
    pub cooldown: f32,
    last_accepted_at: Option<f32>,
    pending: Option<HeardNoise>,
}

impl Hearing {
    pub fn from_tuning(tuning: &HearingTuning) -> Self {
        Self {
            hears_threats: tuning.hears_threats,
            hears_allies: tuning.hears_allies,
            cooldown: tuning.cooldown,
            ..Self::default()
        }
    }

    pub fn accepts(&self, category: NoiseCategory) -> bool {
        match category {
            NoiseCategory::ThreatSound => self.hears_threats,
            NoiseCategory::AllyCall => self.hears_allies,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the remembered noise (agent tick).
    pub fn take_pending(&mut self) -> Option<HeardNoise> {
        self.pending.take()
    }
}

impl NoiseListener for Hearing {
    fn on_noise_heard(&mut self, noise: HeardNoise) {
        if !self.accepts(noise.category) {
            return;
        }
        if let Some(last) = self.last_accepted_at {
            if noise.heard_at - last < self.cooldown {
                return;
            }
        }
        self.last_accepted_at = Some(noise.heard_at);
        self.pending = Some(noise);
    }
}

/// System: resolve every `NoiseRequest` of this tick through the bus.
pub fn broadcast_noise(
    time: Res<Time<Fixed>>,
    index: Res<SpatialIndex>,
    mut requests: EventReader<NoiseRequest>,
    mut listeners: Query<&mut Hearing>,
) {
    let now = time.elapsed_secs();
    let bus = NoiseBus::new(&*index);

    for request in requests.read() {
        let delivered = bus.emit(&request.event, request.source, |entity, event| {
            let Ok(mut hearing) = listeners.get_mut(entity) else {
                return false;
            };
            hearing.on_noise_heard(HeardNoise {
                position: event.position,
                category: event.category,
                heard_at: now,
            });
            true
        });

        if delivered > 0 {
            crate::log(&format!(
                "🔊 {:?} at {:?} (r={:.1}) reached {} listener(s)",
                request.event.category, request.event.position, request.event.radius, delivered
            ));
        }
    }
}
