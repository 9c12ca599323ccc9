//! Melee hit window: timed sphere sweep, each target damaged at most once.

use bevy::prelude::*;
use std::collections::HashSet;

use super::{DamageHit, DamageRequest, DamageType, Dead};
use crate::ai::{AgentCue, CueKind};
use crate::components::Health;
use crate::spatial::{Layers, SpatialIndex, SpatialQuery};

/// Resolved melee strike (output of a melee attack strategy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeStrike {
    pub origin: Vec3,
    pub radius: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    /// Seconds the window stays open
    pub duration: f32,
    pub hit_mask: Layers,
}

/// One window per agent; reopening clears `already_hit`.
#[derive(Component, Debug, Clone, Default)]
pub struct HitWindow {
    active: bool,
    already_hit: HashSet<Entity>,
    strike: Option<MeleeStrike>,
    closes_at: f32,
}

impl HitWindow {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn strike(&self) -> Option<&MeleeStrike> {
        self.strike.as_ref()
    }

    pub fn was_hit(&self, entity: Entity) -> bool {
        self.already_hit.contains(&entity)
    }

    pub fn open(&mut self, strike: MeleeStrike, now: f32) {
        self.active = true;
        self.already_hit.clear();
        self.closes_at = now + strike.duration;
        self.strike = Some(strike);
    }

    /// Returns `true` if the window was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    pub fn is_expired(&self, now: f32) -> bool {
        self.active && now >= self.closes_at
    }

    /// New victims for this tick (alive, not yet hit, not the owner).
    pub fn sweep<S: SpatialQuery + ?Sized>(
        &mut self,
        spatial: &S,
        owner: Entity,
        mut is_alive: impl FnMut(Entity) -> bool,
    ) -> Vec<Entity> {
        let Some(strike) = self.strike.filter(|_| self.active) else {
            return Vec::new();
        };

        let mut victims = Vec::new();
        for entity in spatial.overlap_sphere(strike.origin, strike.radius.max(0.1), strike.hit_mask) {
            if entity == owner || self.already_hit.contains(&entity) || !is_alive(entity) {
                continue;
            }
            self.already_hit.insert(entity);
            victims.push(entity);
        }
        victims
    }
}

/// System: sweep open windows, close expired ones.
pub fn sweep_hit_windows(
    time: Res<Time<Fixed>>,
    index: Res<SpatialIndex>,
    mut windows: Query<(Entity, &mut HitWindow), Without<Dead>>,
    vitals: Query<&Health>,
    mut damage: EventWriter<DamageRequest>,
    mut cues: EventWriter<AgentCue>,
) {
    let now = time.elapsed_secs();

    for (owner, mut window) in windows.iter_mut() {
        if !window.is_active() {
            continue;
        }

        if window.is_expired(now) {
            window.close();
            cues.write(AgentCue {
                agent: owner,
                cue: CueKind::HitWindowClose,
            });
            continue;
        }

        let victims = window.sweep(&*index, owner, |entity| {
            vitals.get(entity).is_ok_and(|health| health.is_alive())
        });
        let Some(strike) = window.strike().copied() else {
            continue;
        };

        for victim in victims {
            damage.write(DamageRequest {
                target: victim,
                hit: DamageHit {
                    amount: strike.damage,
                    damage_type: strike.damage_type,
                    hit_point: strike.origin,
                    source: owner,
                },
            });
            crate::log(&format!("🗡️ {:?} melee window caught {:?}", owner, victim));
        }
    }
}
