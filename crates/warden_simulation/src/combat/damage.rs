//! Damage model: types, multipliers, the Damageable contract and its system.
//!
//! Урон считается на стороне ПОЛУЧАТЕЛЯ: атакующий шлёт базовое значение,
//! получатель применяет свою таблицу множителей (или instant-kill правило).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::HitWindow;
use crate::ai::{AgentBrain, AgentCue, AgentStateChanged, CueKind};
use crate::components::Health;
use crate::config::Archetype;
use crate::navigation::{KinematicNavigator, Navigator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, Reflect)]
pub enum DamageType {
    #[default]
    Physical,
    Magic,
    Fire,
    Artifact,
}

/// Damage type → multiplier. Missing entries mean 1.0, 0 = immune.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageMultipliers(BTreeMap<DamageType, f32>);

impl DamageMultipliers {
    pub fn get(&self, damage_type: DamageType) -> f32 {
        self.0
            .get(&damage_type)
            .copied()
            .map_or(1.0, |multiplier| multiplier.max(0.0))
    }

    pub fn set(&mut self, damage_type: DamageType, multiplier: f32) {
        self.0.insert(damage_type, multiplier);
    }
}

/// Receiving-side damage rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageProfile {
    pub multipliers: DamageMultipliers,
    /// This damage type kills outright, ignoring health and multipliers
    pub instant_kill: Option<DamageType>,
}

impl DamageProfile {
    pub fn final_damage(&self, amount: f32, damage_type: DamageType) -> f32 {
        (amount * self.multipliers.get(damage_type)).max(0.0)
    }
}

/// Damage rules for non-agent damageables (player armour, props).
#[derive(Component, Debug, Clone, Default)]
pub struct Resistances(pub DamageProfile);

/// Маркер: сущность мертва (AI отключен, тело выпадает из spatial index)
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageHit {
    pub amount: f32,
    pub damage_type: DamageType,
    pub hit_point: Vec3,
    pub source: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target already dead, nothing changed
    Ignored,
    Damaged { dealt: f32 },
    Killed { dealt: f32 },
}

/// Contract exposed by anything that can be hurt.
pub trait Damageable {
    fn is_alive(&self) -> bool;
    fn apply_damage(&mut self, hit: &DamageHit) -> DamageOutcome;
}

/// Health + optional profile viewed as a Damageable.
pub struct DamageReceiver<'a> {
    pub health: &'a mut Health,
    pub profile: Option<&'a DamageProfile>,
}

impl Damageable for DamageReceiver<'_> {
    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    fn apply_damage(&mut self, hit: &DamageHit) -> DamageOutcome {
        if !self.health.is_alive() {
            return DamageOutcome::Ignored;
        }

        if let Some(profile) = self.profile {
            if profile.instant_kill == Some(hit.damage_type) {
                let dealt = self.health.kill();
                return DamageOutcome::Killed { dealt };
            }
        }

        let amount = match self.profile {
            Some(profile) => profile.final_damage(hit.amount, hit.damage_type),
            None => hit.amount.max(0.0),
        };
        let dealt = self.health.take_damage(amount);

        if self.health.is_alive() {
            DamageOutcome::Damaged { dealt }
        } else {
            DamageOutcome::Killed { dealt }
        }
    }
}

/// Event: apply `hit` to `target` (melee sweep, projectile contact).
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageRequest {
    pub target: Entity,
    pub hit: DamageHit,
}

/// Event: урон нанесён (для UI/звука/статистики)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
    pub damage_type: DamageType,
    pub target_died: bool,
}

/// Event: entity умерла
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// System: resolve `DamageRequest` events through the Damageable contract.
///
/// Живой получатель → Stunned (stagger), halt навигации, отмена windup.
/// Смерть → Dead marker, brain в Dead (переход публикуется здесь), hit window закрыт,
/// cue `Died` ровно один раз и только для агентов.
pub fn apply_damage(
    time: Res<Time<Fixed>>,
    mut requests: EventReader<DamageRequest>,
    mut targets: Query<(
        &mut Health,
        Option<&Archetype>,
        Option<&Resistances>,
        Option<&mut AgentBrain>,
        Option<&mut KinematicNavigator>,
        Option<&mut HitWindow>,
    )>,
    mut commands: Commands,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    mut cues: EventWriter<AgentCue>,
    mut transitions: EventWriter<AgentStateChanged>,
) {
    let now = time.elapsed_secs();

    for request in requests.read() {
        let Ok((mut health, archetype, resistances, brain, navigator, window)) =
            targets.get_mut(request.target)
        else {
            continue;
        };

        let profile = archetype
            .map(|archetype| &archetype.damage)
            .or(resistances.map(|resistances| &resistances.0));

        let outcome = DamageReceiver {
            health: &mut *health,
            profile,
        }
        .apply_damage(&request.hit);

        let (dealt, died) = match outcome {
            DamageOutcome::Ignored => continue,
            DamageOutcome::Damaged { dealt } => (dealt, false),
            DamageOutcome::Killed { dealt } => (dealt, true),
        };

        dealt_events.write(DamageDealt {
            attacker: request.hit.source,
            target: request.target,
            damage: dealt,
            damage_type: request.hit.damage_type,
            target_died: died,
        });

        if let Some(mut navigator) = navigator {
            navigator.halt();
        }

        if !died {
            if let Some(mut brain) = brain {
                let stagger = archetype.map_or(0.0, |archetype| archetype.stagger_duration);
                brain.on_damaged(now, stagger);
            }
            crate::log(&format!(
                "💥 {:?} hit {:?} for {:.1} {:?} (HP {:.1}/{:.1})",
                request.hit.source, request.target, dealt, request.hit.damage_type, health.current, health.max
            ));
            continue;
        }

        let is_agent = brain.is_some();
        if let Some(mut brain) = brain {
            if let Some((from, to)) = brain.on_death() {
                transitions.write(AgentStateChanged {
                    agent: request.target,
                    from,
                    to,
                });
            }
        }
        if let Some(mut window) = window {
            window.close();
        }
        commands.entity(request.target).insert(Dead);
        died_events.write(EntityDied {
            entity: request.target,
            killer: Some(request.hit.source),
        });
        // Cue только для агентов; смерть игрока покрывает EntityDied
        if is_agent {
            cues.write(AgentCue {
                agent: request.target,
                cue: CueKind::Died,
            });
        }
        crate::log_info(&format!(
            "💀 {:?} killed by {:?} ({:?})",
            request.target, request.hit.source, request.hit.damage_type
        ));
    }
}
