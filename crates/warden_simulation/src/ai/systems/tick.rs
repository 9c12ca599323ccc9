//! Agent tick: perception + brain → navigator, strikes, cues.

use bevy::prelude::*;

use crate::ai::{AgentBrain, AgentCue, AgentRng, AgentStateChanged, CueKind, Facing, PatrolMode, PatrolRoute, TickContext};
use crate::combat::{Dead, HitWindow, Projectile, StrikePlan, TargetSnapshot};
use crate::components::Health;
use crate::config::Archetype;
use crate::navigation::{yaw_towards, KinematicNavigator};
use crate::perception::{Hearing, PerceptionState};

/// Система: один тик state machine для каждого живого агента
///
/// Порядок внутри агента:
/// 1. навигатор синхронизируется с Transform
/// 2. услышанный шум (threat / ally call) → suspicion + last known position
/// 3. brain.tick → переходы, cues, strike
/// 4. strike: melee открывает HitWindow, ranged спавнит Projectile
pub fn tick_agents(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut agents: Query<
        (
            Entity,
            &mut Transform,
            &Archetype,
            &mut AgentBrain,
            &mut PerceptionState,
            &mut KinematicNavigator,
            &mut AgentRng,
            &mut HitWindow,
            Option<&mut Hearing>,
            Option<&PatrolRoute>,
        ),
        Without<Dead>,
    >,
    targets: Query<(&Transform, Option<&Health>, Has<Dead>), Without<AgentBrain>>,
    mut cues: EventWriter<AgentCue>,
    mut transitions: EventWriter<AgentStateChanged>,
) {
    let now = time.elapsed_secs();

    for (entity, mut transform, archetype, mut brain, mut perception, mut navigator, mut rng, mut window, hearing, route) in
        agents.iter_mut()
    {
        navigator.sync_position(transform.translation);

        if let Some(heard) = hearing.and_then(|mut hearing| hearing.take_pending()) {
            perception.alert(heard.position, now, archetype.suspicion_duration);
            crate::log(&format!(
                "👂 Agent {:?} heard {:?} at {:?}",
                entity, heard.category, heard.position
            ));
        }

        let target = perception.target.and_then(|target| {
            let (target_transform, health, dead) = targets.get(target).ok()?;
            Some(TargetSnapshot {
                entity: target,
                position: target_transform.translation,
                alive: !dead && health.map_or(true, |health| health.is_alive()),
            })
        });

        let (waypoints, patrol_mode) = route.map_or((&[][..], PatrolMode::Loop), |route| {
            (route.waypoints.as_slice(), route.mode)
        });

        let ctx = TickContext {
            now,
            position: transform.translation,
            rotation: transform.rotation,
            config: archetype,
            target,
            waypoints,
            patrol_mode,
            hit_window_open: window.is_active(),
        };
        let report = brain.tick(&ctx, &mut perception, &mut *navigator, rng.source());

        match report.facing {
            Some(Facing::Point(point)) => {
                if let Some(yaw) = yaw_towards(point - transform.translation) {
                    transform.rotation = Quat::from_rotation_y(yaw);
                }
            }
            Some(Facing::Yaw(yaw)) => transform.rotation = Quat::from_rotation_y(yaw),
            None => {}
        }

        match report.strike {
            Some(StrikePlan::Melee(strike)) => {
                window.open(strike, now);
                cues.write(AgentCue {
                    agent: entity,
                    cue: CueKind::HitWindowOpen,
                });
                crate::log(&format!("⚔️ Agent {:?} swings (r={:.1})", entity, strike.radius));
            }
            Some(StrikePlan::Ranged(bolt)) => {
                commands.spawn((
                    Transform::from_translation(bolt.origin),
                    Projectile::launch(entity, &bolt, now),
                ));
                crate::log(&format!("✨ Agent {:?} casts a bolt toward {:?}", entity, bolt.direction));
            }
            None => {}
        }

        for cue in report.cues {
            cues.write(AgentCue { agent: entity, cue });
        }

        if let Some(index) = report.reached_waypoint {
            crate::log(&format!("🚶 Agent {:?} reached waypoint {}", entity, index));
        }

        for (from, to) in report.transitions {
            transitions.write(AgentStateChanged { agent: entity, from, to });
            crate::log_info(&format!("🧠 Agent {:?} ({}): {:?} → {:?}", entity, archetype.name, from, to));
        }
    }
}
