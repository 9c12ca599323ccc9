//! Agent brain: priority state machine (Dead > Stunned > Attack > Chase > Investigate > Patrol/Idle).
//!
//! Brain не знает про ECS: получает `TickContext` + `Navigator` + RNG,
//! возвращает `TickReport` (переходы, cues, поворот, готовый strike).
//! Все задержки (windup, stagger, look-around) - continuations с токеном
//! `CancelScope`, урон и смерть отменяют их через `cancel_all`.

use bevy::prelude::*;
use rand::RngCore;

use super::patrol::{PatrolInput, PatrolMode, PatrolRunner};
use crate::ai::events::CueKind;
use crate::ai::schedule::{poll, CancelScope, Continuation, Poll};
use crate::combat::{AttackContext, StrikePlan, TargetSnapshot};
use crate::config::{CombatantConfig, FloatRange};
use crate::navigation::{planar_distance, yaw_of, Navigator, ARRIVAL_EPSILON};
use crate::perception::PerceptionState;

/// AI FSM состояния
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum AgentState {
    /// Нет маршрута и нет цели - стоим на месте
    #[default]
    Idle,
    Patrol,
    /// Идём к последней известной позиции цели, потом осматриваемся
    Investigate,
    Chase,
    Attack,
    /// Stagger после урона
    Stunned,
    /// Терминальное состояние
    Dead,
}

/// Look-around sweep parameters, captured on arrival.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAround {
    pub started_at: f32,
    pub duration: f32,
    pub base_yaw: f32,
    /// Point being searched; a fresher alert elsewhere restarts the approach
    pub spot: Vec3,
}

impl LookAround {
    /// Yaw oscillating across `angles` (degrees, relative to `base_yaw`).
    pub fn yaw_at(&self, now: f32, angles: FloatRange) -> f32 {
        let phase = ((now - self.started_at) / self.duration.max(f32::EPSILON)) * std::f32::consts::TAU;
        let blend = 0.5 + 0.5 * phase.sin();
        let offset = angles.min + (angles.max - angles.min) * blend;
        self.base_yaw + offset.to_radians()
    }
}

/// Где агент должен смотреть после тика.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Facing {
    Point(Vec3),
    Yaw(f32),
}

/// Read-only inputs for one brain tick.
pub struct TickContext<'a> {
    pub now: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub config: &'a CombatantConfig,
    pub target: Option<TargetSnapshot>,
    pub waypoints: &'a [Vec3],
    pub patrol_mode: PatrolMode,
    pub hit_window_open: bool,
}

/// Everything a tick wants the outside world to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub transitions: Vec<(AgentState, AgentState)>,
    pub cues: Vec<CueKind>,
    pub facing: Option<Facing>,
    pub strike: Option<StrikePlan>,
    pub reached_waypoint: Option<usize>,
}

/// Component: per-agent decision state.
#[derive(Component, Debug, Clone, Default)]
pub struct AgentBrain {
    state: AgentState,
    /// Последнее состояние, о котором уже отчитались
    reported: AgentState,
    scope: CancelScope,
    pending_strike: Option<Continuation<Entity>>,
    stagger: Option<Continuation<()>>,
    look_around: Option<Continuation<LookAround>>,
    last_attack_at: Option<f32>,
    chase_speed: Option<f32>,
    patrol: PatrolRunner,
}

impl AgentBrain {
    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }

    pub fn has_pending_strike(&self) -> bool {
        self.pending_strike.is_some()
    }

    pub fn last_attack_at(&self) -> Option<f32> {
        self.last_attack_at
    }

    pub fn patrol(&self) -> &PatrolRunner {
        &self.patrol
    }

    /// Damage while alive: cancel everything in flight, stagger.
    pub fn on_damaged(&mut self, now: f32, stagger_duration: f32) {
        if self.is_dead() {
            return;
        }
        self.scope.cancel_all();
        self.pending_strike = None;
        self.look_around = None;
        self.chase_speed = None;
        self.state = AgentState::Stunned;
        self.stagger = Some(self.scope.schedule(now + stagger_duration.max(0.0), ()));
    }

    /// Death is terminal; nothing scheduled survives it.
    ///
    /// Returns the `(from, Dead)` transition for the caller to publish: a dead
    /// agent is never ticked again, so the tick cannot report it. `None` if
    /// already dead.
    #[must_use]
    pub fn on_death(&mut self) -> Option<(AgentState, AgentState)> {
        if self.is_dead() {
            return None;
        }
        self.scope.cancel_all();
        self.pending_strike = None;
        self.stagger = None;
        self.look_around = None;
        self.chase_speed = None;
        self.state = AgentState::Dead;

        // from = последнее опубликованное состояние, цепочка from/to не рвётся
        let from = std::mem::replace(&mut self.reported, AgentState::Dead);
        Some((from, AgentState::Dead))
    }

    pub fn tick(
        &mut self,
        ctx: &TickContext,
        perception: &mut PerceptionState,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
    ) -> TickReport {
        let mut report = TickReport::default();
        self.flush_transition(&mut report);

        if self.is_dead() {
            return report;
        }

        // 1. Stagger держит агента, пока continuation не созреет
        match poll(&mut self.stagger, &self.scope, ctx.now) {
            Poll::Pending if self.stagger.is_some() => {
                nav.halt();
                return report;
            }
            Poll::Ready(()) => nav.resume(),
            _ => {}
        }

        // 2. Windup закончился → strategy решает, состоится ли удар
        if let Poll::Ready(target) = poll(&mut self.pending_strike, &self.scope, ctx.now) {
            report.strike = self.resolve_strike(ctx, target);
        }

        // 3. Приоритетный выбор состояния
        let next = self.decide(ctx, perception, nav, rng, &mut report);

        if next != AgentState::Chase {
            self.chase_speed = None;
        }
        if next != AgentState::Investigate {
            self.look_around = None;
        }
        if !matches!(next, AgentState::Attack | AgentState::Chase) && self.pending_strike.take().is_some() {
            crate::log("🚫 Windup cancelled: target no longer engaged");
        }

        self.state = next;
        self.flush_transition(&mut report);
        report
    }

    fn flush_transition(&mut self, report: &mut TickReport) {
        if self.state != self.reported {
            report.transitions.push((self.reported, self.state));
            self.reported = self.state;
        }
    }

    fn resolve_strike(&self, ctx: &TickContext, target: Entity) -> Option<StrikePlan> {
        let Some(snapshot) = ctx.target.filter(|snapshot| snapshot.entity == target) else {
            crate::log(&format!("🚫 Strike cancelled: target {:?} gone", target));
            return None;
        };

        let attack = AttackContext {
            position: ctx.position,
            rotation: ctx.rotation,
            target: snapshot,
            config: ctx.config,
        };
        let plan = ctx.config.attack_style.strategy().perform_attack(&attack);
        if plan.is_none() {
            crate::log(&format!("🚫 Strike at {:?} cancelled (dead or out of reach)", target));
        }
        plan
    }

    fn decide(
        &mut self,
        ctx: &TickContext,
        perception: &mut PerceptionState,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
        report: &mut TickReport,
    ) -> AgentState {
        let config = ctx.config;

        let visible = ctx
            .target
            .filter(|target| target.alive && perception.can_see_target);
        if let Some(target) = visible {
            perception.refresh_sighting(target.position, ctx.now, config.suspicion_duration);

            if ctx.position.distance(target.position) <= config.attack_range {
                return self.attack(ctx, target, nav, report);
            }
            return self.chase(ctx, target, nav, rng);
        }

        if perception.is_suspicious(ctx.now) {
            if let Some(last_known) = perception.last_known_target_position {
                if self.investigate(ctx, last_known, perception, nav, rng, report) {
                    return AgentState::Investigate;
                }
            }
        }

        if config.patrol.enabled && !ctx.waypoints.is_empty() {
            if self.state != AgentState::Patrol {
                self.patrol.interrupt();
            }
            let input = PatrolInput {
                now: ctx.now,
                position: ctx.position,
                waypoints: ctx.waypoints,
                mode: ctx.patrol_mode,
                tuning: &config.patrol,
                speed: config.movement.patrol_speed,
                stopping_distance: config.clamped_stopping_distance(),
            };
            report.reached_waypoint = self.patrol.tick(&input, nav, rng);
            return AgentState::Patrol;
        }

        nav.halt();
        AgentState::Idle
    }

    fn attack(
        &mut self,
        ctx: &TickContext,
        target: TargetSnapshot,
        nav: &mut dyn Navigator,
        report: &mut TickReport,
    ) -> AgentState {
        nav.halt();
        report.facing = Some(Facing::Point(target.position));

        let cooldown_ready = self
            .last_attack_at
            .map_or(true, |at| ctx.now - at >= ctx.config.attack_cooldown);
        let busy = self.pending_strike.is_some() || ctx.hit_window_open || report.strike.is_some();

        if cooldown_ready && !busy {
            let windup = ctx.config.attack_style.strategy().windup(ctx.config);
            self.pending_strike = Some(self.scope.schedule(ctx.now + windup, target.entity));
            self.last_attack_at = Some(ctx.now);
            report.cues.push(CueKind::AttackStart);
        }
        AgentState::Attack
    }

    fn chase(
        &mut self,
        ctx: &TickContext,
        target: TargetSnapshot,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
    ) -> AgentState {
        let movement = &ctx.config.movement;
        let speed = match self.chase_speed {
            Some(speed) if self.state == AgentState::Chase => speed,
            _ => {
                let jitter = FloatRange::new(-movement.speed_jitter, movement.speed_jitter).sample(rng);
                let speed = (movement.chase_speed + jitter).max(0.1);
                self.chase_speed = Some(speed);
                speed
            }
        };

        nav.set_speed(speed);
        nav.resume();
        nav.set_destination(target.position);
        AgentState::Chase
    }

    /// `false` once the look-around finished and suspicion was expired.
    fn investigate(
        &mut self,
        ctx: &TickContext,
        last_known: Vec3,
        perception: &mut PerceptionState,
        nav: &mut dyn Navigator,
        rng: &mut dyn RngCore,
        report: &mut TickReport,
    ) -> bool {
        let tuning = &ctx.config.investigate;

        if let Some(sweep) = self.look_around.as_ref().map(|continuation| continuation.payload) {
            if sweep.spot.distance(last_known) > ARRIVAL_EPSILON {
                // Свежий alert в другом месте - идём туда
                self.look_around = None;
            } else {
                nav.halt();
                match poll(&mut self.look_around, &self.scope, ctx.now) {
                    Poll::Ready(_) => {
                        perception.expire_suspicion();
                        crate::log("🔎 Look-around done, nothing found");
                        return false;
                    }
                    Poll::Pending => {
                        report.facing = Some(Facing::Yaw(sweep.yaw_at(ctx.now, tuning.look_around_angle)));
                        return true;
                    }
                    Poll::Cancelled => {}
                }
            }
        }

        let stopping_distance = ctx.config.clamped_stopping_distance();
        nav.set_speed(ctx.config.movement.patrol_speed + tuning.speed_bonus);
        nav.resume();
        let reachable = nav.set_destination(last_known);
        let arrived = planar_distance(ctx.position, last_known) <= stopping_distance + ARRIVAL_EPSILON;

        if reachable && !arrived {
            return true;
        }

        nav.halt();
        let duration = tuning.look_around_time.sample(rng).max(0.05);
        let sweep = LookAround {
            started_at: ctx.now,
            duration,
            base_yaw: yaw_of(ctx.rotation),
            spot: last_known,
        };
        self.look_around = Some(self.scope.schedule(ctx.now + duration, sweep));
        report.cues.push(CueKind::Searching);
        if !reachable {
            crate::log_warning(&format!("⚠️ Investigate: {:?} unreachable, searching in place", last_known));
        }
        true
    }
}
