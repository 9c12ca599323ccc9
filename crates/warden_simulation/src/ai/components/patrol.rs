//! Patrol route + runner (waypoint cycling, dwell, wander, retry on nav failure).

use bevy::prelude::*;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::PatrolTuning;
use crate::navigation::{planar_distance, random_point_in_disc, Navigator, ARRIVAL_EPSILON};

/// Порядок обхода waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum PatrolMode {
    /// 0, 1, 2, 0, 1, 2 ...
    #[default]
    Loop,
    /// 0, 1, 2, 1, 0, 1 ...
    PingPong,
    /// Случайный, без повтора текущей точки
    Random,
    /// Без маршрута: случайная точка в `area_radius` вокруг центра (waypoints[0])
    Wander,
}

/// Component: waypoints агента (agents без маршрута стоят в Idle)
#[derive(Component, Debug, Clone, Default)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    pub mode: PatrolMode,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec3>, mode: PatrolMode) -> Self {
        Self { waypoints, mode }
    }

    /// Wander around `center` (usually the spawn position).
    pub fn wander(center: Vec3) -> Self {
        Self::new(vec![center], PatrolMode::Wander)
    }
}

/// Входные данные одного тика патруля.
pub struct PatrolInput<'a> {
    pub now: f32,
    pub position: Vec3,
    pub waypoints: &'a [Vec3],
    pub mode: PatrolMode,
    pub tuning: &'a PatrolTuning,
    pub speed: f32,
    pub stopping_distance: f32,
}

/// Patrol progress. Lives inside `AgentBrain`, survives Chase/Investigate detours.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolRunner {
    index: usize,
    direction: i32,
    goal: Option<Vec3>,
    waiting_until: Option<f32>,
    retry_at: Option<f32>,
}

impl Default for PatrolRunner {
    fn default() -> Self {
        Self {
            index: 0,
            direction: 1,
            goal: None,
            waiting_until: None,
            retry_at: None,
        }
    }
}

impl PatrolRunner {
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn goal(&self) -> Option<Vec3> {
        self.goal
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting_until.is_some()
    }

    /// Re-entering patrol: forget goal and dwell, keep the waypoint index.
    pub fn interrupt(&mut self) {
        self.goal = None;
        self.waiting_until = None;
        self.retry_at = None;
    }

    /// Advances the patrol. Returns the waypoint index reached this tick.
    pub fn tick(&mut self, input: &PatrolInput, nav: &mut dyn Navigator, rng: &mut dyn RngCore) -> Option<usize> {
        let len = input.waypoints.len();
        if len == 0 {
            nav.halt();
            return None;
        }
        if self.index >= len || (input.mode == PatrolMode::Wander && self.index != 0) {
            self.index = 0;
            self.goal = None;
        }

        if let Some(until) = self.waiting_until {
            if input.now < until {
                nav.halt();
                return None;
            }
            self.waiting_until = None;
        }

        if let Some(retry_at) = self.retry_at {
            if input.now < retry_at {
                nav.halt();
                return None;
            }
            self.retry_at = None;
        }

        let goal = match self.goal {
            Some(goal) => goal,
            None => {
                nav.set_speed(input.speed);
                nav.resume();
                let Some(goal) = self.plan_goal(input, nav, rng) else {
                    nav.halt();
                    self.retry_at = Some(input.now + input.tuning.retry_interval);
                    crate::log_warning(&format!(
                        "⚠️ Patrol: waypoint {} unreachable, retry in {:.2}s",
                        self.index, input.tuning.retry_interval
                    ));
                    return None;
                };
                self.goal = Some(goal);
                goal
            }
        };

        let tolerance = input
            .tuning
            .tolerance
            .max(input.stopping_distance + ARRIVAL_EPSILON);
        if planar_distance(input.position, goal) > tolerance {
            return None;
        }

        // Прибыли: dwell, затем следующая точка
        let reached = self.index;
        nav.halt();
        self.goal = None;
        self.waiting_until = Some(input.now + input.tuning.base_wait + input.tuning.dwell_time.sample(rng));
        self.advance(len, input.mode, input.tuning, rng);
        Some(reached)
    }

    /// Wander around the anchor; fallback to a tighter sample before giving up.
    fn plan_goal(&self, input: &PatrolInput, nav: &mut dyn Navigator, rng: &mut dyn RngCore) -> Option<Vec3> {
        let tuning = input.tuning;
        let anchor = input.waypoints[self.index];

        // Wander: весь круг вокруг центра, fallback не уже 2м
        let (radius, fallback_radius) = match input.mode {
            PatrolMode::Wander => {
                let radius = tuning.area_radius.max(0.0);
                (radius, (radius * 0.5).max(2.0))
            }
            _ => {
                let radius = tuning.wander_radius.max(0.0);
                (radius, (radius * 0.5).max(0.5))
            }
        };

        let candidate = random_point_in_disc(anchor, radius, rng);
        let goal = nav
            .try_sample_navigable_point(candidate, tuning.sample_distance, tuning.sample_attempts, rng)
            .unwrap_or(anchor);
        if nav.set_destination(goal) {
            return Some(goal);
        }

        let fallback = nav.try_sample_navigable_point(anchor, fallback_radius, tuning.sample_attempts, rng)?;
        nav.set_destination(fallback).then_some(fallback)
    }

    fn advance(&mut self, len: usize, mode: PatrolMode, tuning: &PatrolTuning, rng: &mut dyn RngCore) {
        if len <= 1 || mode == PatrolMode::Wander {
            self.index = 0;
            return;
        }

        if rng.gen::<f32>() < tuning.chance_reverse {
            self.direction = -self.direction;
        }

        match mode {
            PatrolMode::Loop => {
                let step = if rng.gen::<f32>() < tuning.chance_skip_point { 2 } else { 1 };
                let next = self.index as i64 + (self.direction * step) as i64;
                self.index = next.rem_euclid(len as i64) as usize;
            }
            PatrolMode::PingPong => {
                let step = if rng.gen::<f32>() < tuning.chance_skip_point { 2 } else { 1 };
                let next = self.index as i64 + (self.direction * step) as i64;
                self.index = if next >= len as i64 {
                    self.direction = -1;
                    len - 2
                } else if next < 0 {
                    self.direction = 1;
                    1.min(len - 1)
                } else {
                    next as usize
                };
            }
            PatrolMode::Wander => {}
            PatrolMode::Random => {
                let pick = rng.gen_range(0..len - 1);
                self.index = if pick >= self.index { pick + 1 } else { pick };
            }
        }
    }
}
