//! Tests for the agent brain state machine.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::super::brain::{AgentBrain, AgentState, Facing, TickContext};
    use super::super::patrol::PatrolMode;
    use crate::ai::events::CueKind;
    use crate::combat::{StrikePlan, TargetSnapshot};
    use crate::config::CombatantConfig;
    use crate::navigation::mock::MockNavigator;
    use crate::perception::PerceptionState;

    const TARGET: Entity = Entity::PLACEHOLDER;

    struct Harness {
        brain: AgentBrain,
        perception: PerceptionState,
        nav: MockNavigator,
        rng: ChaCha8Rng,
        config: CombatantConfig,
        waypoints: Vec<Vec3>,
        position: Vec3,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                brain: AgentBrain::default(),
                perception: PerceptionState::default(),
                nav: MockNavigator::default(),
                rng: ChaCha8Rng::seed_from_u64(42),
                config: CombatantConfig::default(),
                waypoints: Vec::new(),
                position: Vec3::ZERO,
            }
        }

        /// Цель видна на `target` (или не видна при `None`).
        fn see(&mut self, target: Option<Vec3>) {
            self.perception.can_see_target = target.is_some();
            if target.is_some() {
                self.perception.target = Some(TARGET);
            }
        }

        fn tick(&mut self, now: f32, target: Option<Vec3>) -> super::super::brain::TickReport {
            let ctx = TickContext {
                now,
                position: self.position,
                rotation: Quat::IDENTITY,
                config: &self.config,
                target: target.map(|position| TargetSnapshot {
                    entity: TARGET,
                    position,
                    alive: true,
                }),
                waypoints: &self.waypoints,
                patrol_mode: PatrolMode::Loop,
                hit_window_open: false,
            };
            self.brain
                .tick(&ctx, &mut self.perception, &mut self.nav, &mut self.rng)
        }
    }

    #[test]
    fn test_visible_target_at_five_chases() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -5.0);
        h.see(Some(target));

        let report = h.tick(0.0, Some(target));

        assert_eq!(h.brain.state(), AgentState::Chase);
        assert_eq!(report.transitions, vec![(AgentState::Idle, AgentState::Chase)]);
        assert_eq!(h.nav.destination, Some(target));
        assert!(!h.nav.halted);
        assert!((3.2..=3.8).contains(&h.nav.speed), "chase speed {}", h.nav.speed);
        assert_eq!(h.perception.last_known_target_position, Some(target));
        assert!(h.perception.is_suspicious(3.9));
    }

    #[test]
    fn test_in_range_attacks_once() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));

        let report = h.tick(0.0, Some(target));

        assert_eq!(h.brain.state(), AgentState::Attack);
        assert!(h.nav.halted);
        assert_eq!(report.cues, vec![CueKind::AttackStart]);
        assert_eq!(report.facing, Some(Facing::Point(target)));
        assert!(h.brain.has_pending_strike());
        assert_eq!(h.brain.last_attack_at(), Some(0.0));

        // Cooldown: никаких новых AttackStart
        for step in 1..10 {
            let report = h.tick(step as f32 * 0.1, Some(target));
            assert!(!report.cues.contains(&CueKind::AttackStart));
            assert_eq!(h.brain.state(), AgentState::Attack);
        }
    }

    #[test]
    fn test_strike_lands_after_windup_then_cooldown() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));

        h.tick(0.0, Some(target));
        assert!(h.tick(0.1, Some(target)).strike.is_none());

        let report = h.tick(0.2, Some(target));
        assert!(matches!(report.strike, Some(StrikePlan::Melee(_))));
        assert!(!h.brain.has_pending_strike());

        assert!(h.tick(1.0, Some(target)).cues.is_empty());
        assert_eq!(h.tick(1.5, Some(target)).cues, vec![CueKind::AttackStart]);
    }

    #[test]
    fn test_heavy_windup_is_longer() {
        let mut h = Harness::new();
        h.config = CombatantConfig::heavy();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));

        h.tick(0.0, Some(target));
        assert!(h.tick(0.3, Some(target)).strike.is_none());
        assert!(h.tick(0.4, Some(target)).strike.is_some());
    }

    #[test]
    fn test_lost_and_regained_never_patrols() {
        let mut h = Harness::new();
        h.waypoints = vec![Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 20.0)];
        let target = Vec3::new(0.0, 0.0, -5.0);

        let mut transitions = Vec::new();
        h.see(Some(target));
        transitions.extend(h.tick(0.0, Some(target)).transitions);

        h.see(None);
        transitions.extend(h.tick(1.0, Some(target)).transitions);
        assert_eq!(h.brain.state(), AgentState::Investigate);
        assert_eq!(h.nav.destination, Some(target));

        h.see(Some(target));
        transitions.extend(h.tick(2.0, Some(target)).transitions);
        assert_eq!(h.brain.state(), AgentState::Chase);

        assert_eq!(
            transitions,
            vec![
                (AgentState::Idle, AgentState::Chase),
                (AgentState::Chase, AgentState::Investigate),
                (AgentState::Investigate, AgentState::Chase),
            ]
        );
    }

    #[test]
    fn test_damage_cancels_windup_and_staggers() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));

        h.tick(0.0, Some(target));
        assert!(h.brain.has_pending_strike());

        h.brain.on_damaged(0.1, 0.25);
        assert_eq!(h.brain.state(), AgentState::Stunned);
        assert!(!h.brain.has_pending_strike());

        let report = h.tick(0.2, Some(target));
        assert!(report.strike.is_none());
        assert!(h.nav.halted);
        assert_eq!(report.transitions, vec![(AgentState::Attack, AgentState::Stunned)]);

        // Stagger закончился → состояние выводится заново, cooldown ещё идёт
        let report = h.tick(0.4, Some(target));
        assert!(report.strike.is_none());
        assert!(report.cues.is_empty());
        assert_eq!(h.brain.state(), AgentState::Attack);
        assert_eq!(report.transitions, vec![(AgentState::Stunned, AgentState::Attack)]);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));
        h.tick(0.0, Some(target));

        // Переход в Dead отдаётся вызывающему сразу и ровно один раз
        assert_eq!(h.brain.on_death(), Some((AgentState::Attack, AgentState::Dead)));
        assert_eq!(h.brain.on_death(), None);
        h.brain.on_damaged(0.1, 0.25);
        assert_eq!(h.brain.state(), AgentState::Dead);
        assert!(!h.brain.has_pending_strike());

        let halts = h.nav.halts;
        for step in 2..20 {
            let report = h.tick(step as f32 * 0.1, Some(target));
            assert_eq!(report, Default::default());
        }
        assert_eq!(h.nav.halts, halts);
        assert_eq!(h.brain.state(), AgentState::Dead);
    }

    #[test]
    fn test_death_while_stunned_continues_reported_chain() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -5.0);
        h.see(Some(target));
        h.tick(0.0, Some(target));

        // Stunned ещё не опубликован → from = Chase
        h.brain.on_damaged(0.1, 0.25);
        assert_eq!(h.brain.on_death(), Some((AgentState::Chase, AgentState::Dead)));
        assert!(h.tick(0.2, Some(target)).transitions.is_empty());
    }

    #[test]
    fn test_strike_cancelled_when_target_vanishes() {
        let mut h = Harness::new();
        let target = Vec3::new(0.0, 0.0, -1.5);
        h.see(Some(target));
        h.tick(0.0, Some(target));

        h.see(None);
        let report = h.tick(0.25, None);
        assert!(report.strike.is_none());
        assert!(!h.brain.has_pending_strike());
    }

    #[test]
    fn test_investigate_look_around_then_patrol() {
        let mut h = Harness::new();
        h.config.patrol.wander_radius = 0.0;
        h.waypoints = vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 5.0)];
        let spot = Vec3::new(0.0, 0.0, -10.0);
        h.perception.alert(spot, 0.0, 4.0);

        h.tick(0.0, None);
        assert_eq!(h.brain.state(), AgentState::Investigate);
        assert_eq!(h.nav.destination, Some(spot));
        assert!((h.nav.speed - 3.0).abs() < 1e-5);

        h.position = spot;
        let report = h.tick(1.0, None);
        assert_eq!(report.cues, vec![CueKind::Searching]);
        assert!(h.nav.halted);

        let report = h.tick(1.1, None);
        assert!(matches!(report.facing, Some(Facing::Yaw(_))));
        assert_eq!(h.brain.state(), AgentState::Investigate);

        // look-around ≤ 1.2s → к 3.0 закончен, suspicion сброшен
        let report = h.tick(3.0, None);
        assert_eq!(h.brain.state(), AgentState::Patrol);
        assert_eq!(report.transitions, vec![(AgentState::Investigate, AgentState::Patrol)]);
        assert!(!h.perception.is_suspicious(3.0));
        assert_eq!(h.nav.destination, Some(h.waypoints[0]));
    }

    #[test]
    fn test_unreachable_spot_searches_in_place() {
        let mut h = Harness::new();
        h.nav.reject_destinations = true;
        h.perception.alert(Vec3::new(50.0, 0.0, 0.0), 0.0, 4.0);

        let report = h.tick(0.0, None);
        assert_eq!(h.brain.state(), AgentState::Investigate);
        assert_eq!(report.cues, vec![CueKind::Searching]);
        assert!(h.nav.halted);
    }

    #[test]
    fn test_idle_without_route_or_target() {
        let mut h = Harness::new();
        let report = h.tick(0.0, None);

        assert_eq!(h.brain.state(), AgentState::Idle);
        assert!(report.transitions.is_empty());
        assert!(h.nav.halted);
        assert_eq!(h.nav.destination, None);
    }

    #[test]
    fn test_dead_target_is_ignored() {
        let mut h = Harness::new();
        h.see(Some(Vec3::new(0.0, 0.0, -1.0)));

        let ctx = TickContext {
            now: 0.0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            config: &h.config,
            target: Some(TargetSnapshot {
                entity: TARGET,
                position: Vec3::new(0.0, 0.0, -1.0),
                alive: false,
            }),
            waypoints: &[],
            patrol_mode: PatrolMode::Loop,
            hit_window_open: false,
        };
        let report = h.brain.tick(&ctx, &mut h.perception, &mut h.nav, &mut h.rng);

        assert_eq!(h.brain.state(), AgentState::Idle);
        assert!(report.cues.is_empty());
    }

    #[test]
    fn test_patrol_reentry_after_chase() {
        let mut h = Harness::new();
        h.config.patrol.wander_radius = 0.0;
        h.waypoints = vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 5.0)];

        h.tick(0.0, None);
        assert_eq!(h.brain.state(), AgentState::Patrol);

        let target = Vec3::new(0.0, 0.0, -5.0);
        h.see(Some(target));
        h.tick(0.1, Some(target));
        assert_eq!(h.brain.state(), AgentState::Chase);

        // Suspicion истёк → снова патруль, к той же точке
        h.see(None);
        h.perception.expire_suspicion();
        h.tick(0.2, None);
        assert_eq!(h.brain.state(), AgentState::Patrol);
        assert_eq!(h.nav.destination, Some(h.waypoints[0]));
    }
}
