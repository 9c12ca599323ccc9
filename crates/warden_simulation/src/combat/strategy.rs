//! Attack strategies (melee heavy / melee light / ranged).
//!
//! State machine держит только `AttackStyle` из конфига и вызывает
//! `perform_attack` когда windup закончился. Никаких подклассов.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{MeleeStrike, RangedStrike};
use crate::config::CombatantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttackStyle {
    MeleeHeavy,
    #[default]
    MeleeLight,
    Ranged,
}

impl AttackStyle {
    pub fn strategy(self) -> &'static dyn AttackStrategy {
        match self {
            AttackStyle::MeleeHeavy => &HeavySwing,
            AttackStyle::MeleeLight => &QuickStrike,
            AttackStyle::Ranged => &BoltCast,
        }
    }
}

/// Target as seen by the attacker this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub alive: bool,
}

pub struct AttackContext<'a> {
    pub position: Vec3,
    pub rotation: Quat,
    pub target: TargetSnapshot,
    pub config: &'a CombatantConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrikePlan {
    Melee(MeleeStrike),
    Ranged(RangedStrike),
}

pub trait AttackStrategy: Send + Sync {
    /// Delay between attack decision and `perform_attack`.
    fn windup(&self, config: &CombatantConfig) -> f32;

    /// `None` cancels the strike silently (target gone, out of reach).
    fn perform_attack(&self, ctx: &AttackContext) -> Option<StrikePlan>;
}

pub struct HeavySwing;
pub struct QuickStrike;
pub struct BoltCast;

fn melee_strike(ctx: &AttackContext) -> Option<StrikePlan> {
    let melee = &ctx.config.melee;
    if !ctx.target.alive {
        return None;
    }
    if ctx.position.distance(ctx.target.position) > ctx.config.attack_range + melee.reach_slack {
        return None;
    }

    let origin = match melee.socket_offset {
        Some(offset) => ctx.position + ctx.rotation * Vec3::from_array(offset),
        None => ctx.position,
    };

    Some(StrikePlan::Melee(MeleeStrike {
        origin,
        radius: melee.radius.max(0.1),
        damage: melee.damage,
        damage_type: melee.damage_type,
        duration: melee.hit_window,
        hit_mask: melee.hit_mask,
    }))
}

impl AttackStrategy for HeavySwing {
    fn windup(&self, config: &CombatantConfig) -> f32 {
        config.melee.heavy_windup
    }

    fn perform_attack(&self, ctx: &AttackContext) -> Option<StrikePlan> {
        melee_strike(ctx)
    }
}

impl AttackStrategy for QuickStrike {
    fn windup(&self, config: &CombatantConfig) -> f32 {
        config.melee.light_windup
    }

    fn perform_attack(&self, ctx: &AttackContext) -> Option<StrikePlan> {
        melee_strike(ctx)
    }
}

impl AttackStrategy for BoltCast {
    fn windup(&self, config: &CombatantConfig) -> f32 {
        config.ranged.cast_time
    }

    fn perform_attack(&self, ctx: &AttackContext) -> Option<StrikePlan> {
        if !ctx.target.alive {
            return None;
        }
        let ranged = &ctx.config.ranged;
        let origin = ctx.position + Vec3::Y * ranged.muzzle_height;
        let aim = ctx.target.position + Vec3::Y * ctx.config.vision.torso_height;
        let direction = (aim - origin).try_normalize()?;

        Some(StrikePlan::Ranged(RangedStrike {
            origin,
            direction,
            speed: ranged.projectile_speed,
            damage: ranged.damage,
            damage_type: ranged.damage_type,
            lifetime: ranged.lifetime,
            homing: ranged.homing.then_some(ctx.target.entity),
            aim_height: ctx.config.vision.torso_height,
            hit_mask: ranged.hit_mask,
        }))
    }
}
