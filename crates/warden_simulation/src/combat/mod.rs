//! Combat Resolver module
//!
//! ECS ответственность:
//! - Strike shapes: melee hit window, ranged projectile
//! - Damage rules: receiving-side multipliers, instant-kill, idempotent death
//! - Events: DamageRequest → DamageDealt / EntityDied
//!
//! Атаки планирует state machine (ai), здесь только их разрешение.

use bevy::prelude::*;

pub mod damage;
pub mod hit_window;
pub mod projectile;
pub mod strategy;

// Re-export основных типов
pub use damage::{
    apply_damage, DamageDealt, DamageHit, DamageMultipliers, DamageOutcome, DamageProfile, DamageReceiver,
    DamageRequest, DamageType, Damageable, Dead, EntityDied, Resistances,
};
pub use hit_window::{sweep_hit_windows, HitWindow, MeleeStrike};
pub use projectile::{advance_projectiles, Projectile, RangedStrike};
pub use strategy::{AttackContext, AttackStrategy, AttackStyle, StrikePlan, TargetSnapshot};

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate (Resolve set).
///
/// Порядок выполнения:
/// 1. sweep_hit_windows - melee sweeps, закрытие истёкших окон
/// 2. advance_projectiles - полёт, первый контакт, lifetime
/// 3. apply_damage - все DamageRequest этого тика → Damageable
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageRequest>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            FixedUpdate,
            (sweep_hit_windows, advance_projectiles, apply_damage)
                .chain()
                .in_set(crate::SimulationSet::Resolve),
        );
    }
}
