//! AI decision-making module
//!
//! Priority FSM на агента: Dead > Stunned > Attack > Chase > Investigate > Patrol/Idle.
//! Задержки (windup, stagger, look-around) - отменяемые continuations (schedule.rs).

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod schedule;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use events::{AgentCue, AgentStateChanged, CueKind};
pub use schedule::{CancelScope, Continuation, Poll};
pub use systems::tick_agents;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// tick_agents идёт в Decide set: после perception (Sense), до combat (Resolve).
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AgentCue>().add_event::<AgentStateChanged>();

        app.add_systems(FixedUpdate, tick_agents.in_set(crate::SimulationSet::Decide));
    }
}
