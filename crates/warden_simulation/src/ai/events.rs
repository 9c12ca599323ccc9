//! AI Events - наружу уходят только cues и смены состояния
//!
//! Presentation layer (анимация, звук) подписывается на `AgentCue`;
//! на симуляцию cues не влияют.

use bevy::prelude::*;

use super::AgentState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    AttackStart,
    HitWindowOpen,
    HitWindowClose,
    Died,
    Searching,
}

impl CueKind {
    pub fn name(&self) -> &'static str {
        match self {
            CueKind::AttackStart => "attack-start",
            CueKind::HitWindowOpen => "hit-window-open",
            CueKind::HitWindowClose => "hit-window-close",
            CueKind::Died => "died",
            CueKind::Searching => "searching",
        }
    }
}

/// Fire-and-forget presentation cue.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AgentCue {
    pub agent: Entity,
    pub cue: CueKind,
}

/// Event: агент сменил состояние FSM
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AgentStateChanged {
    pub agent: Entity,
    pub from: AgentState,
    pub to: AgentState,
}
