//! Базовые компоненты акторов: Health, Player

use bevy::prelude::*;

use crate::perception::FootstepNoise;
use crate::spatial::{Body, Layers};

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Returns the amount actually removed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let dealt = amount.max(0.0).min(self.current);
        self.current -= dealt;
        dealt
    }

    pub fn kill(&mut self) -> f32 {
        let dealt = self.current;
        self.current = 0.0;
        dealt
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

/// Player marker: the only entities agents acquire as targets.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Everything a player-controlled body needs to be seen, heard and hit.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub transform: Transform,
    pub health: Health,
    pub body: Body,
    pub footsteps: FootstepNoise,
}

impl PlayerBundle {
    pub fn new(position: Vec3) -> Self {
        Self {
            player: Player,
            transform: Transform::from_translation(position),
            health: Health::new(100.0),
            body: Body::actor(Layers::PLAYER),
            footsteps: FootstepNoise::default(),
        }
    }
}
