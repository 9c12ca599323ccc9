//! WARDEN Simulation Core
//!
//! ECS-симуляция hostile NPC на Bevy 0.16 (headless, FixedUpdate 60Hz):
//! - perception: зрение, слух, ally calls
//! - ai: priority state machine на агента
//! - combat: melee hit windows, projectiles, damage rules
//! - navigation: kinematic steering поверх простой XZ-поверхности
//!
//! Один тик = Sense → Decide → Resolve → Move (строго по порядку).

use bevy::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod navigation;
pub mod perception;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ai::{spawn_agent, AIPlugin, AgentBrain, AgentBundle, AgentCue, AgentState, AgentStateChanged, CueKind};
pub use combat::{CombatPlugin, DamageDealt, DamageRequest, DamageType, Dead, EntityDied};
pub use components::*;
pub use config::{Archetype, ArchetypeRegistry, CombatantConfig, ConfigError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel, LogPrinter};
pub use navigation::NavigationPlugin;
pub use perception::PerceptionPlugin;

/// Фазы одного simulation tick (FixedUpdate, chained)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Spatial index, шумы, зрение
    Sense,
    /// Agent state machines
    Decide,
    /// Hit windows, projectiles, damage
    Resolve,
    /// Steering
    Move,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed от create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<ArchetypeRegistry>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Sense,
                    SimulationSet::Decide,
                    SimulationSet::Resolve,
                    SimulationSet::Move,
                )
                    .chain(),
            )
            .add_plugins((PerceptionPlugin, AIPlugin, CombatPlugin, NavigationPlugin));
    }
}

/// Детерминистичный RNG resource (seeded); раздаёт seeds агентам
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed для `AgentRng` очередного агента.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

/// Создаёт Bevy App для headless симуляции (MinimalPlugins + SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
