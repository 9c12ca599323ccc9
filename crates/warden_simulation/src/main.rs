//! Headless симуляция WARDEN
//!
//! Scout и caster патрулируют по маршрутам, heavy бродит вокруг точки спавна,
//! игрок стоит рядом с маршрутом scout'а.
//! Печатает состояние агентов каждые 60 тиков.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use warden_simulation::ai::{PatrolMode, PatrolRoute};
use warden_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting WARDEN headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));

    let roster = [
        ("scout", Vec3::new(-6.0, 0.0, 0.0), PatrolMode::Loop),
        ("heavy", Vec3::new(20.0, 0.0, 0.0), PatrolMode::Wander),
        ("caster", Vec3::new(0.0, 0.0, 20.0), PatrolMode::Random),
    ];

    let mut agents = Vec::new();
    for (preset, center, mode) in roster {
        let archetype = app.world_mut().resource_mut::<ArchetypeRegistry>().resolve(preset);
        let seed = app.world_mut().resource_mut::<DeterministicRng>().next_seed();
        let route = match mode {
            PatrolMode::Wander => PatrolRoute::wander(center),
            _ => PatrolRoute::new(
                vec![
                    center + Vec3::new(-3.0, 0.0, -3.0),
                    center + Vec3::new(3.0, 0.0, -3.0),
                    center + Vec3::new(3.0, 0.0, 3.0),
                ],
                mode,
            ),
        };

        let entity = {
            let mut commands = app.world_mut().commands();
            let entity = spawn_agent(&mut commands, AgentBundle::new(archetype, center, seed));
            commands.entity(entity).insert(route);
            entity
        };
        agents.push((preset, entity));
    }
    app.world_mut().flush();

    let player = app.world_mut().spawn(PlayerBundle::new(Vec3::new(-6.0, 0.0, -10.0))).id();

    // 20 секунд симуляции
    for tick in 0..1200 {
        app.update();

        if tick % 60 == 0 {
            let world = app.world();
            let player_hp = world.get::<Health>(player).map_or(0.0, |health| health.fraction());
            print!("Tick {:>4} | player HP {:>3.0}%", tick, player_hp * 100.0);
            for (preset, entity) in &agents {
                let state = world
                    .get::<AgentBrain>(*entity)
                    .map_or(AgentState::Dead, |brain| brain.state());
                print!(" | {} {:?}", preset, state);
            }
            println!();
        }
    }

    println!("Simulation complete!");
}
