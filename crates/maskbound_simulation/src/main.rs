//! Headless симуляция MASKBOUND
//!
//! Игрок против стаи hostile: AI бьёт через attack tokens, игрок отвечает
//! комбо по таймеру. Опционально первый аргумент - путь к RON с CombatConfig.

use bevy::prelude::*;
use maskbound_simulation::*;

const TICKS: usize = 1200;
const SEED: u64 = 42;

fn load_config() -> Result<CombatConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => CombatConfig::from_ron_file(path),
        None => Ok(CombatConfig::default()),
    }
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Config error: {}", error);
            std::process::exit(1);
        }
    };

    println!("Starting MASKBOUND headless simulation (seed: {})", SEED);

    let mut app = create_headless_app(SEED);
    app.insert_resource(config.clone())
        .insert_resource(AttackTokenScheduler::new(config.max_tokens))
        .add_plugins(SimulationPlugin);

    let world = app.world_mut();
    let player = CombatantBuilder::player()
        .with_config(config.clone())
        .spawn_in_world(world);

    for i in 0..4 {
        let angle = i as f32 * std::f32::consts::FRAC_PI_2;
        let position = Vec3::new(angle.cos() * 6.0, 0.0, angle.sin() * 6.0);
        CombatantBuilder::hostile()
            .with_config(config.clone())
            .at(position)
            .spawn_in_world(world);
    }

    world.spawn((
        MaskPickup::new(MaskType::Vampire),
        Transform::from_xyz(0.0, 0.0, 0.5),
    ));

    for tick in 0..TICKS {
        // Игрок жмёт атаку каждые 0.3с
        if tick % 18 == 0 {
            app.world_mut()
                .send_event(CombatIntentEvent::new(player, CombatIntent::AttackIntentStart));
        }

        app.update();

        if tick % 120 == 0 {
            print_summary(&mut app, tick);
        }
    }

    print_summary(&mut app, TICKS);
    println!("Simulation complete!");
}

fn print_summary(app: &mut App, tick: usize) {
    let world = app.world_mut();
    let holders = world.resource::<AttackTokenScheduler>().holder_count();

    let mut query = world.query::<(Entity, &ActionStateMachine)>();
    let mut combatants: Vec<_> = query.iter(world).collect();
    combatants.sort_by_key(|(entity, _)| entity.index());

    println!("Tick {}: {} combatants, {} token holders", tick, combatants.len(), holders);
    for (entity, machine) in combatants {
        println!(
            "  {:?} {:?} {:?} hp={:.1} mask={:?}",
            entity,
            machine.allegiance(),
            machine.state(),
            machine.health(),
            machine.mask().mask_type()
        );
    }
}
