//! MASKBOUND Simulation Core
//!
//! Headless ECS-симуляция ближнего боя на Bevy 0.16: action state machine
//! бойца, маски-баффы, attack tokens для толпы, aim-assist рывки.
//!
//! Рендер/физика/анимации - снаружи. Они говорят с симуляцией через
//! `CombatIntentEvent` (вход) и `CombatSignalEvent` (выход).

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod config;
pub mod logger;
pub mod timers;

// Re-export базовых типов для удобства
pub use ai::{AIConfig, AIPlugin, AIState};
pub use combat::{
    ActionState, ActionStateMachine, Allegiance, AttackTokenScheduler, CombatIntent,
    CombatIntentEvent, CombatPlugin, CombatSet, CombatSignal, CombatSignalEvent,
    CombatantBuilder, DamageSource, HitVolume, HitVolumeOverlaps, MaskPickup, MaskType,
    SlowMotion, ThrownMask, ViewYaw,
};
pub use config::{CombatConfig, ConfigError};
pub use logger::*;
pub use timers::TimerSet;

/// Частота симуляции (FixedUpdate)
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ));

        // Детерминистичный RNG (seed по умолчанию, если не задан снаружи)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        // Подсистемы
        app.add_plugins((CombatPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
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
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает вручную: один `app.update()` = один fixed тик (при
/// нормальной скорости времени). Боевые плагины не добавлены -
/// `SimulationPlugin` подключает вызывающий.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();

    let fixed = Time::<Fixed>::from_hz(SIMULATION_HZ);
    let step: Duration = fixed.timestep();

    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(fixed)
        .insert_resource(TimeUpdateStrategy::ManualDuration(step));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
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
