//! Combat module (state-machine-driven melee combat)
//!
//! Ядро - `ActionStateMachine`: чистая логика без ECS доступа, одна на бойца.
//! ECS системы вокруг неё только доставляют intents, прокидывают мир
//! (позиции, токены, yaw камеры) и публикуют выходные сигналы.
//!
//! Поток одного тика (FixedUpdate):
//! 1. Intents  - CombatIntentEvent → машина
//! 2. Simulate - таймеры, charge, lunge
//! 3. Hits     - overlaps hit volume → урон
//! 4. Publish  - outbox машин → CombatSignalEvent + collaborators
//! 5. Cleanup  - locomotion, анимации, маски, despawn трупов

use bevy::prelude::*;

pub mod builder;
pub mod components;
pub mod signals;
pub mod state_machine;
pub mod systems;
pub mod tokens;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod state_machine_tests;

// Re-export основных типов
pub use builder::{CombatantBuilder, CombatantBundle};
pub use components::*;
pub use signals::{CombatIntent, CombatIntentEvent, CombatSignal, CombatSignalEvent, DamageSource};
pub use state_machine::{ActionStateMachine, CombatContext, CombatTimer};
pub use systems::{DespawnAfter, SlowMotion, ViewYaw};
pub use tokens::AttackTokenScheduler;

use crate::config::CombatConfig;

/// Фазы combat тика (chained в FixedUpdate)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    Intents,
    Simulate,
    Hits,
    Publish,
    Cleanup,
}

/// Combat Plugin
///
/// Регистрирует events, resources и combat системы в FixedUpdate.
/// `AttackTokenScheduler` берёт лимит из `CombatConfig::max_tokens`,
/// если его не вставили заранее.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<CombatIntentEvent>()
            .add_event::<CombatSignalEvent>();

        app.init_resource::<CombatConfig>();
        let max_tokens = app.world().resource::<CombatConfig>().max_tokens;
        if !app.world().contains_resource::<AttackTokenScheduler>() {
            app.insert_resource(AttackTokenScheduler::new(max_tokens));
        }
        app.init_resource::<ViewYaw>()
            .init_resource::<HitVolumeOverlaps>()
            .init_resource::<SlowMotion>();

        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Intents,
                CombatSet::Simulate,
                CombatSet::Hits,
                CombatSet::Publish,
                CombatSet::Cleanup,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::process_combat_intents.in_set(CombatSet::Intents),
                systems::tick_combatants.in_set(CombatSet::Simulate),
                (systems::fill_proximity_overlaps, systems::resolve_melee_hits)
                    .chain()
                    .in_set(CombatSet::Hits),
                systems::publish_combat_signals.in_set(CombatSet::Publish),
                (
                    systems::apply_locomotion,
                    systems::drive_animations,
                    systems::collect_mask_pickups,
                    systems::move_thrown_masks,
                    systems::despawn_after_timeout,
                )
                    .chain()
                    .in_set(CombatSet::Cleanup),
            ),
        );

        // Slow motion меряется реальным временем (virtual сам замедлен)
        app.add_systems(Update, systems::tick_slow_motion);
    }
}
