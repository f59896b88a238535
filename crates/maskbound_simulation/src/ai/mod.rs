//! AI decision-making module
//!
//! Hostile FSM: Idle → Chase → (AwaitToken) → Attack → Recover → Idle.
//! AI говорит с боем только через CombatIntentEvent и attack tokens.

use bevy::prelude::*;

pub mod components;
pub mod systems;

// Re-export основных типов
pub use components::*;
pub use systems::*;

use crate::combat::CombatSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Решения принимаются до доставки intents, чтобы машина увидела их в том же тике.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<AIState>()
            .register_type::<AIConfig>()
            .add_systems(FixedUpdate, hostile_brain.before(CombatSet::Intents));
    }
}
