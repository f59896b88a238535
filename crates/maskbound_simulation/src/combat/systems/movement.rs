//! Headless collaborators: locomotion (движение/приземление) и
//! таймеры анимаций (attack/roll/get-up finished).

use bevy::prelude::*;

use crate::combat::components::{input_to_world, AnimationCue, AnimationTimings, Locomotion};
use crate::combat::signals::{CombatIntent, CombatIntentEvent};
use crate::combat::state_machine::ActionStateMachine;

use super::intents::ViewYaw;

/// Система: движение по input + импульсы + гравитация
///
/// Приземление публикуется как `Landed` intent (обработается в следующем тике).
pub fn apply_locomotion(
    time: Res<Time>,
    view_yaw: Res<ViewYaw>,
    mut combatants: Query<(Entity, &ActionStateMachine, &mut Locomotion, &mut Transform)>,
    mut intents: EventWriter<CombatIntentEvent>,
) {
    let dt = time.delta_secs();

    for (entity, machine, mut locomotion, mut transform) in combatants.iter_mut() {
        if !machine.is_alive() {
            continue;
        }

        if machine.locomotion_enabled() && locomotion.accepts_input() {
            let input = machine.movement_input().clamp_length_max(1.0);
            let direction = input_to_world(input, view_yaw.0);
            let speed = locomotion.base_speed * locomotion.speed_multiplier;
            transform.translation += direction * speed * dt;
        }

        if locomotion.integrate(&mut transform.translation, dt) {
            intents.write(CombatIntentEvent::new(entity, CombatIntent::Landed));
        }
    }
}

/// Система: "animation finished" по длительностям клипов
pub fn drive_animations(
    time: Res<Time>,
    mut animated: Query<(Entity, &mut AnimationTimings)>,
    mut intents: EventWriter<CombatIntentEvent>,
) {
    let dt = time.delta_secs();

    for (entity, mut animation) in animated.iter_mut() {
        for cue in animation.advance(dt) {
            let intent = match cue {
                AnimationCue::Attack => CombatIntent::AttackAnimationFinished,
                AnimationCue::Roll => CombatIntent::RollAnimationFinished,
                AnimationCue::GetUp => CombatIntent::GetUpAnimationFinished,
            };
            intents.write(CombatIntentEvent::new(entity, intent));
        }
    }
}
