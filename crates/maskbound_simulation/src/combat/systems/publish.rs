//! Публикация outbox машин: CombatSignalEvent + локальные исполнители
//! (Transform, Locomotion, AnimationTimings, slow-motion, снаряды, трупы).

use bevy::prelude::*;

use crate::combat::components::{
    Allegiance, AnimationCue, AnimationTimings, Locomotion, ThrownMask,
};
use crate::combat::signals::{CombatSignal, CombatSignalEvent};
use crate::combat::state_machine::ActionStateMachine;

use super::effects::{DespawnAfter, SlowMotion};

/// Система: drain outbox → исполнение → CombatSignalEvent
pub fn publish_combat_signals(
    mut commands: Commands,
    mut combatants: Query<(
        Entity,
        &mut ActionStateMachine,
        &mut Transform,
        Option<&mut Locomotion>,
        Option<&mut AnimationTimings>,
    )>,
    mut signal_events: EventWriter<CombatSignalEvent>,
    mut slow_motion: ResMut<SlowMotion>,
    time: Res<Time>,
) {
    for (entity, mut machine, mut transform, mut locomotion, mut animation) in combatants.iter_mut()
    {
        if machine.pending_signals().is_empty() {
            continue;
        }

        let allegiance = machine.allegiance();
        let corpse_lifetime = machine.config().corpse_lifetime;

        for signal in machine.drain_signals() {
            match signal {
                CombatSignal::LungeStep(position) => transform.translation = position,
                CombatSignal::Facing(direction) => {
                    let target = transform.translation + direction;
                    transform.look_at(target, Vec3::Y);
                }
                CombatSignal::SlowMotionRequested { scale, duration } => {
                    slow_motion.request(scale, duration);
                }
                CombatSignal::Died => {
                    if let Some(animation) = animation.as_mut() {
                        animation.stop_all();
                    }
                    if allegiance == Allegiance::Hostile {
                        commands.entity(entity).insert(DespawnAfter {
                            despawn_time: time.elapsed_secs() + corpse_lifetime,
                        });
                    }
                }
                CombatSignal::MaskThrown {
                    mask_type,
                    damage,
                    velocity,
                } => {
                    commands.spawn((
                        ThrownMask {
                            mask_type,
                            damage,
                            velocity,
                            owner: entity,
                            radius: ThrownMask::DEFAULT_RADIUS,
                            lifetime: ThrownMask::DEFAULT_LIFETIME,
                        },
                        Transform::from_translation(transform.translation + Vec3::Y),
                    ));
                    crate::logger::log(&format!("🪃 {:?} threw {:?} mask", entity, mask_type));
                }
                _ => {}
            }

            if let Some(locomotion) = locomotion.as_mut() {
                apply_to_locomotion(locomotion, &signal);
            }
            if let Some(animation) = animation.as_mut() {
                apply_to_animation(animation, &signal);
            }

            signal_events.write(CombatSignalEvent { entity, signal });
        }
    }
}

fn apply_to_locomotion(locomotion: &mut Locomotion, signal: &CombatSignal) {
    match *signal {
        CombatSignal::Impulse(impulse) => locomotion.apply_impulse(impulse),
        CombatSignal::Jump => locomotion.jump(),
        CombatSignal::StopJump => locomotion.cut_jump(),
        CombatSignal::MovementFrozen => locomotion.frozen = true,
        CombatSignal::MovementUnfrozen => locomotion.frozen = false,
        CombatSignal::LocomotionSuspended => {
            locomotion.suspended = true;
            locomotion.velocity = Vec3::ZERO;
        }
        CombatSignal::LocomotionRestored => locomotion.suspended = false,
        CombatSignal::BrakingSuspended => locomotion.braking = false,
        CombatSignal::BrakingRestored => locomotion.braking = true,
        CombatSignal::MoveSpeedChanged(multiplier) => locomotion.speed_multiplier = multiplier,
        _ => {}
    }
}

fn apply_to_animation(animation: &mut AnimationTimings, signal: &CombatSignal) {
    match signal {
        CombatSignal::AttackStarted { .. } => animation.play(AnimationCue::Attack),
        CombatSignal::AttackInterrupted => animation.stop(AnimationCue::Attack),
        CombatSignal::RollStarted { .. } => animation.play(AnimationCue::Roll),
        CombatSignal::GettingUp => animation.play(AnimationCue::GetUp),
        _ => {}
    }
}
