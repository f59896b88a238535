//! Hostile brain system: восприятие → `decide` → intents/токены.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{decide, nearest_target, world_to_input, AIAction, AIConfig, AIState, Perception};
use crate::combat::components::ActionState;
use crate::combat::signals::{CombatIntent, CombatIntentEvent};
use crate::combat::state_machine::ActionStateMachine;
use crate::combat::systems::{lunge_candidates, snapshot_combatants, ViewYaw};
use crate::combat::tokens::AttackTokenScheduler;
use crate::DeterministicRng;

/// Система: шаг FSM всех hostile с AI
///
/// Токен запрашивается здесь, до AttackIntentStart: отказ оставляет AI
/// ждать в радиусе с jittered повтором вместо бесконечного спама intent'ов.
pub fn hostile_brain(
    mut brains: Query<(Entity, &mut AIState, &AIConfig)>,
    combatants: Query<(Entity, &ActionStateMachine, &Transform)>,
    mut tokens: ResMut<AttackTokenScheduler>,
    mut rng: ResMut<DeterministicRng>,
    mut intents: EventWriter<CombatIntentEvent>,
    view_yaw: Res<ViewYaw>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();
    let snapshots = snapshot_combatants(combatants.iter());

    // Порядок query не гарантирован - RNG тратится в порядке index
    let mut ordered: Vec<_> = brains.iter_mut().collect();
    ordered.sort_by_key(|(entity, _, _)| entity.index());

    for (entity, mut state, config) in ordered {
        let Ok((_, machine, transform)) = combatants.get(entity) else {
            continue;
        };

        let candidates = lunge_candidates(&snapshots, machine.allegiance());
        let perception = Perception {
            position: transform.translation,
            alive: machine.is_alive(),
            ready: machine.state() == ActionState::None,
            attacking: machine.state() == ActionState::Attacking,
            target: nearest_target(transform.translation, &candidates, config.detection_range),
        };

        let (next, action) = decide(&state, &perception, config, delta);

        let next = match action {
            AIAction::None => next,
            AIAction::MoveToward(direction) => {
                let input = world_to_input(direction, view_yaw.0);
                intents.write(CombatIntentEvent::new(entity, CombatIntent::MovementIntent(input)));
                next
            }
            AIAction::Stop => {
                if machine.movement_input() != Vec2::ZERO {
                    intents.write(CombatIntentEvent::new(
                        entity,
                        CombatIntent::MovementIntent(Vec2::ZERO),
                    ));
                }
                next
            }
            AIAction::TryAttack(target) => {
                if machine.movement_input() != Vec2::ZERO {
                    intents.write(CombatIntentEvent::new(
                        entity,
                        CombatIntent::MovementIntent(Vec2::ZERO),
                    ));
                }
                if tokens.request_attack(entity) {
                    intents.write(CombatIntentEvent::new(entity, CombatIntent::AttackIntentStart));
                    AIState::Attack { target }
                } else {
                    let jitter = if config.token_retry_jitter > 0.0 {
                        rng.rng.gen_range(0.0..config.token_retry_jitter)
                    } else {
                        0.0
                    };
                    AIState::AwaitToken {
                        target,
                        retry_in: config.token_retry_interval + jitter,
                    }
                }
            }
            AIAction::ReleaseToken => {
                tokens.release_token(entity);
                next
            }
        };

        if *state != next {
            if matches!(next, AIState::Dead) {
                crate::logger::log(&format!("💀 AI {:?} disabled (dead)", entity));
            } else if matches!(
                (&*state, &next),
                (AIState::Idle, AIState::Chase { .. })
            ) {
                crate::logger::log(&format!("👁️ AI {:?} spotted target, chasing", entity));
            }
            *state = next;
        }
    }
}
