//! Hostile brain: FSM преследования и атак через attack tokens.
//!
//! Решение (`decide`) - чистая функция от восприятия. Всё что трогает
//! мир (токены, intents, RNG) делает система `hostile_brain`.

use bevy::prelude::*;

use crate::combat::components::TargetSnapshot;

/// AI FSM состояния
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub enum AIState {
    /// Idle - целей в радиусе нет
    Idle,

    /// Chase - идём к цели до attack range
    Chase { target: Entity },

    /// AwaitToken - в радиусе, но все токены заняты
    AwaitToken {
        target: Entity,
        /// Через сколько секунд повторить запрос
        retry_in: f32,
    },

    /// Attack - удар идёт, токен у нас
    Attack { target: Entity },

    /// Recover - пауза после удара
    Recover { timer: f32 },

    /// Dead - машина мертва, AI отключен
    Dead,
}

impl Default for AIState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Параметры AI
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AIConfig {
    /// Радиус обнаружения игрока (метры)
    pub detection_range: f32,
    /// Дистанция с которой начинаем удар (метры)
    pub attack_range: f32,
    /// Пауза после удара (секунды)
    pub recover_duration: f32,
    /// Базовый интервал повторного запроса токена (секунды)
    pub token_retry_interval: f32,
    /// Случайная добавка к интервалу, чтобы толпа не ломилась синхронно
    pub token_retry_jitter: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            detection_range: 12.0,
            attack_range: 1.4,
            recover_duration: 0.8,
            token_retry_interval: 0.5,
            token_retry_jitter: 0.3,
        }
    }
}

/// Что AI знает о себе и мире в этом тике
#[derive(Debug, Clone, Copy)]
pub struct Perception {
    pub position: Vec3,
    pub alive: bool,
    /// Машина в ActionState::None (может начать удар)
    pub ready: bool,
    /// Машина в ActionState::Attacking
    pub attacking: bool,
    /// Ближайшая живая цель в detection range
    pub target: Option<TargetSnapshot>,
}

/// Действие, которое система исполняет после решения
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AIAction {
    None,
    /// Мировое направление движения (нормализованное)
    MoveToward(Vec3),
    Stop,
    /// Запросить токен; успех → Attack, отказ → AwaitToken
    TryAttack(Entity),
    /// Удар закончился - токен вернуть (no-op если не держим)
    ReleaseToken,
}

/// Один шаг FSM.
pub fn decide(
    state: &AIState,
    perception: &Perception,
    config: &AIConfig,
    delta: f32,
) -> (AIState, AIAction) {
    if !perception.alive {
        return (AIState::Dead, AIAction::Stop);
    }

    match *state {
        AIState::Dead => (AIState::Dead, AIAction::None),

        AIState::Idle => match perception.target {
            Some(target) => chase_or_strike(target, perception, config),
            None => (AIState::Idle, AIAction::None),
        },

        AIState::Chase { .. } => match perception.target {
            Some(target) => chase_or_strike(target, perception, config),
            None => (AIState::Idle, AIAction::Stop),
        },

        AIState::AwaitToken { target, retry_in } => {
            let Some(snapshot) = perception.target else {
                return (AIState::Idle, AIAction::Stop);
            };
            if snapshot.entity != target || !in_attack_range(&snapshot, perception, config) {
                return chase_or_strike(snapshot, perception, config);
            }

            let retry_in = retry_in - delta;
            if retry_in <= 0.0 && perception.ready {
                (AIState::Chase { target }, AIAction::TryAttack(target))
            } else {
                (AIState::AwaitToken { target, retry_in }, AIAction::Stop)
            }
        }

        AIState::Attack { target } => {
            if perception.attacking {
                (AIState::Attack { target }, AIAction::None)
            } else {
                // Удар завершён или прерван (hurt/knockdown)
                (
                    AIState::Recover {
                        timer: config.recover_duration,
                    },
                    AIAction::ReleaseToken,
                )
            }
        }

        AIState::Recover { timer } => {
            let timer = timer - delta;
            if timer <= 0.0 {
                (AIState::Idle, AIAction::None)
            } else {
                (AIState::Recover { timer }, AIAction::Stop)
            }
        }
    }
}

fn in_attack_range(target: &TargetSnapshot, perception: &Perception, config: &AIConfig) -> bool {
    flat_distance(perception.position, target.position) <= config.attack_range
}

fn chase_or_strike(
    target: TargetSnapshot,
    perception: &Perception,
    config: &AIConfig,
) -> (AIState, AIAction) {
    let chase = AIState::Chase {
        target: target.entity,
    };

    if in_attack_range(&target, perception, config) {
        if perception.ready {
            (chase, AIAction::TryAttack(target.entity))
        } else {
            (chase, AIAction::Stop)
        }
    } else {
        let offset = target.position - perception.position;
        let direction = Vec3::new(offset.x, 0.0, offset.z).normalize_or_zero();
        (chase, AIAction::MoveToward(direction))
    }
}

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Ближайшая цель в радиусе (детерминированно: при равенстве - меньший index)
pub fn nearest_target(
    position: Vec3,
    candidates: &[TargetSnapshot],
    detection_range: f32,
) -> Option<TargetSnapshot> {
    candidates
        .iter()
        .map(|candidate| (*candidate, flat_distance(position, candidate.position)))
        .filter(|(_, distance)| *distance <= detection_range)
        .min_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then(a.0.entity.index().cmp(&b.0.entity.index()))
        })
        .map(|(candidate, _)| candidate)
}

/// Мировое направление → camera-relative input (обратно к `input_to_world`)
pub fn world_to_input(direction: Vec3, view_yaw: f32) -> Vec2 {
    let (forward, right) = crate::combat::components::camera_basis(view_yaw);
    Vec2::new(direction.dot(right), direction.dot(forward))
}
