//! Combat signals: что машина потребляет и что публикует.
//!
//! Входы (`CombatIntent`) приходят от input/AI/анимаций/физики.
//! Выходы (`CombatSignal`) складываются в outbox машины и публикуются
//! как `CombatSignalEvent` - анимации, locomotion, камера и UI подписываются
//! на них, сама машина о подписчиках не знает.

use bevy::prelude::*;

use super::components::MaskType;

/// Кто/откуда нанёс урон
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageSource {
    pub entity: Option<Entity>,
    /// Мировая позиция источника (для направления knockback)
    pub position: Vec3,
}

impl DamageSource {
    pub fn at(position: Vec3) -> Self {
        Self {
            entity: None,
            position,
        }
    }

    pub fn from_entity(entity: Entity, position: Vec3) -> Self {
        Self {
            entity: Some(entity),
            position,
        }
    }
}

/// Входные сигналы машины состояний.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatIntent {
    /// Быстрый удар (tap)
    AttackIntentStart,
    /// Удержание атаки → Charging
    AttackIntentHold,
    /// Отпускание атаки → charged удар
    AttackIntentRelease,
    RollIntent,
    /// Camera-relative input (x = вправо, y = вперёд)
    MovementIntent(Vec2),
    JumpIntentStart,
    JumpIntentRelease,
    MaskThrowIntentStart,
    MaskThrowIntentRelease,
    EquipMask(MaskType),

    // --- Анимации ---
    AttackAnimationFinished,
    RollAnimationFinished,
    GetUpAnimationFinished,

    // --- Физика ---
    Landed,
    IncomingDamage { amount: f32, source: DamageSource },
}

impl CombatIntent {
    /// Intents от игрока/AI (блокируются после смерти через disable input)
    pub fn is_control_input(&self) -> bool {
        matches!(
            self,
            CombatIntent::AttackIntentStart
                | CombatIntent::AttackIntentHold
                | CombatIntent::AttackIntentRelease
                | CombatIntent::RollIntent
                | CombatIntent::MovementIntent(_)
                | CombatIntent::JumpIntentStart
                | CombatIntent::JumpIntentRelease
                | CombatIntent::MaskThrowIntentStart
                | CombatIntent::MaskThrowIntentRelease
        )
    }
}

/// Выходные сигналы машины состояний.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatSignal {
    // --- Атака ---
    AttackStarted {
        combo_index: usize,
        damage_multiplier: f32,
    },
    AttackCompleted {
        hit_landed: bool,
        has_buff: bool,
    },
    AttackInterrupted,
    ChargeStarted,
    ChargeEnded,
    HitWindowOpened,
    HitWindowClosed,
    HitDealt {
        target: Entity,
        damage: f32,
    },

    // --- Реакции на урон ---
    DamageTaken {
        amount: f32,
        health: f32,
    },
    Hurt,
    KnockedDown,
    GettingUp,
    InvincibilityEnded,
    Died,
    Healed {
        amount: f32,
    },

    // --- Маска ---
    MaskChanged(Option<MaskType>),
    MaskThrown {
        mask_type: MaskType,
        damage: f32,
        velocity: Vec3,
    },
    MoveSpeedChanged(f32),

    // --- Locomotion / физика ---
    RollStarted {
        direction: Vec3,
    },
    /// Мгновенная скорость (roll, knockback, knockdown)
    Impulse(Vec3),
    BrakingSuspended,
    BrakingRestored,
    MovementFrozen,
    MovementUnfrozen,
    LocomotionSuspended,
    LocomotionRestored,
    /// Новая позиция рывка (владелец Transform применяет)
    LungeStep(Vec3),
    Facing(Vec3),
    Jump,
    StopJump,

    // --- Глобальные эффекты ---
    SlowMotionRequested {
        scale: f32,
        duration: f32,
    },
    InputDisabled,
}

/// Intent для конкретного бойца (Bevy event envelope)
#[derive(Event, Debug, Clone, Copy)]
pub struct CombatIntentEvent {
    pub entity: Entity,
    pub intent: CombatIntent,
}

impl CombatIntentEvent {
    pub fn new(entity: Entity, intent: CombatIntent) -> Self {
        Self { entity, intent }
    }
}

/// Опубликованный сигнал бойца
#[derive(Event, Debug, Clone, Copy)]
pub struct CombatSignalEvent {
    pub entity: Entity,
    pub signal: CombatSignal,
}
