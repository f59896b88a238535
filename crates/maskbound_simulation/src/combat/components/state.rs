//! Combatant data model: action state, health, facing, stat modifiers.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Состояние действий бойца.
///
/// `None` - начальное, `Dead` - терминальное (переходов из него нет).
/// Остальные взаимоисключающие: в каждый момент активно ровно одно.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    None,
    Attacking,
    Charging,
    /// Замах перед броском маски
    ChargeMask,
    Rolling,
    Hurt,
    KnockedDown,
    Grounded,
    GettingUp,
    Dead,
}

impl ActionState {
    /// Состояния в которых входящий урон игнорируется целиком
    pub fn rejects_damage(&self) -> bool {
        matches!(
            self,
            ActionState::Dead
                | ActionState::Rolling
                | ActionState::KnockedDown
                | ActionState::Grounded
                | ActionState::GettingUp
        )
    }

    /// Состояния из которых roll запрещён
    pub fn blocks_roll(&self) -> bool {
        matches!(
            self,
            ActionState::Dead
                | ActionState::Hurt
                | ActionState::KnockedDown
                | ActionState::Grounded
                | ActionState::GettingUp
                | ActionState::Rolling
        )
    }

    pub fn is_knockdown_sequence(&self) -> bool {
        matches!(
            self,
            ActionState::KnockedDown | ActionState::Grounded | ActionState::GettingUp
        )
    }
}

/// Сторона конфликта. Player цели - Hostile, и наоборот.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum Allegiance {
    Player,
    Hostile,
}

impl Allegiance {
    pub fn is_hostile_to(&self, other: Allegiance) -> bool {
        *self != other
    }
}

/// Последняя сторона экрана, в которую смотрел боец (sprite flip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum FacingSide {
    Left,
    #[default]
    Right,
}

impl FacingSide {
    pub fn sign(&self) -> f32 {
        match self {
            FacingSide::Left => -1.0,
            FacingSide::Right => 1.0,
        }
    }
}

/// Модификаторы от активной маски.
///
/// Base значения = без маски. Маска применяет/откатывает свои эффекты
/// поверх (apply/revert должны быть строго обратными).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CombatModifiers {
    /// Доля нанесённого урона, возвращаемая в health
    pub lifesteal_fraction: f32,
    /// Секунды маски, возвращаемые за каждый попавший удар
    pub extend_on_hit: f32,
    /// Доля входящего урона, которая поглощается
    pub damage_reduction: f32,
    pub knockdown_immune: bool,
    pub cooldown_multiplier: f32,
    pub move_speed_multiplier: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            lifesteal_fraction: 0.0,
            extend_on_hit: 0.0,
            damage_reduction: 0.0,
            knockdown_immune: false,
            cooldown_multiplier: 1.0,
            move_speed_multiplier: 1.0,
        }
    }
}

/// Боец под управлением ActionStateMachine.
///
/// Инварианты:
/// - 0 ≤ health ≤ max_health
/// - state == Dead ⇒ health == 0
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub state: ActionState,
    pub health: f32,
    pub max_health: f32,
    pub is_invincible: bool,
    /// Unit vector на плоскости XZ
    pub facing_direction: Vec3,
    pub facing_side: FacingSide,
    pub consecutive_hit_count: u32,
    pub charge_elapsed: f32,
    pub damage_multiplier: f32,
    pub modifiers: CombatModifiers,
}

impl Combatant {
    pub fn new(max_health: f32) -> Self {
        Self {
            state: ActionState::None,
            health: max_health,
            max_health,
            is_invincible: false,
            facing_direction: Vec3::NEG_Z,
            facing_side: FacingSide::Right,
            consecutive_hit_count: 0,
            charge_elapsed: 0.0,
            damage_multiplier: 1.0,
            modifiers: CombatModifiers::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != ActionState::Dead
    }

    /// Вычитает урон с clamp в [0, max]. Возвращает реально снятое здоровье.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        before - self.health
    }

    /// Лечение с clamp к max. Возвращает реально восстановленное.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
        self.health - before
    }

    pub fn health_fraction(&self) -> f32 {
        self.health / self.max_health
    }
}
