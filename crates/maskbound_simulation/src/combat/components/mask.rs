//! Mask buffs: type table, effects, drain state.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::state::CombatModifiers;
use crate::config::CombatConfig;

/// Тип маски. Одновременно активна максимум одна.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum MaskType {
    /// Lifesteal + продление маски за каждый удар
    Vampire,
    /// Снижение урона + иммунитет к knockdown
    Guardian,
    /// Быстрее roll cooldown + скорость передвижения
    Swift,
}

impl MaskType {
    pub const ALL: [MaskType; 3] = [MaskType::Vampire, MaskType::Guardian, MaskType::Swift];

    /// Эффекты маски с числами из конфига
    pub fn effects(&self, config: &CombatConfig) -> MaskEffects {
        let none = MaskEffects::default();
        match self {
            MaskType::Vampire => MaskEffects {
                lifesteal_fraction: config.mask_lifesteal_fraction,
                extend_on_hit: config.mask_extend_on_hit,
                ..none
            },
            MaskType::Guardian => MaskEffects {
                damage_reduction: config.mask_damage_reduction,
                knockdown_immune: true,
                ..none
            },
            MaskType::Swift => MaskEffects {
                cooldown_multiplier: config.mask_cooldown_multiplier,
                move_speed_multiplier: config.mask_move_speed_multiplier,
                ..none
            },
        }
    }
}

/// Дельта модификаторов одной маски. Default = "ничего не меняет".
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MaskEffects {
    pub lifesteal_fraction: f32,
    pub extend_on_hit: f32,
    pub damage_reduction: f32,
    pub knockdown_immune: bool,
    pub cooldown_multiplier: f32,
    pub move_speed_multiplier: f32,
}

impl Default for MaskEffects {
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

impl CombatModifiers {
    pub fn apply(&mut self, effects: &MaskEffects) {
        self.lifesteal_fraction += effects.lifesteal_fraction;
        self.extend_on_hit += effects.extend_on_hit;
        self.damage_reduction += effects.damage_reduction;
        self.knockdown_immune |= effects.knockdown_immune;
        self.cooldown_multiplier *= effects.cooldown_multiplier;
        self.move_speed_multiplier *= effects.move_speed_multiplier;
    }

    /// Строго обратно `apply`. Иммунитет снимается только если его дала эта маска.
    pub fn revert(&mut self, effects: &MaskEffects) {
        self.lifesteal_fraction -= effects.lifesteal_fraction;
        self.extend_on_hit -= effects.extend_on_hit;
        self.damage_reduction -= effects.damage_reduction;
        if effects.knockdown_immune {
            self.knockdown_immune = false;
        }
        if effects.cooldown_multiplier != 0.0 {
            self.cooldown_multiplier /= effects.cooldown_multiplier;
        }
        if effects.move_speed_multiplier != 0.0 {
            self.move_speed_multiplier /= effects.move_speed_multiplier;
        }
    }
}

/// Активная маска
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveMask {
    pub mask_type: MaskType,
    pub remaining_duration: f32,
    /// Растёт на drain_increase_rate каждую секунду ношения
    pub drain_multiplier: f32,
    pub effects: MaskEffects,
}

/// Результат одного drain тика
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Idle,
    Draining,
    Expired,
}

/// Buff-слот бойца.
///
/// Сам таймер drain (раз в секунду) живёт в TimerSet владельца,
/// здесь только арифметика: сколько осталось и как быстро убывает.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskBuff {
    active: Option<ActiveMask>,
}

impl MaskBuff {
    pub fn active(&self) -> Option<&ActiveMask> {
        self.active.as_ref()
    }

    pub fn mask_type(&self) -> Option<MaskType> {
        self.active.map(|mask| mask.mask_type)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Надеть маску. Эффекты предыдущей откатываются ДО применения новых.
    /// Возвращает тип снятой маски.
    pub fn equip(
        &mut self,
        mask_type: MaskType,
        effects: MaskEffects,
        max_duration: f32,
        modifiers: &mut CombatModifiers,
    ) -> Option<MaskType> {
        let previous = self.unequip(modifiers);

        modifiers.apply(&effects);
        self.active = Some(ActiveMask {
            mask_type,
            remaining_duration: max_duration,
            drain_multiplier: 1.0,
            effects,
        });

        previous.map(|mask| mask.mask_type)
    }

    /// Снять маску и откатить эффекты. No-op если маски нет.
    pub fn unequip(&mut self, modifiers: &mut CombatModifiers) -> Option<ActiveMask> {
        let previous = self.active.take()?;
        modifiers.revert(&previous.effects);
        Some(previous)
    }

    /// Секундный тик: remaining -= multiplier, затем multiplier += rate.
    /// `Expired` - владелец обязан вызвать `unequip`.
    pub fn drain_tick(&mut self, drain_increase_rate: f32) -> DrainOutcome {
        let Some(mask) = self.active.as_mut() else {
            return DrainOutcome::Idle;
        };

        mask.remaining_duration -= mask.drain_multiplier;
        mask.drain_multiplier += drain_increase_rate;

        if mask.remaining_duration <= 0.0 {
            mask.remaining_duration = 0.0;
            DrainOutcome::Expired
        } else {
            DrainOutcome::Draining
        }
    }

    /// Продлить маску (clamp к max_duration)
    pub fn extend(&mut self, bonus: f32, max_duration: f32) {
        if let Some(mask) = self.active.as_mut() {
            mask.remaining_duration = (mask.remaining_duration + bonus).min(max_duration);
        }
    }
}
