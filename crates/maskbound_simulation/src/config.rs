//! Combat configuration (designer-tunable numbers)
//!
//! Один `CombatConfig` на сессию как Resource (defaults для спавна),
//! плюс копия внутри каждого `ActionStateMachine` - hostile можно тюнить отдельно.
//! Единицы: метры, секунды, радианы (кроме `hit_volume_half_angle_deg`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки конфигурации.
///
/// Gameplay отказы (атака во время roll, RequestAttack сверх capacity) - НЕ ошибки,
/// это guarded no-ops. Сюда попадают только битые/невалидные настройки.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("`{field}` must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must be at least 1")]
    ZeroCount { field: &'static str },

    #[error("`{field}` = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error("failed to parse combat config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize combat config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to read combat config: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // --- Health / damage reaction ---
    pub max_health: f32,
    pub invincibility_duration: f32,
    pub hit_stun_duration: f32,
    pub knockback_strength: f32,
    pub hits_until_knockdown: u32,
    pub knockdown_push_strength: f32,
    /// Вертикальный импульс при knockdown (гарантирует последующий Landed)
    pub knockdown_vertical_impulse: f32,
    pub grounded_time: f32,
    pub hit_count_reset_time: f32,

    // --- Combo ---
    pub combo_window_time: f32,
    pub max_combo_count: u32,
    pub combo_damage_values: Vec<f32>,
    /// Урон если combo_index вышел за пределы combo_damage_values
    pub default_combo_damage: f32,

    // --- Lunge (aim assist) ---
    pub lunge_range: f32,
    /// Половина угла конуса поиска (радианы)
    pub lunge_half_angle: f32,
    pub lunge_stop_distance: f32,
    pub lunge_deadzone: f32,
    pub lunge_duration: f32,

    // --- Charge attack ---
    pub max_charge_time: f32,
    pub max_charge_damage_multiplier: f32,

    // --- Jump / roll ---
    pub jump_delay_time: f32,
    pub stop_jump_delay: f32,
    pub roll_speed: f32,
    pub roll_cooldown: f32,
    pub roll_input_deadzone: f32,

    // --- Mask (buff) ---
    pub max_mask_duration: f32,
    pub drain_increase_rate: f32,
    pub mask_lifesteal_fraction: f32,
    pub mask_extend_on_hit: f32,
    pub mask_damage_reduction: f32,
    pub mask_cooldown_multiplier: f32,
    pub mask_move_speed_multiplier: f32,
    pub mask_throw_damage: f32,
    pub mask_throw_speed: f32,

    // --- Melee hit volume (proximity fallback) ---
    pub hit_volume_range: f32,
    pub hit_volume_half_angle_deg: f32,

    // --- Attack tokens ---
    pub max_tokens: usize,

    // --- Death ---
    pub death_slow_motion_scale: f32,
    pub death_slow_motion_duration: f32,
    pub corpse_lifetime: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            invincibility_duration: 0.5,
            hit_stun_duration: 0.4,
            knockback_strength: 4.0,
            hits_until_knockdown: 3,
            knockdown_push_strength: 9.0,
            knockdown_vertical_impulse: 6.0,
            grounded_time: 1.0,
            hit_count_reset_time: 2.0,

            combo_window_time: 0.6,
            max_combo_count: 3,
            combo_damage_values: vec![10.0, 12.0, 18.0],
            default_combo_damage: 10.0,

            lunge_range: 3.0,
            lunge_half_angle: std::f32::consts::FRAC_PI_4,
            lunge_stop_distance: 0.9,
            lunge_deadzone: 0.1,
            lunge_duration: 0.12,

            max_charge_time: 1.0,
            max_charge_damage_multiplier: 2.0,

            jump_delay_time: 0.1,
            stop_jump_delay: 0.1,
            roll_speed: 12.0,
            roll_cooldown: 0.8,
            roll_input_deadzone: 0.1,

            max_mask_duration: 30.0,
            drain_increase_rate: 0.05,
            mask_lifesteal_fraction: 0.25,
            mask_extend_on_hit: 1.5,
            mask_damage_reduction: 0.4,
            mask_cooldown_multiplier: 0.5,
            mask_move_speed_multiplier: 1.3,
            mask_throw_damage: 30.0,
            mask_throw_speed: 15.0,

            hit_volume_range: 1.6,
            hit_volume_half_angle_deg: 70.0,

            max_tokens: 2,

            death_slow_motion_scale: 0.25,
            death_slow_motion_duration: 1.0,
            corpse_lifetime: 3.0,
        }
    }
}

impl CombatConfig {
    /// Урон удара по индексу комбо (fallback на default_combo_damage)
    pub fn combo_damage(&self, combo_index: usize) -> f32 {
        self.combo_damage_values
            .get(combo_index)
            .copied()
            .unwrap_or(self.default_combo_damage)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_health", self.max_health)?;
        positive("max_charge_time", self.max_charge_time)?;
        positive("max_mask_duration", self.max_mask_duration)?;

        if self.max_combo_count == 0 {
            return Err(ConfigError::ZeroCount { field: "max_combo_count" });
        }
        if self.hits_until_knockdown == 0 {
            return Err(ConfigError::ZeroCount { field: "hits_until_knockdown" });
        }

        for (field, value) in [
            ("invincibility_duration", self.invincibility_duration),
            ("hit_stun_duration", self.hit_stun_duration),
            ("grounded_time", self.grounded_time),
            ("hit_count_reset_time", self.hit_count_reset_time),
            ("combo_window_time", self.combo_window_time),
            ("lunge_range", self.lunge_range),
            ("lunge_stop_distance", self.lunge_stop_distance),
            ("lunge_deadzone", self.lunge_deadzone),
            ("lunge_duration", self.lunge_duration),
            ("jump_delay_time", self.jump_delay_time),
            ("stop_jump_delay", self.stop_jump_delay),
            ("roll_cooldown", self.roll_cooldown),
            ("drain_increase_rate", self.drain_increase_rate),
            ("mask_extend_on_hit", self.mask_extend_on_hit),
            ("death_slow_motion_duration", self.death_slow_motion_duration),
            ("corpse_lifetime", self.corpse_lifetime),
        ] {
            non_negative(field, value)?;
        }

        if self.lunge_half_angle <= 0.0 || self.lunge_half_angle > std::f32::consts::PI {
            return Err(ConfigError::OutOfRange {
                field: "lunge_half_angle",
                value: self.lunge_half_angle,
                range: "(0, PI]",
            });
        }
        if self.max_charge_damage_multiplier < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "max_charge_damage_multiplier",
                value: self.max_charge_damage_multiplier,
                range: "[1, inf)",
            });
        }
        if !(0.0..=1.0).contains(&self.mask_damage_reduction) {
            return Err(ConfigError::OutOfRange {
                field: "mask_damage_reduction",
                value: self.mask_damage_reduction,
                range: "[0, 1]",
            });
        }
        if self.death_slow_motion_scale <= 0.0 || self.death_slow_motion_scale > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "death_slow_motion_scale",
                value: self.death_slow_motion_scale,
                range: "(0, 1]",
            });
        }

        Ok(())
    }

    /// Парсит RON и сразу валидирует (отсутствующие поля берутся из Default)
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
