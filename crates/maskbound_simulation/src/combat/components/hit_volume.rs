//! Melee hit volume: arc/cone перед бойцом + per-tick overlap отчёты.

use bevy::prelude::*;

use super::lunge::flatten;
use crate::config::CombatConfig;

/// Melee hit volume бойца (socket на оружии/руке).
///
/// Нет компонента = нет сокета: overlaps этого атакующего пропускаются,
/// остальная логика бойца не затрагивается.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HitVolume {
    pub range: f32,
    /// Половина угла дуги (градусы)
    pub half_angle_deg: f32,
}

impl Default for HitVolume {
    fn default() -> Self {
        Self::from_config(&CombatConfig::default())
    }
}

impl HitVolume {
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            range: config.hit_volume_range,
            half_angle_deg: config.hit_volume_half_angle_deg,
        }
    }

    /// Точка внутри дуги перед `origin` (по `facing`)?
    pub fn contains(&self, origin: Vec3, facing: Vec3, point: Vec3) -> bool {
        let offset = flatten(point - origin);
        let distance = offset.length();
        if distance > self.range {
            return false;
        }
        // Вплотную - всегда попадание
        if distance < 0.1 {
            return true;
        }

        let Some(facing) = flatten(facing).try_normalize() else {
            return false;
        };
        let cos_half = self.half_angle_deg.to_radians().cos();
        offset.normalize().dot(facing) >= cos_half
    }
}

/// Overlaps за текущий тик: (attacker, target).
///
/// Заполняется физикой/движком снаружи или, при `proximity_fallback`,
/// геометрией из Transform. Очищается при разрешении хитов в том же тике.
#[derive(Resource, Debug, Clone)]
pub struct HitVolumeOverlaps {
    overlaps: Vec<(Entity, Entity)>,
    pub proximity_fallback: bool,
}

impl Default for HitVolumeOverlaps {
    fn default() -> Self {
        Self {
            overlaps: Vec::new(),
            proximity_fallback: true,
        }
    }
}

impl HitVolumeOverlaps {
    /// External overlap source only (no proximity fallback)
    pub fn external() -> Self {
        Self {
            overlaps: Vec::new(),
            proximity_fallback: false,
        }
    }

    pub fn report(&mut self, attacker: Entity, target: Entity) {
        if !self.overlaps.contains(&(attacker, target)) {
            self.overlaps.push((attacker, target));
        }
    }

    pub fn drain(&mut self) -> Vec<(Entity, Entity)> {
        std::mem::take(&mut self.overlaps)
    }

    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }
}
