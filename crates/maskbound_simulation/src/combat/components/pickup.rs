//! Mask world objects: pickups and thrown masks.

use bevy::prelude::*;

use super::mask::MaskType;

/// Маска лежит в мире. Игрок в радиусе надевает её (pickup исчезает).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MaskPickup {
    pub mask_type: MaskType,
    pub radius: f32,
}

impl MaskPickup {
    pub fn new(mask_type: MaskType) -> Self {
        Self {
            mask_type,
            radius: 1.0,
        }
    }
}

/// Брошенная маска - отдельный снаряд, переживает снятие маски у бросившего.
#[derive(Component, Debug, Clone, Copy)]
pub struct ThrownMask {
    pub mask_type: MaskType,
    pub damage: f32,
    pub velocity: Vec3,
    pub owner: Entity,
    /// Радиус попадания по бойцам
    pub radius: f32,
    /// Секунды до исчезновения без попадания
    pub lifetime: f32,
}

impl ThrownMask {
    pub const DEFAULT_RADIUS: f32 = 0.6;
    pub const DEFAULT_LIFETIME: f32 = 2.0;
}
