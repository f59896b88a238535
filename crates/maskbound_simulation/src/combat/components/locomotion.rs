//! Locomotion state - headless замена физики/контроллера движения.
//!
//! Машина состояний не двигает бойца сама: она публикует Impulse,
//! MovementFrozen, LocomotionSuspended и т.д., а `Locomotion` их исполняет.

use bevy::prelude::*;

use super::lunge::flatten;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Locomotion {
    /// Скорость ходьбы при input длины 1 (м/с)
    pub base_speed: f32,
    pub speed_multiplier: f32,
    /// Горизонтальная скорость от импульсов (roll, knockback)
    pub velocity: Vec3,
    pub vertical_velocity: f32,
    /// Замедление импульса (м/с²) пока braking включён
    pub braking_deceleration: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    /// Высота земли (Y) - приземление ниже неё не опускает
    pub ground_height: f32,
    pub frozen: bool,
    pub suspended: bool,
    pub braking: bool,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            base_speed: 4.0,
            speed_multiplier: 1.0,
            velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            braking_deceleration: 30.0,
            gravity: 20.0,
            jump_speed: 7.0,
            ground_height: 0.0,
            frozen: false,
            suspended: false,
            braking: true,
        }
    }
}

impl Locomotion {
    pub fn on_ground(ground_height: f32) -> Self {
        Self {
            ground_height,
            ..Default::default()
        }
    }

    /// Может ли input двигать бойца (без учёта состояния машины)
    pub fn accepts_input(&self) -> bool {
        !self.frozen && !self.suspended
    }

    /// Мгновенная скорость. Вертикальная составляющая - отдельно (прыжок/подброс).
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity = flatten(impulse);
        if impulse.y > 0.0 {
            self.vertical_velocity = impulse.y;
        }
    }

    pub fn jump(&mut self) {
        self.vertical_velocity = self.jump_speed;
    }

    /// Короткий hop: срезаем подъём
    pub fn cut_jump(&mut self) {
        if self.vertical_velocity > 0.0 {
            self.vertical_velocity *= 0.5;
        }
    }

    pub fn is_airborne(&self, height: f32) -> bool {
        height > self.ground_height || self.vertical_velocity > 0.0
    }

    /// Интегрирует горизонтальный импульс и вертикаль.
    /// Возвращает `true` в тик приземления.
    pub fn integrate(&mut self, translation: &mut Vec3, dt: f32) -> bool {
        *translation += self.velocity * dt;
        if self.braking {
            let speed = self.velocity.length();
            let reduced = (speed - self.braking_deceleration * dt).max(0.0);
            self.velocity = if speed > 0.0 {
                self.velocity * (reduced / speed)
            } else {
                Vec3::ZERO
            };
        }

        if !self.is_airborne(translation.y) {
            return false;
        }

        self.vertical_velocity -= self.gravity * dt;
        translation.y += self.vertical_velocity * dt;

        if translation.y <= self.ground_height && self.vertical_velocity <= 0.0 {
            translation.y = self.ground_height;
            self.vertical_velocity = 0.0;
            return true;
        }
        false
    }
}
