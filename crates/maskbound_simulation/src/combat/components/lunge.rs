//! Lunge (melee aim assist) - выбор цели и короткий рывок к ней.
//!
//! Вся геометрия на плоскости XZ (Y вверх). Направления считаются
//! относительно камеры: `view_yaw` - поворот камеры вокруг Y.

use bevy::prelude::*;

/// Что известно о потенциальной цели в момент атаки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub position: Vec3,
}

/// Forward/right камеры на земле (yaw = 0 → смотрит в -Z)
pub fn camera_basis(view_yaw: f32) -> (Vec3, Vec3) {
    let (sin, cos) = view_yaw.sin_cos();
    let forward = Vec3::new(-sin, 0.0, -cos);
    let right = Vec3::new(cos, 0.0, -sin);
    (forward, right)
}

/// 2D input (x = вправо, y = вперёд) → мировое направление на земле.
/// Длина сохраняется (для deadzone проверок).
pub fn input_to_world(input: Vec2, view_yaw: f32) -> Vec3 {
    let (forward, right) = camera_basis(view_yaw);
    right * input.x + forward * input.y
}

/// Проекция на землю
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Направление поиска цели: input если он вне deadzone, иначе
/// в сторону последнего facing (вдоль right камеры).
pub fn search_direction(input: Vec2, facing_sign: f32, view_yaw: f32, deadzone: f32) -> Vec3 {
    if input.length() > deadzone {
        input_to_world(input, view_yaw).normalize_or_zero()
    } else {
        let (_, right) = camera_basis(view_yaw);
        right * facing_sign
    }
}

/// Ближайшая цель внутри конуса `half_angle` вокруг `direction` и в пределах `range`.
///
/// Строгое неравенство по углу: цель ровно на границе конуса не выбирается.
pub fn select_lunge_target(
    origin: Vec3,
    direction: Vec3,
    candidates: &[TargetSnapshot],
    exclude: Entity,
    range: f32,
    half_angle: f32,
) -> Option<TargetSnapshot> {
    let direction = flatten(direction).normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let min_dot = half_angle.cos();
    let range_sq = range * range;

    candidates
        .iter()
        .filter(|candidate| candidate.entity != exclude)
        .filter_map(|candidate| {
            let offset = flatten(candidate.position - origin);
            let distance_sq = offset.length_squared();
            if distance_sq > range_sq {
                return None;
            }
            // Цель в той же точке - направление не определено, считаем попаданием в конус
            let in_cone = distance_sq <= f32::EPSILON
                || offset.normalize().dot(direction) > min_dot;
            in_cone.then_some((*candidate, distance_sq))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

/// Точка остановки сбоку от цели вдоль right камеры - на той стороне,
/// где атакующий уже стоит.
pub fn lunge_stop_point(origin: Vec3, target: Vec3, view_yaw: f32, stop_distance: f32) -> Vec3 {
    let (_, right) = camera_basis(view_yaw);
    let side = if flatten(origin - target).dot(right) < 0.0 {
        -1.0
    } else {
        1.0
    };
    let stop = target + right * side * stop_distance;
    Vec3::new(stop.x, origin.y, stop.z)
}

/// Интерполяция позиции рывка (smoothstep по времени)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LungeMotion {
    pub from: Vec3,
    pub to: Vec3,
    pub duration: f32,
    pub elapsed: f32,
    finished: bool,
}

impl LungeMotion {
    pub fn new(from: Vec3, to: Vec3, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Следующая позиция. `None` после того как конечная точка уже выдана.
    pub fn advance(&mut self, dt: f32) -> Option<Vec3> {
        if self.finished {
            return None;
        }

        self.elapsed += dt;
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };

        if t >= 1.0 {
            self.finished = true;
            return Some(self.to);
        }

        let eased = t * t * (3.0 - 2.0 * t);
        Some(self.from.lerp(self.to, eased))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Решение aim assist для одного удара
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LungePlan {
    /// Целей нет - бьём туда куда смотрим
    NoTarget,
    /// Цель уже рядом: только поворот
    RotateOnly { face: Vec3, target: Entity },
    /// Рывок к точке остановки
    Dash {
        face: Vec3,
        target: Entity,
        motion: LungeMotion,
    },
}

/// Параметры одного вызова `plan_lunge`
#[derive(Debug, Clone, Copy)]
pub struct LungeParams {
    pub range: f32,
    pub half_angle: f32,
    pub stop_distance: f32,
    pub deadzone: f32,
    pub duration: f32,
    pub input_deadzone: f32,
}

pub fn plan_lunge(
    origin: Vec3,
    input: Vec2,
    facing_sign: f32,
    view_yaw: f32,
    self_entity: Entity,
    candidates: &[TargetSnapshot],
    params: &LungeParams,
) -> LungePlan {
    let direction = search_direction(input, facing_sign, view_yaw, params.input_deadzone);
    let Some(target) = select_lunge_target(
        origin,
        direction,
        candidates,
        self_entity,
        params.range,
        params.half_angle,
    ) else {
        return LungePlan::NoTarget;
    };

    let face = flatten(target.position - origin)
        .try_normalize()
        .unwrap_or(direction);
    let stop = lunge_stop_point(origin, target.position, view_yaw, params.stop_distance);

    if flatten(stop - origin).length() <= params.deadzone {
        LungePlan::RotateOnly {
            face,
            target: target.entity,
        }
    } else {
        LungePlan::Dash {
            face,
            target: target.entity,
            motion: LungeMotion::new(origin, stop, params.duration),
        }
    }
}
