//! Death aftermath: глобальный slow-motion и деспавн трупов.

use bevy::prelude::*;

/// Компонент-маркер: деспавн entity после указанного времени
///
/// Вешается на мёртвых hostile. Время - в секундах симуляции (Time<Fixed>).
#[derive(Component, Debug)]
pub struct DespawnAfter {
    /// Время деспавна (в секундах от старта игры)
    pub despawn_time: f32,
}

/// Глобальный slow-motion (замедление Time<Virtual>).
///
/// Длительность считается в реальном времени - иначе замедленное время
/// растягивало бы само себя.
#[derive(Resource, Debug, Default)]
pub struct SlowMotion {
    pub remaining: f32,
    pub scale: f32,
    pub active: bool,
    requested: Option<(f32, f32)>,
}

impl SlowMotion {
    /// Запрос из FixedUpdate; применяется в Update (`tick_slow_motion`)
    pub fn request(&mut self, scale: f32, duration: f32) {
        self.requested = Some((scale, duration));
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Система (Update): применение/откат slow-motion по реальному времени
pub fn tick_slow_motion(
    real_time: Res<Time<Real>>,
    mut slow_motion: ResMut<SlowMotion>,
    mut time: ResMut<Time<Virtual>>,
) {
    if let Some((scale, duration)) = slow_motion.requested.take() {
        // Повторный запрос продлевает, не укорачивает
        slow_motion.remaining = slow_motion.remaining.max(duration);
        slow_motion.scale = scale;
        slow_motion.active = true;
        time.set_relative_speed(scale);
        crate::logger::log(&format!("🐌 Slow motion x{:.2} for {:.2}s", scale, duration));
        return;
    }

    if !slow_motion.active {
        return;
    }

    slow_motion.remaining -= real_time.delta_secs();

    if slow_motion.remaining <= 0.0 {
        slow_motion.active = false;
        slow_motion.remaining = 0.0;
        time.set_relative_speed(1.0);
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter timeout
pub fn despawn_after_timeout(
    mut commands: Commands,
    query: Query<(Entity, &DespawnAfter)>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            crate::logger::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).despawn();
        }
    }
}
