//! TimerSet - именованные таймеры без callback'ов
//!
//! Вместо "fire and forget" handle'ов: владелец стартует/отменяет таймеры по имени,
//! а `tick(dt)` возвращает список сработавших имён. Владелец обрабатывает их
//! сам, синхронно, один раз за тик - никаких re-entrant вызовов посреди update.
//!
//! Инварианты:
//! - один активный экземпляр на имя (`start` всегда заменяет старый)
//! - порядок срабатывания = порядок старта (детерминизм)


/// Допуск срабатывания: накопленная ошибка f32 при `remaining -= dt`
/// на фиксированном шаге (600 × 1/60 != 10.0 ровно)
pub const FIRE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Once,
    Repeating,
}

#[derive(Debug, Clone)]
struct NamedTimer<K> {
    key: K,
    duration: f32,
    remaining: f32,
    mode: TimerMode,
    paused: bool,
}

#[derive(Debug, Clone)]
pub struct TimerSet<K> {
    timers: Vec<NamedTimer<K>>,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        Self { timers: Vec::new() }
    }
}

impl<K: Copy + PartialEq> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Старт таймера. Существующий таймер с тем же именем сначала удаляется.
    pub fn start(&mut self, key: K, duration: f32, mode: TimerMode) {
        self.cancel(key);
        self.timers.push(NamedTimer {
            key,
            duration: duration.max(0.0),
            remaining: duration.max(0.0),
            mode,
            paused: false,
        });
    }

    pub fn start_once(&mut self, key: K, duration: f32) {
        self.start(key, duration, TimerMode::Once);
    }

    /// Отмена. No-op если таймера нет.
    pub fn cancel(&mut self, key: K) {
        self.timers.retain(|timer| timer.key != key);
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Активен = запущен и не истёк (пауза считается активным)
    pub fn is_active(&self, key: K) -> bool {
        self.timers.iter().any(|timer| timer.key == key)
    }

    pub fn is_paused(&self, key: K) -> bool {
        self.timers
            .iter()
            .any(|timer| timer.key == key && timer.paused)
    }

    pub fn pause(&mut self, key: K) {
        if let Some(timer) = self.timers.iter_mut().find(|timer| timer.key == key) {
            timer.paused = true;
        }
    }

    pub fn resume(&mut self, key: K) {
        if let Some(timer) = self.timers.iter_mut().find(|timer| timer.key == key) {
            timer.paused = false;
        }
    }

    pub fn remaining(&self, key: K) -> Option<f32> {
        self.timers
            .iter()
            .find(|timer| timer.key == key)
            .map(|timer| timer.remaining)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Продвигает все таймеры на `dt`, возвращает сработавшие имена.
    ///
    /// Once-таймеры удаляются при срабатывании. Repeating при большом `dt`
    /// может сработать несколько раз (имя повторяется в результате).
    pub fn tick(&mut self, dt: f32) -> Vec<K> {
        let mut fired = Vec::new();

        for timer in self.timers.iter_mut().filter(|timer| !timer.paused) {
            timer.remaining -= dt;

            match timer.mode {
                TimerMode::Once => {
                    if timer.remaining <= FIRE_EPSILON {
                        fired.push(timer.key);
                    }
                }
                TimerMode::Repeating => {
                    if timer.duration <= 0.0 {
                        // Нулевой период: одно срабатывание за тик, иначе бесконечный цикл
                        fired.push(timer.key);
                        timer.remaining = 0.0;
                        continue;
                    }
                    while timer.remaining <= FIRE_EPSILON {
                        fired.push(timer.key);
                        timer.remaining += timer.duration;
                    }
                }
            }
        }

        self.timers
            .retain(|timer| {
                timer.mode == TimerMode::Repeating || timer.paused || timer.remaining > FIRE_EPSILON
            });

        fired
    }
}
