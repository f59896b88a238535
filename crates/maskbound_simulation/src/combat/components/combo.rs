//! Combo tracking and per-swing hit registry.

use bevy::prelude::*;

// ============================================================================
// Combo Tracker
// ============================================================================

/// Индекс текущего удара в комбо-цепочке.
///
/// Окно комбо (таймер) живёт в TimerSet владельца - трекер только
/// получает "окно открыто?" в момент атаки. `pending` переживает charge:
/// charge ставит таймер на паузу, но факт открытого окна надо сохранить.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboTracker {
    index: usize,
    max_combo_count: usize,
    pending: bool,
}

impl ComboTracker {
    pub fn new(max_combo_count: usize) -> Self {
        Self {
            index: 0,
            max_combo_count: max_combo_count.max(1),
            pending: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Запомнить что окно было открыто (перед паузой таймера)
    pub fn keep_alive(&mut self) {
        self.pending = true;
    }

    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    /// Новый удар: +1 (с wrap на max_combo_count) если окно открыто или pending,
    /// иначе цепочка начинается заново с 0.
    pub fn advance(&mut self, window_open: bool) -> usize {
        if window_open || self.pending {
            self.index = (self.index + 1) % self.max_combo_count;
        } else {
            self.index = 0;
        }
        self.pending = false;
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.pending = false;
    }
}

// ============================================================================
// Hit Registry
// ============================================================================

/// Кого уже ударили текущим hit window.
///
/// Очищается ровно один раз при открытии окна (`arm`). Пока окно открыто,
/// каждая цель может получить урон только один раз - сколько бы overlap
/// тиков ни пришло.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitRegistry {
    struck: Vec<Entity>,
    armed: bool,
}

impl HitRegistry {
    /// Открыть окно: очистить список, разрешить регистрацию
    pub fn arm(&mut self) {
        self.struck.clear();
        self.armed = true;
    }

    /// Закрыть окно. Список не очищаем - следующий `arm` всё равно очистит.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// true = цель новая, урон можно применять
    pub fn try_register(&mut self, target: Entity) -> bool {
        if !self.armed || self.struck.contains(&target) {
            return false;
        }
        self.struck.push(target);
        true
    }

    pub fn contains(&self, target: Entity) -> bool {
        self.struck.contains(&target)
    }

    pub fn struck_count(&self) -> usize {
        self.struck.len()
    }
}
