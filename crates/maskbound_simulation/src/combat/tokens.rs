//! Attack tokens - сколько hostile могут атаковать одновременно.
//!
//! Hostile AI обязан получить токен ДО входа в Attacking и вернуть его
//! при любом выходе из Attacking (finish, interrupt, death, reset).

use bevy::prelude::*;

/// Общий на всю сцену планировщик атак (Resource).
///
/// Инвариант: после любой последовательности request/release число
/// держателей ≤ max_tokens (кроме случая уменьшения capacity, см. `set_max_tokens`).
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct AttackTokenScheduler {
    max_tokens: usize,
    /// Порядок выдачи сохраняется (детерминизм логов/тестов)
    holders: Vec<Entity>,
}

impl Default for AttackTokenScheduler {
    fn default() -> Self {
        Self::new(2)
    }
}

impl AttackTokenScheduler {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            holders: Vec::new(),
        }
    }

    /// Запрос токена. Повторный запрос от держателя - сразу `true`
    /// (без второго слота). Отказ при заполненной capacity - не ошибка.
    pub fn request_attack(&mut self, requester: Entity) -> bool {
        if self.holders.contains(&requester) {
            return true;
        }
        if self.holders.len() >= self.max_tokens {
            return false;
        }
        self.holders.push(requester);
        crate::logger::log(&format!(
            "🎟️ Attack token granted to {:?} ({}/{})",
            requester,
            self.holders.len(),
            self.max_tokens
        ));
        true
    }

    /// Вернуть токен. No-op если `holder` токен не держит.
    pub fn release_token(&mut self, holder: Entity) {
        let before = self.holders.len();
        self.holders.retain(|entity| *entity != holder);
        if self.holders.len() != before {
            crate::logger::log(&format!(
                "🎟️ Attack token released by {:?} ({}/{})",
                holder,
                self.holders.len(),
                self.max_tokens
            ));
        }
    }

    /// Новая capacity. Текущие держатели не выселяются - лишние
    /// токены просто не выдаются повторно после release.
    pub fn set_max_tokens(&mut self, max_tokens: usize) {
        self.max_tokens = max_tokens;
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn has_token(&self, entity: Entity) -> bool {
        self.holders.contains(&entity)
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn holders(&self) -> &[Entity] {
        &self.holders
    }

    pub fn available(&self) -> usize {
        self.max_tokens.saturating_sub(self.holders.len())
    }

    pub fn clear(&mut self) {
        self.holders.clear();
    }
}
