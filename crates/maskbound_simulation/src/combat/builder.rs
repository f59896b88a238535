//! Спавн бойцов: машина + Transform + headless collaborators.

use bevy::prelude::*;

use crate::ai::{AIConfig, AIState};
use crate::combat::components::{Allegiance, AnimationTimings, HitVolume, Locomotion, MaskType};
use crate::combat::state_machine::ActionStateMachine;
use crate::config::CombatConfig;

/// Минимальный набор компонентов бойца
#[derive(Bundle)]
pub struct CombatantBundle {
    pub machine: ActionStateMachine,
    pub transform: Transform,
    pub locomotion: Locomotion,
    pub animation: AnimationTimings,
}

/// Builder бойца.
///
/// Hostile по умолчанию получает AI мозг (`AIState` + `AIConfig`).
/// Без `HitVolume` боец не может никого ударить (нет сокета).
#[derive(Debug, Clone)]
pub struct CombatantBuilder {
    allegiance: Allegiance,
    config: CombatConfig,
    position: Vec3,
    hit_volume: Option<HitVolume>,
    mask: Option<MaskType>,
    with_brain: bool,
}

impl CombatantBuilder {
    pub fn player() -> Self {
        Self::new(Allegiance::Player)
    }

    pub fn hostile() -> Self {
        Self::new(Allegiance::Hostile)
    }

    fn new(allegiance: Allegiance) -> Self {
        let config = CombatConfig::default();
        Self {
            allegiance,
            hit_volume: Some(HitVolume::from_config(&config)),
            config,
            position: Vec3::ZERO,
            mask: None,
            with_brain: allegiance == Allegiance::Hostile,
        }
    }

    /// Конфиг бойца (hit volume пересчитывается из него)
    pub fn with_config(mut self, config: CombatConfig) -> Self {
        if self.hit_volume.is_some() {
            self.hit_volume = Some(HitVolume::from_config(&config));
        }
        self.config = config;
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_hit_volume(mut self, volume: HitVolume) -> Self {
        self.hit_volume = Some(volume);
        self
    }

    pub fn without_hit_volume(mut self) -> Self {
        self.hit_volume = None;
        self
    }

    /// Стартовая маска (экипируется сразу)
    pub fn with_mask(mut self, mask_type: MaskType) -> Self {
        self.mask = Some(mask_type);
        self
    }

    /// Hostile без AI (управление intents вручную - тесты, скрипты)
    pub fn without_brain(mut self) -> Self {
        self.with_brain = false;
        self
    }

    pub fn build_machine(&self) -> ActionStateMachine {
        let mut machine = ActionStateMachine::new(self.config.clone(), self.allegiance);
        if let Some(mask_type) = self.mask {
            machine.equip_mask(mask_type);
        }
        machine
    }

    pub fn bundle(&self) -> CombatantBundle {
        let machine = self.build_machine();
        let mut locomotion = Locomotion::default();
        locomotion.speed_multiplier = machine.modifiers().move_speed_multiplier;
        locomotion.ground_height = self.position.y;

        CombatantBundle {
            machine,
            transform: Transform::from_translation(self.position),
            locomotion,
            animation: AnimationTimings::default(),
        }
    }

    pub fn spawn(&self, commands: &mut Commands) -> Entity {
        let mut entity = commands.spawn(self.bundle());
        if let Some(volume) = self.hit_volume {
            entity.insert(volume);
        }
        if self.with_brain {
            entity.insert((AIState::default(), AIConfig::default()));
        }
        entity.id()
    }

    pub fn spawn_in_world(&self, world: &mut World) -> Entity {
        let mut entity = world.spawn(self.bundle());
        if let Some(volume) = self.hit_volume {
            entity.insert(volume);
        }
        if self.with_brain {
            entity.insert((AIState::default(), AIConfig::default()));
        }

        crate::logger::log(&format!(
            "🧍 Spawned {:?} combatant {:?} at {:?}",
            self.allegiance,
            entity.id(),
            self.position
        ));
        entity.id()
    }
}
