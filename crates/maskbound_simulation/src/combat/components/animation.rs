//! Animation timing - headless замена анимационного слоя.
//!
//! В игре "attack/roll/get-up finished" приходят от анимаций. Без них
//! эти сигналы генерируются по фиксированным длительностям клипов.

use bevy::prelude::*;

use crate::timers::TimerSet;

/// Какой клип закончился
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationCue {
    Attack,
    Roll,
    GetUp,
}

#[derive(Component, Debug, Clone)]
pub struct AnimationTimings {
    pub attack_duration: f32,
    pub roll_duration: f32,
    pub get_up_duration: f32,
    pub(crate) playing: TimerSet<AnimationCue>,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            attack_duration: 0.4,
            roll_duration: 0.5,
            get_up_duration: 0.6,
            playing: TimerSet::new(),
        }
    }
}

impl AnimationTimings {
    pub fn play(&mut self, cue: AnimationCue) {
        let duration = match cue {
            AnimationCue::Attack => self.attack_duration,
            AnimationCue::Roll => self.roll_duration,
            AnimationCue::GetUp => self.get_up_duration,
        };
        self.playing.start_once(cue, duration);
    }

    /// Прерванный клип не должен прислать "finished"
    pub fn stop(&mut self, cue: AnimationCue) {
        self.playing.cancel(cue);
    }

    pub fn stop_all(&mut self) {
        self.playing.cancel_all();
    }

    pub fn is_playing(&self, cue: AnimationCue) -> bool {
        self.playing.is_active(cue)
    }

    pub fn advance(&mut self, dt: f32) -> Vec<AnimationCue> {
        self.playing.tick(dt)
    }
}
