//! ActionStateMachine - оркестратор боевого состояния одного бойца.
//!
//! Чистая логика без Bevy систем: принимает `CombatIntent`, тикает таймеры,
//! складывает `CombatSignal` в outbox. ECS слой (combat::systems) только
//! доставляет intents, собирает снимок целей и публикует outbox как events.
//!
//! Правило прерываний: любой переход, прерывающий Attacking/Charging/ChargeMask,
//! идёт через `interrupt_actions` - он закрывает hit window, отменяет lunge,
//! чистит combo таймер и возвращает attack token.

use bevy::prelude::*;

use super::components::*;
use super::signals::{CombatIntent, CombatSignal, DamageSource};
use super::tokens::AttackTokenScheduler;
use crate::config::CombatConfig;
use crate::timers::{TimerMode, TimerSet};

/// |input.x| выше этого порога меняет FacingSide (≈ sin 5°)
const FACING_SIDE_THRESHOLD: f32 = 0.087;

/// Период drain тика маски (секунды)
const MASK_DRAIN_PERIOD: f32 = 1.0;

/// Имена таймеров бойца
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatTimer {
    ComboReset,
    Invincibility,
    HitStun,
    Grounded,
    HitCountReset,
    RollCooldown,
    MaskDrain,
    JumpDelay,
    StopJump,
}

/// Окружение одного вызова машины: кто мы, где мы, кого видим.
pub struct CombatContext<'a> {
    pub entity: Entity,
    pub position: Vec3,
    pub view_yaw: f32,
    /// Кандидаты для lunge (уже отфильтрованы по allegiance и живости)
    pub targets: &'a [TargetSnapshot],
    pub tokens: &'a mut AttackTokenScheduler,
}

impl<'a> CombatContext<'a> {
    pub fn new(entity: Entity, position: Vec3, tokens: &'a mut AttackTokenScheduler) -> Self {
        Self {
            entity,
            position,
            view_yaw: 0.0,
            targets: &[],
            tokens,
        }
    }

    pub fn with_view_yaw(mut self, view_yaw: f32) -> Self {
        self.view_yaw = view_yaw;
        self
    }

    pub fn with_targets(mut self, targets: &'a [TargetSnapshot]) -> Self {
        self.targets = targets;
        self
    }
}

#[derive(Component, Debug, Clone)]
pub struct ActionStateMachine {
    config: CombatConfig,
    allegiance: Allegiance,
    combatant: Combatant,
    timers: TimerSet<CombatTimer>,
    combo: ComboTracker,
    hits: HitRegistry,
    mask: MaskBuff,
    lunge: Option<LungeMotion>,
    movement_input: Vec2,
    /// Попал ли текущий удар хоть раз (для AttackCompleted)
    hit_landed: bool,
    input_enabled: bool,
    airborne: bool,
    /// Jump отпущен до того как прыжок стартовал (короткий hop)
    jump_stop_pending: bool,
    signals: Vec<CombatSignal>,
}

impl ActionStateMachine {
    pub fn new(config: CombatConfig, allegiance: Allegiance) -> Self {
        let combatant = Combatant::new(config.max_health);
        let combo = ComboTracker::new(config.max_combo_count as usize);
        Self {
            config,
            allegiance,
            combatant,
            timers: TimerSet::new(),
            combo,
            hits: HitRegistry::default(),
            mask: MaskBuff::default(),
            lunge: None,
            movement_input: Vec2::ZERO,
            hit_landed: false,
            input_enabled: true,
            airborne: false,
            jump_stop_pending: false,
            signals: Vec::new(),
        }
    }

    pub fn player(config: CombatConfig) -> Self {
        Self::new(config, Allegiance::Player)
    }

    pub fn hostile(config: CombatConfig) -> Self {
        Self::new(config, Allegiance::Hostile)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> ActionState {
        self.combatant.state
    }

    pub fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn allegiance(&self) -> Allegiance {
        self.allegiance
    }

    pub fn health(&self) -> f32 {
        self.combatant.health
    }

    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    pub fn is_invincible(&self) -> bool {
        self.combatant.is_invincible
    }

    pub fn combo_index(&self) -> usize {
        self.combo.index()
    }

    pub fn hit_window_open(&self) -> bool {
        self.hits.is_armed()
    }

    pub fn is_lunging(&self) -> bool {
        self.lunge.is_some()
    }

    pub fn mask(&self) -> &MaskBuff {
        &self.mask
    }

    pub fn modifiers(&self) -> &CombatModifiers {
        &self.combatant.modifiers
    }

    pub fn movement_input(&self) -> Vec2 {
        self.movement_input
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        if self.combatant.state != ActionState::Dead {
            self.input_enabled = enabled;
        }
    }

    pub fn is_timer_active(&self, timer: CombatTimer) -> bool {
        self.timers.is_active(timer)
    }

    pub fn timer_remaining(&self, timer: CombatTimer) -> Option<f32> {
        self.timers.remaining(timer)
    }

    /// Может ли locomotion двигать бойца прямо сейчас
    pub fn locomotion_enabled(&self) -> bool {
        self.input_enabled
            && self.lunge.is_none()
            && matches!(
                self.combatant.state,
                ActionState::None | ActionState::Attacking
            )
    }

    pub fn pending_signals(&self) -> &[CombatSignal] {
        &self.signals
    }

    /// Забрать накопленные сигналы (outbox очищается)
    pub fn drain_signals(&mut self) -> Vec<CombatSignal> {
        std::mem::take(&mut self.signals)
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Обработать входной сигнал. `false` = guarded no-op (ничего не изменилось).
    pub fn handle(&mut self, intent: CombatIntent, ctx: &mut CombatContext) -> bool {
        if self.combatant.state == ActionState::Dead {
            return false;
        }
        if intent.is_control_input() && !self.input_enabled {
            return false;
        }

        match intent {
            CombatIntent::AttackIntentStart => self.start_attack(ctx),
            CombatIntent::AttackIntentHold => self.start_charging(),
            CombatIntent::AttackIntentRelease => self.finish_charging(ctx),
            CombatIntent::RollIntent => self.start_roll(ctx),
            CombatIntent::MovementIntent(input) => {
                self.set_movement_input(input, ctx.view_yaw);
                true
            }
            CombatIntent::JumpIntentStart => self.start_jump(),
            CombatIntent::JumpIntentRelease => self.release_jump(),
            CombatIntent::MaskThrowIntentStart => self.start_mask_throw(),
            CombatIntent::MaskThrowIntentRelease => self.release_mask_throw(),
            CombatIntent::EquipMask(mask_type) => self.equip_mask(mask_type),
            CombatIntent::AttackAnimationFinished => self.finish_attack(ctx),
            CombatIntent::RollAnimationFinished => self.finish_roll(),
            CombatIntent::GetUpAnimationFinished => self.finish_get_up(),
            CombatIntent::Landed => self.on_landed(),
            CombatIntent::IncomingDamage { amount, source } => {
                self.receive_damage(amount, source, ctx) > 0.0
            }
        }
    }

    /// Один логический тик: charge, lunge, затем сработавшие таймеры (в порядке старта).
    pub fn tick(&mut self, dt: f32, ctx: &mut CombatContext) {
        if self.combatant.state == ActionState::Dead {
            return;
        }

        if self.combatant.state == ActionState::Charging {
            self.combatant.charge_elapsed += dt;
        }

        if let Some(motion) = self.lunge.as_mut() {
            if let Some(position) = motion.advance(dt) {
                self.signals.push(CombatSignal::LungeStep(position));
            }
        }

        for timer in self.timers.tick(dt) {
            self.on_timer(timer, ctx);
        }
    }

    // ------------------------------------------------------------------
    // Attack / charge
    // ------------------------------------------------------------------

    fn start_attack(&mut self, ctx: &mut CombatContext) -> bool {
        if self.combatant.state != ActionState::None {
            return false;
        }
        self.begin_attack(1.0, ctx)
    }

    fn start_charging(&mut self) -> bool {
        if self.combatant.state != ActionState::None {
            return false;
        }

        self.combatant.state = ActionState::Charging;
        self.combatant.charge_elapsed = 0.0;
        if self.timers.is_active(CombatTimer::ComboReset) {
            self.combo.keep_alive();
        }
        self.timers.pause(CombatTimer::ComboReset);

        self.signals.push(CombatSignal::MovementFrozen);
        self.signals.push(CombatSignal::ChargeStarted);
        true
    }

    /// Множитель урона charged удара: lerp(1, max, clamp(elapsed / max_time))
    pub fn charge_multiplier(&self) -> f32 {
        let ratio = if self.config.max_charge_time > 0.0 {
            (self.combatant.charge_elapsed / self.config.max_charge_time).clamp(0.0, 1.0)
        } else {
            1.0
        };
        1.0 + (self.config.max_charge_damage_multiplier - 1.0) * ratio
    }

    fn finish_charging(&mut self, ctx: &mut CombatContext) -> bool {
        if self.combatant.state != ActionState::Charging {
            return false;
        }

        let multiplier = self.charge_multiplier();
        self.end_charge();

        if !self.begin_attack(multiplier, ctx) {
            // Нет токена: окно комбо остаётся как было до charge
            self.timers.resume(CombatTimer::ComboReset);
        }
        true
    }

    fn end_charge(&mut self) {
        self.combatant.charge_elapsed = 0.0;
        self.combatant.state = ActionState::None;
        self.signals.push(CombatSignal::ChargeEnded);
        self.signals.push(CombatSignal::MovementUnfrozen);
    }

    /// None/Charging → Attacking. Hostile без токена остаётся в текущем состоянии.
    fn begin_attack(&mut self, damage_multiplier: f32, ctx: &mut CombatContext) -> bool {
        if self.allegiance == Allegiance::Hostile && !ctx.tokens.request_attack(ctx.entity) {
            return false;
        }

        self.combatant.damage_multiplier = damage_multiplier;
        self.attempt_lunge(ctx);

        let window_open = self.timers.is_active(CombatTimer::ComboReset);
        let combo_index = self.combo.advance(window_open);
        self.timers.cancel(CombatTimer::ComboReset);

        self.hits.arm();
        self.hit_landed = false;
        self.combatant.state = ActionState::Attacking;

        self.signals.push(CombatSignal::AttackStarted {
            combo_index,
            damage_multiplier,
        });
        self.signals.push(CombatSignal::HitWindowOpened);

        crate::logger::log(&format!(
            "⚔️ {:?} attack started (combo {}, x{:.2})",
            ctx.entity, combo_index, damage_multiplier
        ));
        true
    }

    fn finish_attack(&mut self, ctx: &mut CombatContext) -> bool {
        if self.combatant.state != ActionState::Attacking {
            return false;
        }

        self.close_hit_window();
        self.cancel_lunge();
        self.timers
            .start_once(CombatTimer::ComboReset, self.config.combo_window_time);
        ctx.tokens.release_token(ctx.entity);

        self.combatant.state = ActionState::None;
        self.combatant.damage_multiplier = 1.0;
        self.signals.push(CombatSignal::AttackCompleted {
            hit_landed: self.hit_landed,
            has_buff: self.mask.is_active(),
        });
        true
    }

    fn attempt_lunge(&mut self, ctx: &CombatContext) {
        self.cancel_lunge();

        let params = LungeParams {
            range: self.config.lunge_range,
            half_angle: self.config.lunge_half_angle,
            stop_distance: self.config.lunge_stop_distance,
            deadzone: self.config.lunge_deadzone,
            duration: self.config.lunge_duration,
            input_deadzone: self.config.roll_input_deadzone,
        };

        let plan = plan_lunge(
            ctx.position,
            self.movement_input,
            self.combatant.facing_side.sign(),
            ctx.view_yaw,
            ctx.entity,
            ctx.targets,
            &params,
        );

        match plan {
            LungePlan::NoTarget => {
                // Без цели - только поворот по input
                let aim = input_to_world(self.movement_input, ctx.view_yaw);
                if aim.length() > self.config.roll_input_deadzone {
                    self.face(aim);
                }
            }
            LungePlan::RotateOnly { face, .. } => self.face(face),
            LungePlan::Dash { face, target, motion } => {
                self.face(face);
                self.lunge = Some(motion);
                self.signals.push(CombatSignal::LocomotionSuspended);
                crate::logger::log(&format!("🎯 {:?} lunge → {:?}", ctx.entity, target));
            }
        }
    }

    fn cancel_lunge(&mut self) {
        if self.lunge.take().is_some() {
            self.signals.push(CombatSignal::LocomotionRestored);
        }
    }

    fn close_hit_window(&mut self) {
        if self.hits.is_armed() {
            self.hits.disarm();
            self.signals.push(CombatSignal::HitWindowClosed);
        }
    }

    fn face(&mut self, direction: Vec3) {
        let Some(direction) = flatten(direction).try_normalize() else {
            return;
        };
        self.combatant.facing_direction = direction;
        self.signals.push(CombatSignal::Facing(direction));
    }

    /// Прервать активное действие. Combo таймер и pending чистятся
    /// только если было что прерывать.
    fn interrupt_actions(&mut self, ctx: &mut CombatContext) {
        match self.combatant.state {
            ActionState::Attacking => {
                self.close_hit_window();
                self.cancel_lunge();
                ctx.tokens.release_token(ctx.entity);
                self.combatant.damage_multiplier = 1.0;
                self.signals.push(CombatSignal::AttackInterrupted);
            }
            ActionState::Charging => {
                self.combatant.charge_elapsed = 0.0;
                self.signals.push(CombatSignal::ChargeEnded);
                self.signals.push(CombatSignal::MovementUnfrozen);
            }
            ActionState::ChargeMask => {
                self.signals.push(CombatSignal::MovementUnfrozen);
            }
            _ => return,
        }

        self.timers.cancel(CombatTimer::ComboReset);
        self.combo.clear_pending();
        self.combatant.state = ActionState::None;
    }

    // ------------------------------------------------------------------
    // Hits dealt
    // ------------------------------------------------------------------

    /// Overlap hit volume с целью. Возвращает урон если цель новая в этом окне.
    pub fn register_hit(&mut self, target: Entity) -> Option<f32> {
        if self.combatant.state != ActionState::Attacking {
            return None;
        }
        if !self.hits.try_register(target) {
            return None;
        }
        Some(self.config.combo_damage(self.combo.index()) * self.combatant.damage_multiplier)
    }

    /// Цель реально получила `dealt` урона: lifesteal и продление маски.
    pub fn confirm_hit(&mut self, target: Entity, dealt: f32) {
        if dealt <= 0.0 {
            return;
        }

        self.hit_landed = true;
        self.signals.push(CombatSignal::HitDealt {
            target,
            damage: dealt,
        });

        let lifesteal = dealt * self.combatant.modifiers.lifesteal_fraction;
        if lifesteal > 0.0 {
            let healed = self.combatant.heal(lifesteal);
            if healed > 0.0 {
                self.signals.push(CombatSignal::Healed { amount: healed });
            }
        }

        let bonus = self.combatant.modifiers.extend_on_hit;
        if bonus > 0.0 {
            self.mask.extend(bonus, self.config.max_mask_duration);
        }
    }

    // ------------------------------------------------------------------
    // Damage taken
    // ------------------------------------------------------------------

    /// Damage resolution. Возвращает реально снятое здоровье (0 = отклонено).
    pub fn receive_damage(
        &mut self,
        amount: f32,
        source: DamageSource,
        ctx: &mut CombatContext,
    ) -> f32 {
        if self.combatant.state.rejects_damage() || self.combatant.is_invincible {
            return 0.0;
        }

        let reduction = self.combatant.modifiers.damage_reduction;
        let amount = if reduction > 0.0 {
            amount * (1.0 - reduction)
        } else {
            amount
        };
        // NaN/inf не проходят дальше: health всегда в [0, max_health]
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }

        let applied = self.combatant.take_damage(amount);
        self.signals.push(CombatSignal::DamageTaken {
            amount: applied,
            health: self.combatant.health,
        });

        if self.combatant.health <= 0.0 {
            self.die(ctx);
            return applied;
        }

        self.interrupt_actions(ctx);

        self.combatant.consecutive_hit_count += 1;
        self.timers
            .start_once(CombatTimer::HitCountReset, self.config.hit_count_reset_time);

        let push = flatten(ctx.position - source.position)
            .try_normalize()
            .unwrap_or(-self.combatant.facing_direction);

        if self.combatant.consecutive_hit_count >= self.config.hits_until_knockdown
            && !self.combatant.modifiers.knockdown_immune
        {
            self.knock_down(push);
        } else {
            self.hurt(push);
        }

        applied
    }

    fn hurt(&mut self, push: Vec3) {
        self.combatant.state = ActionState::Hurt;
        self.combatant.is_invincible = true;
        self.timers
            .start_once(CombatTimer::Invincibility, self.config.invincibility_duration);
        self.timers
            .start_once(CombatTimer::HitStun, self.config.hit_stun_duration);

        self.signals.push(CombatSignal::Hurt);
        self.signals
            .push(CombatSignal::Impulse(push * self.config.knockback_strength));
    }

    fn knock_down(&mut self, push: Vec3) {
        self.combatant.state = ActionState::KnockedDown;
        self.combatant.consecutive_hit_count = 0;
        self.timers.cancel(CombatTimer::HitCountReset);

        // Неуязвим всю последовательность KnockedDown → Grounded → GettingUp
        self.combatant.is_invincible = true;
        self.timers.cancel(CombatTimer::Invincibility);

        self.face(-push);
        self.airborne = true;

        let impulse = push * self.config.knockdown_push_strength
            + Vec3::Y * self.config.knockdown_vertical_impulse;
        self.signals.push(CombatSignal::Impulse(impulse));
        self.signals.push(CombatSignal::KnockedDown);
    }

    fn die(&mut self, ctx: &mut CombatContext) {
        self.interrupt_actions(ctx);
        ctx.tokens.release_token(ctx.entity);
        // Маска уходит вместе с бойцом, модификаторы возвращаются к базе
        self.unequip_mask();
        self.timers.cancel_all();
        self.close_hit_window();
        self.cancel_lunge();

        self.combatant.state = ActionState::Dead;
        self.combatant.health = 0.0;
        self.combatant.is_invincible = false;
        self.input_enabled = false;

        self.signals.push(CombatSignal::InputDisabled);
        self.signals.push(CombatSignal::Died);
        self.signals.push(CombatSignal::SlowMotionRequested {
            scale: self.config.death_slow_motion_scale,
            duration: self.config.death_slow_motion_duration,
        });

        crate::logger::log_info(&format!("💀 {:?} ({:?}) died", ctx.entity, self.allegiance));
    }

    // ------------------------------------------------------------------
    // Knockdown recovery
    // ------------------------------------------------------------------

    fn on_landed(&mut self) -> bool {
        if self.combatant.state == ActionState::KnockedDown {
            self.airborne = false;
            self.combatant.state = ActionState::Grounded;
            self.timers
                .start_once(CombatTimer::Grounded, self.config.grounded_time);
            return true;
        }

        if self.airborne {
            // Приземление после прыжка обнуляет комбо
            self.airborne = false;
            self.combo.reset();
            self.timers.cancel(CombatTimer::ComboReset);
            return true;
        }

        false
    }

    fn finish_get_up(&mut self) -> bool {
        if self.combatant.state != ActionState::GettingUp {
            return false;
        }
        self.combatant.state = ActionState::None;
        self.timers
            .start_once(CombatTimer::Invincibility, self.config.invincibility_duration);
        true
    }

    // ------------------------------------------------------------------
    // Roll
    // ------------------------------------------------------------------

    fn start_roll(&mut self, ctx: &mut CombatContext) -> bool {
        if self.combatant.state.blocks_roll() || self.timers.is_active(CombatTimer::RollCooldown)
        {
            return false;
        }

        self.interrupt_actions(ctx);

        let (_, right) = camera_basis(ctx.view_yaw);
        let direction = if self.movement_input.length() > self.config.roll_input_deadzone {
            input_to_world(self.movement_input, ctx.view_yaw)
                .try_normalize()
                .unwrap_or(right * self.combatant.facing_side.sign())
        } else {
            right * self.combatant.facing_side.sign()
        };

        self.face(direction);
        self.combatant.state = ActionState::Rolling;
        self.timers.start_once(
            CombatTimer::RollCooldown,
            self.config.roll_cooldown * self.combatant.modifiers.cooldown_multiplier,
        );

        self.signals.push(CombatSignal::RollStarted { direction });
        self.signals
            .push(CombatSignal::Impulse(direction * self.config.roll_speed));
        self.signals.push(CombatSignal::BrakingSuspended);
        true
    }

    fn finish_roll(&mut self) -> bool {
        if self.combatant.state != ActionState::Rolling {
            return false;
        }
        self.combatant.state = ActionState::None;
        self.signals.push(CombatSignal::BrakingRestored);
        true
    }

    // ------------------------------------------------------------------
    // Movement / jump
    // ------------------------------------------------------------------

    fn set_movement_input(&mut self, input: Vec2, view_yaw: f32) {
        self.movement_input = input;

        if self.combatant.state != ActionState::None {
            return;
        }
        if input.length() <= self.config.roll_input_deadzone {
            return;
        }

        let lateral = input.normalize().x;
        if lateral > FACING_SIDE_THRESHOLD {
            self.combatant.facing_side = FacingSide::Right;
        } else if lateral < -FACING_SIDE_THRESHOLD {
            self.combatant.facing_side = FacingSide::Left;
        }

        if let Some(direction) = input_to_world(input, view_yaw).try_normalize() {
            self.combatant.facing_direction = direction;
        }
    }

    fn start_jump(&mut self) -> bool {
        if self.combatant.state != ActionState::None
            || self.airborne
            || self.timers.is_active(CombatTimer::JumpDelay)
        {
            return false;
        }

        self.combo.reset();
        self.timers.cancel(CombatTimer::ComboReset);
        self.jump_stop_pending = false;

        if self.config.jump_delay_time > 0.0 {
            self.timers
                .start_once(CombatTimer::JumpDelay, self.config.jump_delay_time);
        } else {
            self.perform_jump();
        }
        true
    }

    fn release_jump(&mut self) -> bool {
        if self.timers.is_active(CombatTimer::JumpDelay) {
            // Отпустили до старта прыжка → короткий hop
            self.jump_stop_pending = true;
            return true;
        }
        if self.airborne {
            self.signals.push(CombatSignal::StopJump);
            return true;
        }
        false
    }

    fn perform_jump(&mut self) {
        if self.combatant.state != ActionState::None {
            self.jump_stop_pending = false;
            return;
        }

        self.airborne = true;
        self.signals.push(CombatSignal::Jump);

        if self.jump_stop_pending {
            self.jump_stop_pending = false;
            self.timers
                .start_once(CombatTimer::StopJump, self.config.stop_jump_delay);
        }
    }

    // ------------------------------------------------------------------
    // Mask
    // ------------------------------------------------------------------

    /// Надеть маску (предыдущая полностью снимается). Мёртвым - нельзя.
    pub fn equip_mask(&mut self, mask_type: MaskType) -> bool {
        if self.combatant.state == ActionState::Dead {
            return false;
        }

        let speed_before = self.combatant.modifiers.move_speed_multiplier;
        let previous = self.mask.equip(
            mask_type,
            mask_type.effects(&self.config),
            self.config.max_mask_duration,
            &mut self.combatant.modifiers,
        );
        self.timers
            .start(CombatTimer::MaskDrain, MASK_DRAIN_PERIOD, TimerMode::Repeating);

        self.signals.push(CombatSignal::MaskChanged(Some(mask_type)));
        self.publish_speed_change(speed_before);

        crate::logger::log(&format!(
            "🎭 Mask equipped: {:?} (replaced {:?})",
            mask_type, previous
        ));
        true
    }

    fn unequip_mask(&mut self) -> Option<ActiveMask> {
        let speed_before = self.combatant.modifiers.move_speed_multiplier;
        let removed = self.mask.unequip(&mut self.combatant.modifiers)?;
        self.timers.cancel(CombatTimer::MaskDrain);

        self.signals.push(CombatSignal::MaskChanged(None));
        self.publish_speed_change(speed_before);
        Some(removed)
    }

    fn publish_speed_change(&mut self, before: f32) {
        let after = self.combatant.modifiers.move_speed_multiplier;
        if (after - before).abs() > f32::EPSILON {
            self.signals.push(CombatSignal::MoveSpeedChanged(after));
        }
    }

    fn start_mask_throw(&mut self) -> bool {
        if self.combatant.state != ActionState::None || !self.mask.is_active() {
            return false;
        }
        self.combatant.state = ActionState::ChargeMask;
        self.signals.push(CombatSignal::MovementFrozen);
        true
    }

    fn release_mask_throw(&mut self) -> bool {
        if self.combatant.state != ActionState::ChargeMask {
            return false;
        }

        // Маска могла истечь во время замаха - тогда просто выходим
        if let Some(mask_type) = self.mask.mask_type() {
            self.signals.push(CombatSignal::MaskThrown {
                mask_type,
                damage: self.config.mask_throw_damage,
                velocity: self.combatant.facing_direction * self.config.mask_throw_speed,
            });
            self.unequip_mask();
        }

        self.combatant.state = ActionState::None;
        self.signals.push(CombatSignal::MovementUnfrozen);
        true
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn on_timer(&mut self, timer: CombatTimer, ctx: &mut CombatContext) {
        match timer {
            CombatTimer::ComboReset => self.combo.reset(),
            CombatTimer::Invincibility => {
                self.combatant.is_invincible = false;
                self.signals.push(CombatSignal::InvincibilityEnded);
            }
            CombatTimer::HitStun => {
                // Guard: knockdown/death/roll могли сменить состояние раньше
                if self.combatant.state == ActionState::Hurt {
                    self.combatant.state = ActionState::None;
                }
            }
            CombatTimer::Grounded => {
                if self.combatant.state == ActionState::Grounded {
                    self.combatant.state = ActionState::GettingUp;
                    self.signals.push(CombatSignal::GettingUp);
                }
            }
            CombatTimer::HitCountReset => self.combatant.consecutive_hit_count = 0,
            CombatTimer::RollCooldown => {}
            CombatTimer::MaskDrain => {
                if self.mask.drain_tick(self.config.drain_increase_rate) == DrainOutcome::Expired {
                    crate::logger::log(&format!("🎭 {:?} mask expired", ctx.entity));
                    self.unequip_mask();
                }
            }
            CombatTimer::JumpDelay => self.perform_jump(),
            CombatTimer::StopJump => self.signals.push(CombatSignal::StopJump),
        }
    }

    // ------------------------------------------------------------------
    // Reset (hostile respawn / pooling)
    // ------------------------------------------------------------------

    /// Полный сброс бойца в начальное состояние. Токен возвращается всегда.
    pub fn force_reset(&mut self, ctx: &mut CombatContext) {
        self.interrupt_actions(ctx);
        ctx.tokens.release_token(ctx.entity);
        self.unequip_mask();
        self.timers.cancel_all();
        self.close_hit_window();
        self.cancel_lunge();

        let facing_direction = self.combatant.facing_direction;
        let facing_side = self.combatant.facing_side;
        self.combatant = Combatant::new(self.config.max_health);
        self.combatant.facing_direction = facing_direction;
        self.combatant.facing_side = facing_side;

        self.combo.reset();
        self.movement_input = Vec2::ZERO;
        self.hit_landed = false;
        self.input_enabled = true;
        self.airborne = false;
        self.jump_stop_pending = false;
    }
}
