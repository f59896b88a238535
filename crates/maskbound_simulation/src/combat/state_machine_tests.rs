//! Tests for ActionStateMachine transitions.

#[cfg(test)]
mod tests {
    use crate::combat::components::*;
    use crate::combat::signals::{CombatIntent, CombatSignal, DamageSource};
    use crate::combat::state_machine::{ActionStateMachine, CombatContext, CombatTimer};
    use crate::combat::tokens::AttackTokenScheduler;
    use crate::config::CombatConfig;
    use bevy::prelude::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Одна машина + её окружение
    struct Harness {
        machine: ActionStateMachine,
        tokens: AttackTokenScheduler,
        entity: Entity,
        position: Vec3,
        targets: Vec<TargetSnapshot>,
    }

    impl Harness {
        fn with_config(config: CombatConfig, allegiance: Allegiance) -> Self {
            let tokens = AttackTokenScheduler::new(config.max_tokens);
            Self {
                machine: ActionStateMachine::new(config, allegiance),
                tokens,
                entity: Entity::from_raw(1),
                position: Vec3::ZERO,
                targets: Vec::new(),
            }
        }

        fn player() -> Self {
            Self::with_config(CombatConfig::default(), Allegiance::Player)
        }

        fn hostile() -> Self {
            Self::with_config(CombatConfig::default(), Allegiance::Hostile)
        }

        fn send(&mut self, intent: CombatIntent) -> bool {
            let mut ctx = CombatContext::new(self.entity, self.position, &mut self.tokens)
                .with_targets(&self.targets);
            self.machine.handle(intent, &mut ctx)
        }

        fn tick(&mut self, dt: f32) {
            let mut ctx = CombatContext::new(self.entity, self.position, &mut self.tokens)
                .with_targets(&self.targets);
            self.machine.tick(dt, &mut ctx);
        }

        /// Удар с +X (knockback в -X)
        fn hit(&mut self, amount: f32) -> f32 {
            let source = DamageSource::from_entity(Entity::from_raw(50), self.position + Vec3::X);
            let mut ctx = CombatContext::new(self.entity, self.position, &mut self.tokens);
            self.machine.receive_damage(amount, source, &mut ctx)
        }

        fn force_reset(&mut self) {
            let mut ctx = CombatContext::new(self.entity, self.position, &mut self.tokens);
            self.machine.force_reset(&mut ctx);
        }

        fn signals(&mut self) -> Vec<CombatSignal> {
            self.machine.drain_signals()
        }

        /// Индекс последнего AttackStarted в outbox
        fn attack_index(&mut self) -> Option<usize> {
            self.signals().into_iter().rev().find_map(|signal| match signal {
                CombatSignal::AttackStarted { combo_index, .. } => Some(combo_index),
                _ => None,
            })
        }
    }

    // ========================================================================
    // Damage resolution
    // ========================================================================

    #[test]
    fn test_three_hits_knock_down_without_killing() {
        let mut h = Harness::player();

        assert_eq!(h.hit(30.0), 30.0);
        assert_eq!(h.machine.state(), ActionState::Hurt);
        assert_eq!(h.machine.health(), 70.0);

        // Stun и invincibility истекают, hit count - нет
        h.tick(0.5);
        assert_eq!(h.machine.state(), ActionState::None);
        assert!(!h.machine.is_invincible());

        h.hit(30.0);
        assert_eq!(h.machine.state(), ActionState::Hurt);
        assert_eq!(h.machine.health(), 40.0);
        assert_eq!(h.machine.combatant().consecutive_hit_count, 2);

        h.tick(0.5);
        h.hit(30.0);
        assert_eq!(h.machine.state(), ActionState::KnockedDown);
        assert_eq!(h.machine.health(), 10.0);
        assert_eq!(h.machine.combatant().consecutive_hit_count, 0);
        assert!(h.machine.is_invincible());
    }

    #[test]
    fn test_lethal_third_hit_kills_instead_of_knockdown() {
        let mut h = Harness::hostile();

        h.hit(40.0);
        h.tick(0.5);
        h.hit(40.0);
        h.tick(0.5);
        assert_eq!(h.machine.health(), 20.0);
        assert_eq!(h.machine.combatant().consecutive_hit_count, 2);

        // Третий удар держит токен в момент смерти
        assert!(h.send(CombatIntent::AttackIntentStart));
        assert!(h.tokens.has_token(h.entity));
        h.signals();

        assert_eq!(h.hit(40.0), 20.0);
        assert_eq!(h.machine.state(), ActionState::Dead);
        assert_eq!(h.machine.health(), 0.0);
        assert!(!h.tokens.has_token(h.entity));

        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::Died));
        assert!(!signals.contains(&CombatSignal::KnockedDown));
    }

    #[test]
    fn test_knockdown_pushes_away_and_faces_source() {
        let config = CombatConfig {
            hits_until_knockdown: 1,
            ..Default::default()
        };
        let mut h = Harness::with_config(config.clone(), Allegiance::Player);
        h.hit(10.0);

        let signals = h.signals();
        let expected_impulse =
            Vec3::NEG_X * config.knockdown_push_strength + Vec3::Y * config.knockdown_vertical_impulse;
        assert!(signals.iter().any(|s| matches!(s,
            CombatSignal::Impulse(v) if v.abs_diff_eq(expected_impulse, 1e-4))));
        assert!(signals.contains(&CombatSignal::KnockedDown));
        assert!(h.machine.combatant().facing_direction.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn test_hit_count_resets_after_quiet_period() {
        let mut h = Harness::player();
        h.hit(10.0);
        h.tick(0.5);
        h.hit(10.0);
        assert_eq!(h.machine.combatant().consecutive_hit_count, 2);

        h.tick(2.0);
        assert_eq!(h.machine.combatant().consecutive_hit_count, 0);

        h.hit(10.0);
        assert_eq!(h.machine.state(), ActionState::Hurt);
    }

    #[test]
    fn test_invincible_combatant_ignores_damage() {
        let mut h = Harness::player();
        h.hit(10.0);
        assert!(h.machine.is_invincible());

        assert_eq!(h.hit(10.0), 0.0);
        assert_eq!(h.machine.health(), 90.0);
    }

    #[test]
    fn test_zero_damage_is_rejected() {
        let mut h = Harness::player();
        assert_eq!(h.hit(0.0), 0.0);
        assert_eq!(h.machine.state(), ActionState::None);
        assert!(h.signals().is_empty());
    }

    #[test]
    fn test_non_finite_damage_is_rejected() {
        let mut h = Harness::player();

        for amount in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(h.hit(amount), 0.0, "{} must be rejected", amount);
            assert_eq!(h.machine.health(), 100.0);
            assert_eq!(h.machine.state(), ActionState::None);
        }
        assert_eq!(h.machine.combatant().consecutive_hit_count, 0);
        assert!(h.signals().is_empty());
    }

    #[test]
    fn test_stale_stun_does_not_override_knockdown() {
        let config = CombatConfig {
            invincibility_duration: 0.0,
            hit_stun_duration: 1.0,
            hits_until_knockdown: 2,
            ..Default::default()
        };
        let mut h = Harness::with_config(config, Allegiance::Player);

        h.hit(10.0);
        h.tick(0.25);
        assert_eq!(h.machine.state(), ActionState::Hurt);
        assert!(!h.machine.is_invincible());

        h.hit(10.0);
        assert_eq!(h.machine.state(), ActionState::KnockedDown);

        // Stun от первого удара срабатывает, но состояние уже другое
        h.tick(1.0);
        assert_eq!(h.machine.state(), ActionState::KnockedDown);
    }

    #[test]
    fn test_knockdown_recovery_sequence() {
        let mut h = Harness::player();
        for _ in 0..3 {
            h.hit(10.0);
            h.tick(0.5);
        }
        assert_eq!(h.machine.state(), ActionState::KnockedDown);

        // Вся последовательность неуязвима
        assert_eq!(h.hit(10.0), 0.0);

        assert!(h.send(CombatIntent::Landed));
        assert_eq!(h.machine.state(), ActionState::Grounded);
        assert_eq!(h.hit(10.0), 0.0);

        h.signals();
        h.tick(1.0);
        assert_eq!(h.machine.state(), ActionState::GettingUp);
        assert!(h.signals().contains(&CombatSignal::GettingUp));

        assert!(h.send(CombatIntent::GetUpAnimationFinished));
        assert_eq!(h.machine.state(), ActionState::None);
        assert!(h.machine.is_invincible());

        h.tick(0.5);
        assert!(!h.machine.is_invincible());
        assert!(h.signals().contains(&CombatSignal::InvincibilityEnded));
    }

    #[test]
    fn test_recovery_signals_ignored_out_of_order() {
        let mut h = Harness::player();
        assert!(!h.send(CombatIntent::GetUpAnimationFinished));
        assert!(!h.send(CombatIntent::Landed));
        assert_eq!(h.machine.state(), ActionState::None);
    }

    #[test]
    fn test_death_is_terminal() {
        let mut h = Harness::player();
        assert_eq!(h.hit(150.0), 100.0);

        assert_eq!(h.machine.state(), ActionState::Dead);
        assert_eq!(h.machine.health(), 0.0);
        assert!(!h.machine.input_enabled());

        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::Died));
        assert!(signals.contains(&CombatSignal::InputDisabled));
        assert!(signals.iter().any(|s| matches!(s, CombatSignal::SlowMotionRequested { .. })));

        for intent in [
            CombatIntent::AttackIntentStart,
            CombatIntent::RollIntent,
            CombatIntent::Landed,
            CombatIntent::GetUpAnimationFinished,
            CombatIntent::EquipMask(MaskType::Swift),
        ] {
            assert!(!h.send(intent), "{:?} must be ignored after death", intent);
        }
        assert_eq!(h.hit(10.0), 0.0);
        h.tick(5.0);
        assert_eq!(h.machine.state(), ActionState::Dead);
    }

    #[test]
    fn test_death_drops_mask_and_reverts_modifiers() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Swift));
        assert!(approx(h.machine.modifiers().cooldown_multiplier, 0.5));
        h.signals();

        h.hit(150.0);
        assert_eq!(h.machine.state(), ActionState::Dead);
        assert_eq!(h.machine.mask().mask_type(), None);
        assert!(!h.machine.is_timer_active(CombatTimer::MaskDrain));

        let modifiers = h.machine.modifiers();
        assert!(approx(modifiers.cooldown_multiplier, 1.0));
        assert!(approx(modifiers.move_speed_multiplier, 1.0));

        let signals = h.signals();
        let cleared = signals
            .iter()
            .position(|s| *s == CombatSignal::MaskChanged(None));
        let died = signals.iter().position(|s| *s == CombatSignal::Died);
        assert!(cleared.is_some() && died.is_some());
        assert!(cleared < died);
    }

    #[test]
    fn test_damage_interrupts_charge() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentHold);
        h.signals();

        h.hit(10.0);
        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::ChargeEnded));
        assert!(signals.contains(&CombatSignal::MovementUnfrozen));
        assert_eq!(h.machine.state(), ActionState::Hurt);
    }

    // ========================================================================
    // Attack / combo / charge
    // ========================================================================

    #[test]
    fn test_combo_cycles_within_window() {
        let mut h = Harness::player();

        let mut indices = Vec::new();
        for _ in 0..4 {
            assert!(h.send(CombatIntent::AttackIntentStart));
            indices.push(h.attack_index().expect("attack started"));
            assert!(h.send(CombatIntent::AttackAnimationFinished));
            h.tick(0.25);
        }

        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_combo_resets_after_window_expires() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentStart);
        h.send(CombatIntent::AttackAnimationFinished);
        h.send(CombatIntent::AttackIntentStart);
        assert_eq!(h.attack_index(), Some(1));
        h.send(CombatIntent::AttackAnimationFinished);

        h.tick(1.0);
        assert!(!h.machine.is_timer_active(CombatTimer::ComboReset));

        h.send(CombatIntent::AttackIntentStart);
        assert_eq!(h.attack_index(), Some(0));
    }

    #[test]
    fn test_attack_completed_reports_hit_and_buff() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Guardian));
        h.send(CombatIntent::AttackIntentStart);

        let target = Entity::from_raw(9);
        let damage = h.machine.register_hit(target).expect("first hit");
        h.machine.confirm_hit(target, damage);
        h.signals();

        h.send(CombatIntent::AttackAnimationFinished);
        assert!(h.signals().contains(&CombatSignal::AttackCompleted {
            hit_landed: true,
            has_buff: true,
        }));
        assert!(h.machine.is_timer_active(CombatTimer::ComboReset));
        assert!(!h.machine.hit_window_open());
    }

    #[test]
    fn test_attack_while_busy_is_noop() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentStart);
        h.signals();

        assert!(!h.send(CombatIntent::AttackIntentStart));
        assert!(!h.send(CombatIntent::AttackIntentHold));
        assert!(h.signals().is_empty());

        h.send(CombatIntent::AttackAnimationFinished);
        h.send(CombatIntent::RollIntent);
        assert!(!h.send(CombatIntent::AttackIntentStart));
        assert_eq!(h.machine.state(), ActionState::Rolling);
    }

    #[test]
    fn test_charge_multiplier_bounds() {
        // Полный charge
        let mut h = Harness::player();
        assert!(h.send(CombatIntent::AttackIntentHold));
        assert_eq!(h.machine.state(), ActionState::Charging);
        for _ in 0..4 {
            h.tick(0.25);
        }
        h.signals();
        assert!(h.send(CombatIntent::AttackIntentRelease));
        let started = h.signals().into_iter().find_map(|s| match s {
            CombatSignal::AttackStarted { damage_multiplier, .. } => Some(damage_multiplier),
            _ => None,
        });
        assert_eq!(started, Some(2.0));

        // Нулевой charge
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentHold);
        h.send(CombatIntent::AttackIntentRelease);
        let started = h.signals().into_iter().find_map(|s| match s {
            CombatSignal::AttackStarted { damage_multiplier, .. } => Some(damage_multiplier),
            _ => None,
        });
        assert_eq!(started, Some(1.0));
    }

    #[test]
    fn test_overcharge_is_clamped() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentHold);
        h.tick(3.0);
        assert_eq!(h.machine.charge_multiplier(), 2.0);
    }

    #[test]
    fn test_charge_freezes_movement_and_scales_damage() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentHold);
        let signals = h.signals();
        assert_eq!(signals, vec![CombatSignal::MovementFrozen, CombatSignal::ChargeStarted]);

        h.tick(0.5);
        h.send(CombatIntent::AttackIntentRelease);
        // 1.5x от базового урона первого удара
        assert_eq!(h.machine.register_hit(Entity::from_raw(3)), Some(15.0));
    }

    #[test]
    fn test_charge_preserves_open_combo_window() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentStart);
        h.send(CombatIntent::AttackAnimationFinished);

        h.send(CombatIntent::AttackIntentHold);
        assert!(h.machine.is_timer_active(CombatTimer::ComboReset));
        // Дольше окна комбо - но таймер на паузе
        h.tick(1.0);
        h.signals();

        h.send(CombatIntent::AttackIntentRelease);
        assert_eq!(h.attack_index(), Some(1));
    }

    #[test]
    fn test_charge_without_window_starts_fresh_combo() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentHold);
        h.send(CombatIntent::AttackIntentRelease);
        assert_eq!(h.attack_index(), Some(0));
    }

    // ========================================================================
    // Hit registry
    // ========================================================================

    #[test]
    fn test_single_damage_per_target_per_swing() {
        let mut h = Harness::player();
        let target = Entity::from_raw(7);

        h.send(CombatIntent::AttackIntentStart);
        assert_eq!(h.machine.register_hit(target), Some(10.0));
        assert_eq!(h.machine.register_hit(target), None);
        assert_eq!(h.machine.register_hit(Entity::from_raw(8)), Some(10.0));

        h.send(CombatIntent::AttackAnimationFinished);
        assert_eq!(h.machine.register_hit(target), None);

        // Новый swing - цель снова доступна, урон по второму удару комбо
        h.send(CombatIntent::AttackIntentStart);
        assert_eq!(h.machine.register_hit(target), Some(12.0));
    }

    // ========================================================================
    // Lunge
    // ========================================================================

    #[test]
    fn test_lunge_dashes_to_stop_point() {
        let mut h = Harness::player();
        h.targets.push(TargetSnapshot {
            entity: Entity::from_raw(20),
            position: Vec3::new(2.5, 0.0, 0.0),
        });

        h.send(CombatIntent::AttackIntentStart);
        assert!(h.machine.is_lunging());
        assert!(!h.machine.locomotion_enabled());
        assert!(h.signals().contains(&CombatSignal::LocomotionSuspended));

        h.tick(0.25);
        let steps: Vec<Vec3> = h
            .signals()
            .into_iter()
            .filter_map(|s| match s {
                CombatSignal::LungeStep(position) => Some(position),
                _ => None,
            })
            .collect();
        assert_eq!(steps.len(), 1);
        assert!(steps[0].abs_diff_eq(Vec3::new(1.6, 0.0, 0.0), 1e-5));

        // Locomotion возвращается только с концом анимации атаки
        assert!(h.machine.is_lunging());
        h.send(CombatIntent::AttackAnimationFinished);
        assert!(h.signals().contains(&CombatSignal::LocomotionRestored));
        assert!(h.machine.locomotion_enabled());
    }

    #[test]
    fn test_lunge_cancelled_by_interrupt() {
        let mut h = Harness::player();
        h.targets.push(TargetSnapshot {
            entity: Entity::from_raw(20),
            position: Vec3::new(2.5, 0.0, 0.0),
        });
        h.send(CombatIntent::AttackIntentStart);
        h.signals();

        h.hit(10.0);
        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::LocomotionRestored));
        assert!(signals.contains(&CombatSignal::HitWindowClosed));
        assert!(signals.contains(&CombatSignal::AttackInterrupted));
        assert!(!h.machine.is_lunging());
    }

    #[test]
    fn test_attack_without_target_only_rotates() {
        let mut h = Harness::player();
        h.send(CombatIntent::MovementIntent(Vec2::new(0.0, 1.0)));
        h.send(CombatIntent::AttackIntentStart);

        let signals = h.signals();
        assert!(!signals.contains(&CombatSignal::LocomotionSuspended));
        assert!(signals.iter().any(|s| matches!(s,
            CombatSignal::Facing(dir) if dir.abs_diff_eq(Vec3::NEG_Z, 1e-5))));
    }

    // ========================================================================
    // Roll
    // ========================================================================

    #[test]
    fn test_roll_interrupts_attack() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentStart);
        h.signals();

        assert!(h.send(CombatIntent::RollIntent));
        assert_eq!(h.machine.state(), ActionState::Rolling);
        assert!(!h.machine.hit_window_open());
        assert!(!h.machine.is_timer_active(CombatTimer::ComboReset));

        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::AttackInterrupted));
        assert!(signals.contains(&CombatSignal::HitWindowClosed));
        assert!(signals.contains(&CombatSignal::BrakingSuspended));

        assert!(h.send(CombatIntent::RollAnimationFinished));
        assert_eq!(h.machine.state(), ActionState::None);
        assert!(h.signals().contains(&CombatSignal::BrakingRestored));
    }

    #[test]
    fn test_roll_cooldown() {
        let mut h = Harness::player();
        assert!(h.send(CombatIntent::RollIntent));
        h.send(CombatIntent::RollAnimationFinished);

        assert!(!h.send(CombatIntent::RollIntent));
        h.tick(1.0);
        assert!(h.send(CombatIntent::RollIntent));
    }

    #[test]
    fn test_roll_direction_from_facing_side() {
        let mut h = Harness::player();
        h.send(CombatIntent::MovementIntent(Vec2::new(-1.0, 0.0)));
        h.send(CombatIntent::MovementIntent(Vec2::ZERO));
        assert_eq!(h.machine.combatant().facing_side, FacingSide::Left);

        h.send(CombatIntent::RollIntent);
        let direction = h.signals().into_iter().find_map(|s| match s {
            CombatSignal::RollStarted { direction } => Some(direction),
            _ => None,
        });
        assert!(direction.is_some_and(|d| d.abs_diff_eq(Vec3::NEG_X, 1e-5)));
    }

    #[test]
    fn test_roll_direction_from_input() {
        let mut h = Harness::player();
        h.send(CombatIntent::MovementIntent(Vec2::new(0.0, 1.0)));
        h.send(CombatIntent::RollIntent);

        let expected = Vec3::NEG_Z * h.machine.config().roll_speed;
        assert!(h.signals().iter().any(|s| matches!(s,
            CombatSignal::Impulse(v) if v.abs_diff_eq(expected, 1e-4))));
    }

    #[test]
    fn test_rolling_ignores_damage_and_hurt_blocks_roll() {
        let mut h = Harness::player();
        h.send(CombatIntent::RollIntent);
        assert_eq!(h.hit(50.0), 0.0);
        h.send(CombatIntent::RollAnimationFinished);
        h.tick(1.0);

        h.hit(10.0);
        assert_eq!(h.machine.state(), ActionState::Hurt);
        assert!(!h.send(CombatIntent::RollIntent));
    }

    // ========================================================================
    // Jump
    // ========================================================================

    #[test]
    fn test_jump_tap_is_short_hop() {
        let mut h = Harness::player();
        assert!(h.send(CombatIntent::JumpIntentStart));
        assert!(h.send(CombatIntent::JumpIntentRelease));
        assert!(h.signals().is_empty());

        h.tick(0.125);
        assert_eq!(h.signals(), vec![CombatSignal::Jump]);
        assert!(h.machine.is_airborne());

        h.tick(0.125);
        assert_eq!(h.signals(), vec![CombatSignal::StopJump]);
    }

    #[test]
    fn test_jump_hold_then_release() {
        let mut h = Harness::player();
        h.send(CombatIntent::JumpIntentStart);
        h.tick(0.125);
        h.tick(0.125);
        assert_eq!(h.signals(), vec![CombatSignal::Jump]);

        h.send(CombatIntent::JumpIntentRelease);
        assert_eq!(h.signals(), vec![CombatSignal::StopJump]);

        assert!(h.send(CombatIntent::Landed));
        assert!(!h.machine.is_airborne());
    }

    #[test]
    fn test_jump_resets_combo() {
        let mut h = Harness::player();
        h.send(CombatIntent::AttackIntentStart);
        h.send(CombatIntent::AttackAnimationFinished);
        h.send(CombatIntent::AttackIntentStart);
        h.send(CombatIntent::AttackAnimationFinished);
        assert_eq!(h.machine.combo_index(), 1);

        h.send(CombatIntent::JumpIntentStart);
        assert_eq!(h.machine.combo_index(), 0);
        assert!(!h.machine.is_timer_active(CombatTimer::ComboReset));
    }

    // ========================================================================
    // Mask
    // ========================================================================

    #[test]
    fn test_mask_drain_accelerates() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Vampire));
        for _ in 0..10 {
            h.tick(1.0);
        }

        let mask = h.machine.mask().active().expect("mask active");
        assert!(approx(mask.drain_multiplier, 1.5));
        assert!(approx(mask.remaining_duration, 17.75));
    }

    #[test]
    fn test_mask_drain_on_fixed_step() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Vampire));
        for _ in 0..600 {
            h.tick(1.0 / 60.0);
        }

        let mask = h.machine.mask().active().expect("mask active");
        assert!(approx(mask.drain_multiplier, 1.5));
        assert!(approx(mask.remaining_duration, 17.75));
    }

    #[test]
    fn test_mask_expires_and_reverts() {
        let config = CombatConfig {
            max_mask_duration: 2.0,
            ..Default::default()
        };
        let mut h = Harness::with_config(config, Allegiance::Player);
        h.send(CombatIntent::EquipMask(MaskType::Swift));
        assert!(approx(h.machine.modifiers().move_speed_multiplier, 1.3));
        h.signals();

        h.tick(1.0);
        h.tick(1.0);
        assert!(!h.machine.mask().is_active());
        assert!(!h.machine.is_timer_active(CombatTimer::MaskDrain));
        assert!(approx(h.machine.modifiers().move_speed_multiplier, 1.0));

        let signals = h.signals();
        assert!(signals.contains(&CombatSignal::MaskChanged(None)));
        assert!(signals.iter().any(|s| matches!(s, CombatSignal::MoveSpeedChanged(v) if approx(*v, 1.0))));
    }

    #[test]
    fn test_guardian_reduces_damage_and_prevents_knockdown() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Guardian));

        let applied = h.hit(40.0);
        assert!(approx(applied, 24.0));

        for _ in 0..3 {
            h.tick(0.5);
            h.hit(10.0);
            assert_eq!(h.machine.state(), ActionState::Hurt);
        }
    }

    #[test]
    fn test_vampire_lifesteal_and_extension() {
        let mut h = Harness::player();
        h.hit(40.0);
        h.tick(0.5);

        h.send(CombatIntent::EquipMask(MaskType::Vampire));
        h.tick(1.0);
        h.tick(1.0);
        let before = h.machine.mask().active().map(|m| m.remaining_duration).unwrap_or(0.0);

        h.send(CombatIntent::AttackIntentStart);
        let target = Entity::from_raw(9);
        let damage = h.machine.register_hit(target).expect("hit");
        h.machine.confirm_hit(target, damage);

        assert!(approx(h.machine.health(), 62.5));
        let after = h.machine.mask().active().map(|m| m.remaining_duration).unwrap_or(0.0);
        assert!(approx(after, before + 1.5));
        assert!(h.signals().iter().any(|s| matches!(s, CombatSignal::Healed { .. })));
    }

    #[test]
    fn test_swift_shortens_roll_cooldown() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Swift));
        assert!(h
            .signals()
            .iter()
            .any(|s| matches!(s, CombatSignal::MoveSpeedChanged(v) if approx(*v, 1.3))));

        h.send(CombatIntent::RollIntent);
        let remaining = h.machine.timer_remaining(CombatTimer::RollCooldown);
        assert!(remaining.is_some_and(|r| approx(r, 0.4)));
    }

    #[test]
    fn test_switching_masks_reverts_previous() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Guardian));
        h.send(CombatIntent::EquipMask(MaskType::Vampire));

        let modifiers = h.machine.modifiers();
        assert!(!modifiers.knockdown_immune);
        assert!(approx(modifiers.damage_reduction, 0.0));
        assert!(approx(modifiers.lifesteal_fraction, 0.25));
    }

    #[test]
    fn test_mask_throw_emits_projectile_before_clearing() {
        let mut h = Harness::player();
        h.send(CombatIntent::EquipMask(MaskType::Vampire));
        h.signals();

        assert!(h.send(CombatIntent::MaskThrowIntentStart));
        assert_eq!(h.machine.state(), ActionState::ChargeMask);
        assert!(h.send(CombatIntent::MaskThrowIntentRelease));

        let signals = h.signals();
        let thrown = signals
            .iter()
            .position(|s| matches!(s, CombatSignal::MaskThrown { mask_type: MaskType::Vampire, .. }))
            .expect("mask thrown");
        let cleared = signals
            .iter()
            .position(|s| *s == CombatSignal::MaskChanged(None))
            .expect("mask cleared");
        assert!(thrown < cleared);

        assert_eq!(h.machine.state(), ActionState::None);
        assert!(!h.machine.mask().is_active());
        assert!(approx(h.machine.modifiers().lifesteal_fraction, 0.0));
    }

    #[test]
    fn test_mask_throw_requires_mask() {
        let mut h = Harness::player();
        assert!(!h.send(CombatIntent::MaskThrowIntentStart));
        assert!(!h.send(CombatIntent::MaskThrowIntentRelease));
        assert_eq!(h.machine.state(), ActionState::None);
    }

    // ========================================================================
    // Hostile tokens
    // ========================================================================

    #[test]
    fn test_hostiles_share_attack_capacity() {
        let config = CombatConfig {
            max_tokens: 1,
            ..Default::default()
        };
        let mut tokens = AttackTokenScheduler::new(config.max_tokens);
        let mut a = ActionStateMachine::hostile(config.clone());
        let mut b = ActionStateMachine::hostile(config);
        let (ea, eb) = (Entity::from_raw(10), Entity::from_raw(11));

        let mut ctx = CombatContext::new(ea, Vec3::ZERO, &mut tokens);
        assert!(a.handle(CombatIntent::AttackIntentStart, &mut ctx));

        let mut ctx = CombatContext::new(eb, Vec3::ZERO, &mut tokens);
        assert!(!b.handle(CombatIntent::AttackIntentStart, &mut ctx));
        assert_eq!(b.state(), ActionState::None);

        let mut ctx = CombatContext::new(ea, Vec3::ZERO, &mut tokens);
        a.handle(CombatIntent::AttackAnimationFinished, &mut ctx);
        assert_eq!(tokens.holder_count(), 0);

        let mut ctx = CombatContext::new(eb, Vec3::ZERO, &mut tokens);
        assert!(b.handle(CombatIntent::AttackIntentStart, &mut ctx));
        assert!(tokens.has_token(eb));
    }

    #[test]
    fn test_hostile_releases_token_on_every_exit() {
        // finish
        let mut h = Harness::hostile();
        h.send(CombatIntent::AttackIntentStart);
        assert!(h.tokens.has_token(h.entity));
        h.send(CombatIntent::AttackAnimationFinished);
        assert_eq!(h.tokens.holder_count(), 0);

        // interrupt (hurt)
        let mut h = Harness::hostile();
        h.send(CombatIntent::AttackIntentStart);
        h.hit(10.0);
        assert_eq!(h.tokens.holder_count(), 0);

        // death
        let mut h = Harness::hostile();
        h.send(CombatIntent::AttackIntentStart);
        h.hit(500.0);
        assert_eq!(h.machine.state(), ActionState::Dead);
        assert_eq!(h.tokens.holder_count(), 0);

        // forced reset
        let mut h = Harness::hostile();
        h.send(CombatIntent::AttackIntentStart);
        h.force_reset();
        assert_eq!(h.tokens.holder_count(), 0);
        assert_eq!(h.machine.state(), ActionState::None);
        assert_eq!(h.machine.health(), h.machine.config().max_health);
    }

    #[test]
    fn test_hostile_charge_without_token_keeps_window() {
        let config = CombatConfig {
            max_tokens: 0,
            ..Default::default()
        };
        let mut h = Harness::with_config(config, Allegiance::Hostile);

        h.send(CombatIntent::AttackIntentHold);
        h.send(CombatIntent::AttackIntentRelease);
        assert_eq!(h.machine.state(), ActionState::None);
        assert_eq!(h.tokens.holder_count(), 0);
    }

    // ========================================================================
    // Facing
    // ========================================================================

    #[test]
    fn test_facing_side_follows_lateral_input() {
        let mut h = Harness::player();
        assert_eq!(h.machine.combatant().facing_side, FacingSide::Right);

        h.send(CombatIntent::MovementIntent(Vec2::new(-0.8, 0.2)));
        assert_eq!(h.machine.combatant().facing_side, FacingSide::Left);

        // Почти прямо вперёд - сторона не меняется
        h.send(CombatIntent::MovementIntent(Vec2::new(0.01, 1.0)));
        assert_eq!(h.machine.combatant().facing_side, FacingSide::Left);

        h.send(CombatIntent::MovementIntent(Vec2::new(1.0, 0.0)));
        assert_eq!(h.machine.combatant().facing_side, FacingSide::Right);
    }
}
