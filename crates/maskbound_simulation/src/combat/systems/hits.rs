//! Melee hit resolution: overlap отчёты → HitRegistry → damage resolution.

use bevy::prelude::*;

use crate::combat::components::{HitVolume, HitVolumeOverlaps};
use crate::combat::signals::DamageSource;
use crate::combat::state_machine::{ActionStateMachine, CombatContext};
use crate::combat::tokens::AttackTokenScheduler;

use super::intents::snapshot_combatants;

/// Система: proximity fallback для overlaps
///
/// Без внешнего источника overlaps (движок/физика) считаем дугу HitVolume
/// от Transform атакующего. Только для открытых hit window.
pub fn fill_proximity_overlaps(
    mut overlaps: ResMut<HitVolumeOverlaps>,
    combatants: Query<(Entity, &ActionStateMachine, &Transform)>,
    volumes: Query<&HitVolume>,
) {
    if !overlaps.proximity_fallback {
        return;
    }

    let snapshots = snapshot_combatants(combatants.iter());

    for (attacker, machine, transform) in combatants.iter() {
        if !machine.hit_window_open() {
            continue;
        }
        let Ok(volume) = volumes.get(attacker) else {
            continue;
        };
        let facing = machine.combatant().facing_direction;

        for target in snapshots.iter().filter(|snapshot| {
            snapshot.entity != attacker
                && snapshot.alive
                && machine.allegiance().is_hostile_to(snapshot.allegiance)
        }) {
            if volume.contains(transform.translation, facing, target.position) {
                overlaps.report(attacker, target.entity);
            }
        }
    }
}

/// Система: применение урона по overlaps текущего тика
///
/// Порядок на каждую пару: HitRegistry атакующего → damage resolution цели
/// → lifesteal/продление маски атакующего. Атакующий без HitVolume
/// (нет сокета) - пара отбрасывается.
pub fn resolve_melee_hits(
    mut overlaps: ResMut<HitVolumeOverlaps>,
    mut combatants: Query<(&mut ActionStateMachine, &Transform)>,
    volumes: Query<(), With<HitVolume>>,
    mut tokens: ResMut<AttackTokenScheduler>,
) {
    for (attacker, target) in overlaps.drain() {
        if attacker == target || !volumes.contains(attacker) {
            continue;
        }

        let Ok((attacker_machine, attacker_transform)) = combatants.get(attacker) else {
            continue;
        };
        let attacker_allegiance = attacker_machine.allegiance();
        let attacker_position = attacker_transform.translation;

        let Ok((target_machine, _)) = combatants.get(target) else {
            continue;
        };
        if !attacker_allegiance.is_hostile_to(target_machine.allegiance()) {
            continue;
        }

        let damage = match combatants.get_mut(attacker) {
            Ok((mut machine, _)) => machine.register_hit(target),
            Err(_) => None,
        };
        let Some(damage) = damage else {
            continue;
        };

        let dealt = match combatants.get_mut(target) {
            Ok((mut machine, transform)) => {
                let source = DamageSource::from_entity(attacker, attacker_position);
                let mut ctx = CombatContext::new(target, transform.translation, &mut tokens);
                machine.receive_damage(damage, source, &mut ctx)
            }
            Err(_) => 0.0,
        };

        if let Ok((mut machine, _)) = combatants.get_mut(attacker) {
            machine.confirm_hit(target, dealt);
        }

        if dealt > 0.0 {
            crate::logger::log(&format!(
                "💥 {:?} hit {:?} for {:.1}",
                attacker, target, dealt
            ));
        }
    }
}
