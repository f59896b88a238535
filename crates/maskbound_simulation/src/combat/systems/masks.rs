//! Mask pickups и брошенные маски в мире.

use bevy::prelude::*;

use crate::combat::components::{flatten, Allegiance, MaskPickup, ThrownMask};
use crate::combat::signals::{CombatIntent, CombatIntentEvent, DamageSource};
use crate::combat::state_machine::ActionStateMachine;

/// Система: игрок в радиусе pickup надевает маску
///
/// Один pickup - один игрок (первый по Entity index).
pub fn collect_mask_pickups(
    mut commands: Commands,
    pickups: Query<(Entity, &MaskPickup, &Transform)>,
    mut combatants: Query<(Entity, &mut ActionStateMachine, &Transform)>,
) {
    let mut pickups: Vec<_> = pickups.iter().collect();
    if pickups.is_empty() {
        return;
    }
    pickups.sort_by_key(|(entity, _, _)| entity.index());

    let mut players: Vec<_> = combatants
        .iter()
        .filter(|(_, machine, _)| machine.allegiance() == Allegiance::Player && machine.is_alive())
        .map(|(entity, _, transform)| (entity, transform.translation))
        .collect();
    players.sort_by_key(|(entity, _)| entity.index());

    for (pickup_entity, pickup, pickup_transform) in pickups {
        let collector = players.iter().find(|(_, position)| {
            flatten(*position - pickup_transform.translation).length() <= pickup.radius
        });
        let Some((player, _)) = collector else {
            continue;
        };

        if let Ok((_, mut machine, _)) = combatants.get_mut(*player) {
            if machine.equip_mask(pickup.mask_type) {
                crate::logger::log(&format!(
                    "🎭 {:?} picked up {:?} mask",
                    player, pickup.mask_type
                ));
                commands.entity(pickup_entity).despawn();
            }
        }
    }
}

/// Система: полёт брошенной маски
///
/// Первый враг бросившего в радиусе получает `IncomingDamage`, маска исчезает.
/// Без попадания - исчезает по lifetime.
pub fn move_thrown_masks(
    mut commands: Commands,
    time: Res<Time>,
    mut masks: Query<(Entity, &mut ThrownMask, &mut Transform), Without<ActionStateMachine>>,
    combatants: Query<(Entity, &ActionStateMachine, &Transform)>,
    mut intents: EventWriter<CombatIntentEvent>,
) {
    let dt = time.delta_secs();

    for (mask_entity, mut mask, mut transform) in masks.iter_mut() {
        transform.translation += mask.velocity * dt;
        mask.lifetime -= dt;

        let owner_allegiance = combatants
            .get(mask.owner)
            .map(|(_, machine, _)| machine.allegiance())
            .unwrap_or(Allegiance::Player);

        let mut victims: Vec<_> = combatants
            .iter()
            .filter(|(entity, machine, target_transform)| {
                *entity != mask.owner
                    && machine.is_alive()
                    && owner_allegiance.is_hostile_to(machine.allegiance())
                    && flatten(target_transform.translation - transform.translation).length()
                        <= mask.radius
            })
            .map(|(entity, _, _)| entity)
            .collect();
        victims.sort_by_key(|entity| entity.index());

        if let Some(victim) = victims.first() {
            intents.write(CombatIntentEvent::new(
                *victim,
                CombatIntent::IncomingDamage {
                    amount: mask.damage,
                    source: DamageSource::from_entity(mask.owner, transform.translation),
                },
            ));
            crate::logger::log(&format!(
                "🪃 Thrown {:?} mask hit {:?}",
                mask.mask_type, victim
            ));
            commands.entity(mask_entity).despawn();
        } else if mask.lifetime <= 0.0 {
            commands.entity(mask_entity).despawn();
        }
    }
}
