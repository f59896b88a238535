//! Intent delivery and per-tick advancement of every ActionStateMachine.

use bevy::prelude::*;

use crate::combat::components::{Allegiance, TargetSnapshot};
use crate::combat::signals::CombatIntentEvent;
use crate::combat::state_machine::{ActionStateMachine, CombatContext};
use crate::combat::tokens::AttackTokenScheduler;

/// Yaw камеры (радианы вокруг Y). Пишет камера/клиент, читает combat.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewYaw(pub f32);

/// Снимок бойца для lunge/hit запросов внутри одного тика
#[derive(Debug, Clone, Copy)]
pub struct CombatantSnapshot {
    pub entity: Entity,
    pub allegiance: Allegiance,
    pub position: Vec3,
    pub alive: bool,
}

pub fn snapshot_combatants<'a>(
    combatants: impl Iterator<Item = (Entity, &'a ActionStateMachine, &'a Transform)>,
) -> Vec<CombatantSnapshot> {
    let mut snapshots: Vec<CombatantSnapshot> = combatants
        .map(|(entity, machine, transform)| CombatantSnapshot {
            entity,
            allegiance: machine.allegiance(),
            position: transform.translation,
            alive: machine.is_alive(),
        })
        .collect();
    // Порядок query не гарантирован - сортируем для детерминизма
    snapshots.sort_by_key(|snapshot| snapshot.entity.index());
    snapshots
}

/// Живые враги для стороны `allegiance`
pub fn lunge_candidates(
    snapshots: &[CombatantSnapshot],
    allegiance: Allegiance,
) -> Vec<TargetSnapshot> {
    snapshots
        .iter()
        .filter(|snapshot| snapshot.alive && allegiance.is_hostile_to(snapshot.allegiance))
        .map(|snapshot| TargetSnapshot {
            entity: snapshot.entity,
            position: snapshot.position,
        })
        .collect()
}

/// Система: доставка CombatIntentEvent в машины
///
/// Intent для entity без ActionStateMachine - пропускается (warning).
pub fn process_combat_intents(
    mut intents: EventReader<CombatIntentEvent>,
    mut combatants: Query<(Entity, &mut ActionStateMachine, &Transform)>,
    mut tokens: ResMut<AttackTokenScheduler>,
    view_yaw: Res<ViewYaw>,
) {
    let events: Vec<CombatIntentEvent> = intents.read().copied().collect();
    if events.is_empty() {
        return;
    }

    let snapshots = snapshot_combatants(combatants.iter());

    for event in events {
        let Ok((entity, mut machine, transform)) = combatants.get_mut(event.entity) else {
            crate::logger::log_warning(&format!(
                "CombatIntent {:?} for {:?} without ActionStateMachine - skipped",
                event.intent, event.entity
            ));
            continue;
        };

        let targets = lunge_candidates(&snapshots, machine.allegiance());
        let mut ctx = CombatContext::new(entity, transform.translation, &mut tokens)
            .with_view_yaw(view_yaw.0)
            .with_targets(&targets);
        machine.handle(event.intent, &mut ctx);
    }
}

/// Система: тик таймеров/charge/lunge всех бойцов
pub fn tick_combatants(
    time: Res<Time>,
    mut combatants: Query<(Entity, &mut ActionStateMachine, &Transform)>,
    mut tokens: ResMut<AttackTokenScheduler>,
    view_yaw: Res<ViewYaw>,
) {
    let dt = time.delta_secs();
    let snapshots = snapshot_combatants(combatants.iter());

    for (entity, mut machine, transform) in combatants.iter_mut() {
        let targets = lunge_candidates(&snapshots, machine.allegiance());
        let mut ctx = CombatContext::new(entity, transform.translation, &mut tokens)
            .with_view_yaw(view_yaw.0)
            .with_targets(&targets);
        machine.tick(dt, &mut ctx);
    }
}
