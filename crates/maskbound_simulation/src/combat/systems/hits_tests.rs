//! Tests for melee hit resolution systems.

#[cfg(test)]
mod tests {
    use crate::combat::components::{Allegiance, HitVolume, HitVolumeOverlaps};
    use crate::combat::signals::CombatIntent;
    use crate::combat::state_machine::{ActionStateMachine, CombatContext};
    use crate::combat::tokens::AttackTokenScheduler;
    use crate::config::CombatConfig;
    use bevy::prelude::*;
    use super::super::hits::{fill_proximity_overlaps, resolve_melee_hits};
    use super::super::intents::{lunge_candidates, snapshot_combatants};

    fn create_hit_app() -> App {
        let mut app = App::new();
        app.init_resource::<HitVolumeOverlaps>()
            .insert_resource(AttackTokenScheduler::new(2))
            .add_systems(Update, (fill_proximity_overlaps, resolve_melee_hits).chain());
        app
    }

    fn spawn_fighter(app: &mut App, allegiance: Allegiance, position: Vec3, with_volume: bool) -> Entity {
        let machine = ActionStateMachine::new(CombatConfig::default(), allegiance);
        let mut entity = app
            .world_mut()
            .spawn((machine, Transform::from_translation(position)));
        if with_volume {
            entity.insert(HitVolume::default());
        }
        entity.id()
    }

    /// Атака без lunge целей: машина смотрит в -Z по умолчанию
    fn start_attack(app: &mut App, entity: Entity) {
        let mut tokens = AttackTokenScheduler::new(2);
        let world = app.world_mut();
        let position = world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or_default();
        let mut machine = world
            .get_mut::<ActionStateMachine>(entity)
            .expect("fighter has machine");
        let mut ctx = CombatContext::new(entity, position, &mut tokens);
        assert!(machine.handle(CombatIntent::AttackIntentStart, &mut ctx));
    }

    fn health(app: &App, entity: Entity) -> f32 {
        app.world()
            .get::<ActionStateMachine>(entity)
            .map(|machine| machine.health())
            .unwrap_or(-1.0)
    }

    #[test]
    fn test_open_window_damages_target_once() {
        let mut app = create_hit_app();
        let player = spawn_fighter(&mut app, Allegiance::Player, Vec3::ZERO, true);
        let hostile = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::new(0.0, 0.0, -1.0), true);

        start_attack(&mut app, player);
        app.update();
        assert_eq!(health(&app, hostile), 90.0);

        // Окно всё ещё открыто - повторный overlap игнорируется
        app.update();
        app.update();
        assert_eq!(health(&app, hostile), 90.0);
    }

    #[test]
    fn test_missing_hit_volume_skips_attacker() {
        let mut app = create_hit_app();
        let player = spawn_fighter(&mut app, Allegiance::Player, Vec3::ZERO, false);
        let hostile = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::new(0.0, 0.0, -1.0), true);

        start_attack(&mut app, player);

        // Даже внешний отчёт не проходит без сокета
        app.world_mut()
            .resource_mut::<HitVolumeOverlaps>()
            .report(player, hostile);
        app.update();

        assert_eq!(health(&app, hostile), 100.0);
        assert!(app.world().resource::<HitVolumeOverlaps>().is_empty());
    }

    #[test]
    fn test_allies_are_not_hit() {
        let mut app = create_hit_app();
        let hostile_a = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::ZERO, true);
        let hostile_b = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::new(0.0, 0.0, -1.0), true);

        start_attack(&mut app, hostile_a);
        app.world_mut()
            .resource_mut::<HitVolumeOverlaps>()
            .report(hostile_a, hostile_b);
        app.update();

        assert_eq!(health(&app, hostile_b), 100.0);
    }

    #[test]
    fn test_target_behind_attacker_is_missed() {
        let mut app = create_hit_app();
        let player = spawn_fighter(&mut app, Allegiance::Player, Vec3::ZERO, true);
        let hostile = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::new(0.0, 0.0, 1.2), true);

        start_attack(&mut app, player);
        app.update();

        assert_eq!(health(&app, hostile), 100.0);
    }

    #[test]
    fn test_external_overlaps_disable_proximity() {
        let mut app = create_hit_app();
        app.insert_resource(HitVolumeOverlaps::external());
        let player = spawn_fighter(&mut app, Allegiance::Player, Vec3::ZERO, true);
        let hostile = spawn_fighter(&mut app, Allegiance::Hostile, Vec3::new(0.0, 0.0, -1.0), true);

        start_attack(&mut app, player);
        app.update();
        assert_eq!(health(&app, hostile), 100.0);

        app.world_mut()
            .resource_mut::<HitVolumeOverlaps>()
            .report(player, hostile);
        app.update();
        assert_eq!(health(&app, hostile), 90.0);
    }

    #[test]
    fn test_lunge_candidates_filter_allies_and_dead() {
        let mut world = World::new();
        let player = world
            .spawn((ActionStateMachine::player(CombatConfig::default()), Transform::default()))
            .id();
        let hostile = world
            .spawn((
                ActionStateMachine::hostile(CombatConfig::default()),
                Transform::from_xyz(1.0, 0.0, 0.0),
            ))
            .id();

        let mut query = world.query::<(Entity, &ActionStateMachine, &Transform)>();
        let snapshots = snapshot_combatants(query.iter(&world));

        let for_player = lunge_candidates(&snapshots, Allegiance::Player);
        assert_eq!(for_player.len(), 1);
        assert_eq!(for_player[0].entity, hostile);

        let for_hostile = lunge_candidates(&snapshots, Allegiance::Hostile);
        assert_eq!(for_hostile.len(), 1);
        assert_eq!(for_hostile[0].entity, player);
    }
}
